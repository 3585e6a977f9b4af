use super::{Formatter, ToSql};

use strata_core::{driver, stmt::Value};

pub trait Params {
    fn push(&mut self, value: &Value) -> Placeholder;
}

/// A reference to a bound parameter, rendered as `#{params.<name>}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder(pub String);

impl Params for driver::Params {
    fn push(&mut self, value: &Value) -> Placeholder {
        let name = format!("p{}", self.len());
        self.insert(name.clone(), value.clone());
        Placeholder(name)
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        f.dst.push_str("#{params.");
        f.dst.push_str(&self.0);
        f.dst.push('}');
    }
}

impl ToSql for &Value {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = f.params.push(self);
        placeholder.to_sql(f);
    }
}
