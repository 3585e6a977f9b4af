#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::Comma;

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod filter;
mod statement;

use crate::stmt::Statement;

/// Serializes statements to SQL text.
///
/// Values are never written into the SQL text. Each one is pushed to the
/// caller's [`Params`] as it is reached, and a placeholder naming it is
/// written instead, so the text and its parameters come out of one pass.
#[derive(Debug, Default)]
pub struct Serializer {
    _priv: (),
}

struct Formatter<'a, T> {
    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

impl Serializer {
    pub fn new() -> Serializer {
        Serializer { _priv: () }
    }

    pub fn serialize<'a>(&self, stmt: impl Into<Statement<'a>>, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            dst: &mut ret,
            params,
        };

        stmt.into().to_sql(&mut fmt);
        ret
    }
}
