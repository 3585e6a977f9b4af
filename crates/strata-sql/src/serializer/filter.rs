use super::{Comma, Formatter, Params, ToSql};

use crate::{query::is_qualified, Operator, WhereClause};
use strata_core::stmt::Value;

/// How unqualified columns in a filter are rewritten.
#[derive(Debug, Clone, Copy)]
pub(super) enum Qualify<'a> {
    /// Leave columns as written
    None,

    /// Prefix unqualified columns with an alias
    Alias(&'a str),

    /// Prefix unqualified columns with `to`, and move columns qualified with
    /// `from` over to `to`
    Realias { from: &'a str, to: &'a str },
}

impl Qualify<'_> {
    fn column(self, column: &str) -> String {
        match self {
            Qualify::None => column.to_string(),
            Qualify::Alias(alias) if !is_qualified(column) => format!("{alias}.{column}"),
            Qualify::Alias(_) => column.to_string(),
            Qualify::Realias { from, to } => {
                if !is_qualified(column) {
                    format!("{to}.{column}")
                } else if let Some(rest) = column
                    .strip_prefix(from)
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    format!("{to}.{rest}")
                } else {
                    column.to_string()
                }
            }
        }
    }
}

/// ` WHERE ...` for a list of clauses, or nothing when the list is empty.
pub(super) struct Filters<'a> {
    pub(super) clauses: &'a [WhereClause],
    pub(super) qualify: Qualify<'a>,
}

impl ToSql for Filters<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i == 0 {
                fmt!(f, " WHERE ");
            } else {
                fmt!(f, " " clause.conjunction.as_sql() " ");
            }

            let column = self.qualify.column(&clause.column);
            Predicate {
                column: &column,
                clause,
            }
            .to_sql(f);
        }
    }
}

struct Predicate<'a> {
    column: &'a str,
    clause: &'a WhereClause,
}

impl ToSql for Predicate<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let operator = self.clause.operator;
        let column = self.column;

        match operator {
            Operator::IsNull | Operator::IsNotNull => {
                fmt!(f, column " " operator.as_sql());
            }
            Operator::In | Operator::NotIn => {
                let values = match &self.clause.value {
                    Value::List(values) => &values[..],
                    value => std::slice::from_ref(value),
                };

                match (operator, values.is_empty()) {
                    (Operator::In, true) => fmt!(f, "1 = 0"),
                    (_, true) => fmt!(f, "1 = 1"),
                    _ => fmt!(f, column " " operator.as_sql() " (" Comma(values) ")"),
                }
            }
            Operator::Between => match &self.clause.value {
                Value::List(bounds) if bounds.len() == 2 => {
                    let (low, high) = (&bounds[0], &bounds[1]);
                    fmt!(f, column " BETWEEN " low " AND " high);
                }
                // Rejected by the builder before serialization
                _ => fmt!(f, "1 = 0"),
            },
            _ => {
                let value = &self.clause.value;
                fmt!(f, column " " operator.as_sql() " " value);
            }
        }
    }
}
