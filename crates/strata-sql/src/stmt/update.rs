use crate::WhereClause;

use indexmap::IndexMap;
use strata_core::stmt::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: IndexMap<String, Value>,
    pub filters: Vec<WhereClause>,
}

impl Update {
    pub fn new(table: impl Into<String>) -> Update {
        Update {
            table: table.into(),
            assignments: IndexMap::new(),
            filters: vec![],
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Update {
        self.assignments.insert(column.into(), value.into());
        self
    }

    pub fn filter(mut self, clause: WhereClause) -> Update {
        self.filters.push(clause);
        self
    }
}
