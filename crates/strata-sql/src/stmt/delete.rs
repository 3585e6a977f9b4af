use crate::WhereClause;

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filters: Vec<WhereClause>,
}

impl Delete {
    pub fn new(table: impl Into<String>) -> Delete {
        Delete {
            table: table.into(),
            filters: vec![],
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Delete {
        self.filters.push(clause);
        self
    }
}
