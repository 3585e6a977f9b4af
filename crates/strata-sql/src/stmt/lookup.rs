use crate::WhereClause;

/// Plain `SELECT` of a few columns from one table.
///
/// Used to read link state (child keys, link table rows) that is not mapped
/// to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub table: String,
    pub columns: Vec<String>,
    pub filters: Vec<WhereClause>,
}

impl Lookup {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Lookup {
        Lookup {
            table: table.into(),
            columns,
            filters: vec![],
        }
    }

    pub fn filter(mut self, clause: WhereClause) -> Lookup {
        self.filters.push(clause);
        self
    }
}
