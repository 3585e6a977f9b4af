use strata_core::stmt::Value;

use indexmap::IndexMap;

/// `INSERT` of one or more rows sharing a column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Insert {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Insert {
        Insert {
            table: table.into(),
            columns,
            rows: vec![],
        }
    }

    /// A single-row insert from a column-keyed map.
    pub fn from_values(table: impl Into<String>, values: IndexMap<String, Value>) -> Insert {
        let (columns, row) = values.into_iter().unzip();
        Insert {
            table: table.into(),
            columns,
            rows: vec![row],
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }
}
