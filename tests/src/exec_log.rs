use crate::logging_executor::{ExecutedStatement, StatementKind};
use std::sync::{Arc, Mutex};

/// A wrapper around the statement log that provides a clean API for tests
#[derive(Clone)]
pub struct ExecLog {
    statements: Arc<Mutex<Vec<ExecutedStatement>>>,
}

impl ExecLog {
    pub(crate) fn new(statements: Arc<Mutex<Vec<ExecutedStatement>>>) -> Self {
        Self { statements }
    }

    /// Get the number of logged statements
    pub fn len(&self) -> usize {
        self.statements.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.lock().unwrap().is_empty()
    }

    /// Check if any statement matches the given predicate
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: Fn(&ExecutedStatement) -> bool,
    {
        self.statements.lock().unwrap().iter().any(predicate)
    }

    /// Count statements matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ExecutedStatement) -> bool,
    {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .filter(|stmt| predicate(stmt))
            .count()
    }

    /// Count statements of one kind
    pub fn count_kind(&self, kind: StatementKind) -> usize {
        self.count(|stmt| stmt.kind == kind)
    }

    /// The SQL of every logged statement, in execution order
    pub fn sql(&self) -> Vec<String> {
        self.with_statements(|stmts| stmts.iter().map(|stmt| stmt.sql.clone()).collect())
    }

    /// Clear the log
    pub fn clear(&self) {
        self.statements.lock().unwrap().clear();
    }

    /// Remove and return the first statement from the log
    pub fn pop(&self) -> Option<ExecutedStatement> {
        let mut statements = self.statements.lock().unwrap();
        if statements.is_empty() {
            None
        } else {
            Some(statements.remove(0))
        }
    }

    /// Escape hatch for complex assertions
    pub fn with_statements<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[ExecutedStatement]) -> R,
    {
        let statements = self.statements.lock().unwrap();
        f(&statements)
    }
}
