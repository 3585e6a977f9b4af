use crate::{Db, Result};

use strata_core::{
    driver::{Row, GENERATED_KEY},
    err,
    stmt::Value,
};
use strata_sql::PreparedQuery;

impl Db {
    pub(crate) fn fetch(&self, query: &PreparedQuery) -> Result<Vec<Row>> {
        tracing::debug!(sql = %query.sql, param_count = query.params.len(), "executing query");

        self.executor()
            .query(&query.sql, &query.params)
            .map_err(|e| e.context(err!("query failed: {}", query.sql)))
    }

    /// Runs a query and returns the non-null values of `column`, or of the
    /// first column of rows that lack it.
    pub(crate) fn fetch_column(&self, query: &PreparedQuery, column: &str) -> Result<Vec<Value>> {
        let rows = self.fetch(query)?;

        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.shift_remove(column) {
                Some(value) => Some(value),
                None => row.into_values().next(),
            })
            .filter(|value| !value.is_null())
            .collect())
    }

    /// Runs an insert and returns the generated key, if the executor
    /// reported one.
    pub(crate) fn exec_insert(&self, query: PreparedQuery) -> Result<Option<Value>> {
        tracing::debug!(sql = %query.sql, param_count = query.params.len(), "executing insert");

        let PreparedQuery { sql, mut params } = query;
        self.executor()
            .insert(&sql, &mut params)
            .map_err(|e| e.context(err!("insert failed: {sql}")))?;

        Ok(params
            .shift_remove(GENERATED_KEY)
            .filter(|key| !key.is_null()))
    }

    pub(crate) fn exec_update(&self, query: &PreparedQuery) -> Result<u64> {
        tracing::debug!(sql = %query.sql, param_count = query.params.len(), "executing update");

        self.executor()
            .update(&query.sql, &query.params)
            .map_err(|e| e.context(err!("update failed: {}", query.sql)))
    }

    pub(crate) fn exec_delete(&self, query: &PreparedQuery) -> Result<u64> {
        tracing::debug!(sql = %query.sql, param_count = query.params.len(), "executing delete");

        self.executor()
            .delete(&query.sql, &query.params)
            .map_err(|e| e.context(err!("delete failed: {}", query.sql)))
    }
}
