use crate::{engine::materialize, Db, Entity, Result};

use strata_core::{
    driver::{Params, Row},
    stmt::Value,
};
use strata_sql::PreparedQuery;

impl Db {
    /// Builds an `entity` from a row produced outside the query builder.
    ///
    /// With an alias, columns are read as `{alias}_{column}` first. Returns
    /// `None` when the row carries no primary key. Relations load lazily.
    pub fn map_row(&self, entity: &str, row: &Row, alias: Option<&str>) -> Result<Option<Entity>> {
        let metadata = self.metadata(entity)?;
        let entities = materialize::map_rows(self, &metadata, std::slice::from_ref(row), alias)?;
        Ok(entities.into_iter().next())
    }

    /// Runs hand-written SQL and maps every row onto `entity`.
    ///
    /// Parameters are referenced as `:name`. Rows repeating a primary key
    /// yield one entity.
    pub fn query_sql<K, V>(
        &self,
        entity: &str,
        sql: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Vec<Entity>>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let metadata = self.metadata(entity)?;
        let query = PreparedQuery {
            sql: bind_named(sql),
            params: params
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect::<Params>(),
        };

        let rows = self.fetch(&query)?;
        materialize::map_rows(self, &metadata, &rows, None)
    }
}

/// Rewrites `:name` placeholders into `#{params.name}`. Quoted text and
/// `::` casts are copied unchanged.
fn bind_named(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    let mut quote = None;

    while let Some((i, c)) = chars.next() {
        if let Some(open) = quote {
            out.push(c);
            if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if matches!(chars.peek(), Some((_, ':'))) => {
                chars.next();
                out.push_str("::");
            }
            ':' if matches!(chars.peek(), Some((_, next)) if next.is_ascii_alphabetic() || *next == '_') =>
            {
                let start = i + 1;
                let mut end = start;
                while let Some((j, next)) = chars.peek().copied() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    end = j + next.len_utf8();
                    chars.next();
                }

                out.push_str("#{params.");
                out.push_str(&sql[start..end]);
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    out
}
