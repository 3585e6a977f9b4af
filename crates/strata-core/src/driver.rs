use crate::{stmt::Value, Result};

use indexmap::IndexMap;
use std::fmt::Debug;

/// A result row keyed by column label.
pub type Row = IndexMap<String, Value>;

/// Named statement parameters.
///
/// Statements reference each entry as `#{params.<name>}`.
pub type Params = IndexMap<String, Value>;

/// Reserved parameter an executor fills with the key generated by an insert.
pub const GENERATED_KEY: &str = "generated_key";

/// Executes prepared SQL against a database.
///
/// Implementations must bind every `#{params.<name>}` placeholder as a
/// statement parameter and never splice values into the SQL text.
pub trait Executor: Debug + Send + Sync + 'static {
    /// Runs a query and returns every row.
    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>>;

    /// Runs an insert, storing the generated key (if any) under
    /// [`GENERATED_KEY`]. Returns the number of affected rows.
    fn insert(&self, sql: &str, params: &mut Params) -> Result<u64>;

    /// Runs an update. Returns the number of affected rows.
    fn update(&self, sql: &str, params: &Params) -> Result<u64>;

    /// Runs a delete. Returns the number of affected rows.
    fn delete(&self, sql: &str, params: &Params) -> Result<u64>;
}
