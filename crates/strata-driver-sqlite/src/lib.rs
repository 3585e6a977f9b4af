mod value;
pub(crate) use value::Value;

use parking_lot::Mutex;
use rusqlite::{Connection, ToSql};
use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};
use strata_core::{
    driver::{Executor, Params, Row, GENERATED_KEY},
    Error, Result,
};
use url::Url;

/// An [`Executor`] backed by a single SQLite connection.
pub struct Sqlite {
    location: Location,
    connection: Mutex<Connection>,
}

#[derive(Debug)]
enum Location {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Open a SQLite database from a connection URL, `sqlite::memory:` or
    /// `sqlite:<path>`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver)?;

        if url.scheme() != "sqlite" {
            return Err(Error::configuration(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Self::in_memory()
        } else {
            Self::open(url.path())
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(Error::driver)?;
        Ok(Self::with_connection(Location::InMemory, connection))
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let connection = Connection::open(&path).map_err(Error::driver)?;
        Ok(Self::with_connection(Location::File(path), connection))
    }

    fn with_connection(location: Location, connection: Connection) -> Self {
        Self {
            location,
            connection: Mutex::new(connection),
        }
    }

    pub fn url(&self) -> Cow<'_, str> {
        match &self.location {
            Location::InMemory => Cow::Borrowed("sqlite::memory:"),
            Location::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    /// Runs a batch of unparameterized statements, such as table definitions.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection
            .lock()
            .execute_batch(sql)
            .map_err(Error::driver)
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<u64> {
        let connection = self.connection.lock();
        let (sql, bound) = bind(sql, params)?;
        let named = named_params(&bound);

        let mut stmt = connection.prepare_cached(&sql).map_err(Error::driver)?;
        let count = stmt.execute(&named[..]).map_err(Error::driver)?;
        Ok(count as u64)
    }
}

impl fmt::Debug for Sqlite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sqlite").field("url", &self.url()).finish()
    }
}

impl Executor for Sqlite {
    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        let connection = self.connection.lock();
        let (sql, bound) = bind(sql, params)?;
        let named = named_params(&bound);

        let mut stmt = connection.prepare_cached(&sql).map_err(Error::driver)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(&named[..]).map_err(Error::driver)?;

        let mut ret = vec![];
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut record = Row::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(Error::driver)?;
                record.insert(column.clone(), Value::from_sql(value).into_inner());
            }
            ret.push(record);
        }

        Ok(ret)
    }

    fn insert(&self, sql: &str, params: &mut Params) -> Result<u64> {
        let connection = self.connection.lock();
        let (sql, bound) = bind(sql, params)?;
        let named = named_params(&bound);

        let count = {
            let mut stmt = connection.prepare_cached(&sql).map_err(Error::driver)?;
            stmt.execute(&named[..]).map_err(Error::driver)?
        };

        let key = connection.last_insert_rowid();
        params.insert(GENERATED_KEY.to_string(), key.into());

        Ok(count as u64)
    }

    fn update(&self, sql: &str, params: &Params) -> Result<u64> {
        self.execute(sql, params)
    }

    fn delete(&self, sql: &str, params: &Params) -> Result<u64> {
        self.execute(sql, params)
    }
}

/// Rewrites `#{params.<name>}` placeholders to SQLite's `:<name>` form and
/// collects the referenced parameters.
fn bind(sql: &str, params: &Params) -> Result<(String, Vec<(String, Value)>)> {
    const OPEN: &str = "#{params.";

    let mut out = String::with_capacity(sql.len());
    let mut bound = vec![];
    let mut rest = sql;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];

        let Some(end) = after.find('}') else {
            return Err(Error::driver(PlaceholderError(format!(
                "unterminated placeholder in `{sql}`"
            ))));
        };

        let name = &after[..end];
        let Some(value) = params.get(name) else {
            return Err(Error::driver(PlaceholderError(format!(
                "no parameter named `{name}`"
            ))));
        };

        let key = format!(":{name}");
        out.push_str(&key);
        if !bound.iter().any(|(bound_key, _)| *bound_key == key) {
            bound.push((key, Value::from(value.clone())));
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok((out, bound))
}

fn named_params(bound: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    bound
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

#[derive(Debug)]
struct PlaceholderError(String);

impl std::error::Error for PlaceholderError {}

impl fmt::Display for PlaceholderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
