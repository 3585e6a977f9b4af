mod exec_log;
pub use exec_log::ExecLog;

pub mod fixtures;
pub use fixtures::{Category, Comment, Post, Profile, Tag, User};

pub use logging_executor::{ExecutedStatement, LoggingExecutor, StatementKind};

pub use std_util::*;

use strata::{Db, Entity, Model, Result, SaveOptions, Value};
use strata_driver_sqlite::Sqlite;

/// Opens an in-memory database with the fixture schema, returning the
/// handle and the log of every statement it runs.
pub fn setup() -> (Db, ExecLog) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let sqlite = Sqlite::in_memory().unwrap();
    sqlite.execute_batch(fixtures::SCHEMA).unwrap();

    let executor = LoggingExecutor::new(Box::new(sqlite));
    let log = ExecLog::new(executor.log_handle());

    let db = Db::builder()
        .register::<User>()
        .register::<Profile>()
        .register::<Post>()
        .register::<Comment>()
        .register::<Tag>()
        .register::<Category>()
        .executor(executor)
        .build()
        .unwrap();

    (db, log)
}

/// Creates and saves an entity with the given field values.
pub fn create<M: Model>(db: &Db, fields: &[(&str, Value)]) -> Result<Entity> {
    let entity = M::create(db)?;
    for (name, value) in fields {
        entity.set(name, value.clone())?;
    }
    db.save(&entity, &SaveOptions::new())?;
    Ok(entity)
}
