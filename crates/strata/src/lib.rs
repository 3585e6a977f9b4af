pub mod db;
pub use db::{AliasStrategy, Db};

mod custom;

mod derived;
pub use derived::{Action, Criterion, Derived, DerivedQuery, Keyword, Quantifier};

mod dto;
pub use dto::TransferObject;

mod engine;

mod entity;
pub use entity::Entity;

mod model;
pub use model::Model;

mod options;
pub use options::{RemoveOptions, SaveOptions};

mod page;
pub use page::Page;

mod query;
pub use query::Query;

pub mod relation;
pub use relation::{LazyCollection, LazyRef, ToOne};

pub use strata_core::{
    bail, err,
    schema::{CollectionKind, EntityDescriptor, FieldDescriptor, JoinTable, RelationDescriptor},
    stmt::{Type, Value},
    Error, Executor, Result,
};
pub use strata_sql::{Conjunction, Direction, JoinType, Operator};

#[cfg(feature = "sqlite")]
pub use strata_driver_sqlite::Sqlite;
