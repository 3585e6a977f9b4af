use crate::{entity::EntityRef, Db, Entity, Query, Result};

use strata_core::{schema::EntityMetadata, stmt::Value};
use strata_sql::Operator;

use std::{fmt, sync::Arc};

/// State of a to-one relation slot.
#[derive(Clone, Default)]
pub enum ToOne {
    /// No related entity.
    #[default]
    Empty,

    /// The related entity is in memory.
    Loaded(Entity),

    /// The related row exists but has not been read yet.
    Unloaded(LazyRef),

    /// The row a lazy reference pointed at was not found when loaded.
    Missing(LazyRef),
}

/// A deferred single-row lookup: the first `target` row whose `column`
/// equals `value`.
#[derive(Clone)]
pub struct LazyRef {
    db: Db,
    target: Arc<EntityMetadata>,
    column: String,
    value: Value,
}

impl ToOne {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ToOne::Loaded(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ToOne::Empty)
    }

    pub fn entity(&self) -> Option<Entity> {
        match self {
            ToOne::Loaded(entity) => Some(entity.clone()),
            _ => None,
        }
    }
}

impl LazyRef {
    pub(crate) fn new(
        db: &Db,
        target: Arc<EntityMetadata>,
        column: String,
        value: Value,
    ) -> LazyRef {
        LazyRef {
            db: db.clone(),
            target,
            column,
            value,
        }
    }

    pub fn target(&self) -> &EntityMetadata {
        &self.target
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// The key the lookup matches on.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Runs the lookup: one query, never recursive.
    pub fn resolve(&self) -> Result<ToOne> {
        tracing::trace!(
            entity = %self.target.name,
            column = %self.column,
            value = %self.value,
            "loading lazy reference"
        );

        let found = Query::new(&self.db, self.target.clone())
            .filter(&self.column, Operator::Eq, self.value.clone())
            .limit(1)
            .disable_recursion()
            .get()?
            .into_iter()
            .next();

        Ok(match found {
            Some(entity) => ToOne::Loaded(entity),
            None => ToOne::Missing(self.clone()),
        })
    }
}

impl PartialEq for ToOne {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ToOne::Empty, ToOne::Empty) => true,
            (ToOne::Loaded(a), ToOne::Loaded(b)) => a.same(b),
            (ToOne::Unloaded(a), ToOne::Unloaded(b)) | (ToOne::Missing(a), ToOne::Missing(b)) => {
                a == b
            }
            _ => false,
        }
    }
}

impl PartialEq for LazyRef {
    fn eq(&self, other: &Self) -> bool {
        self.target.id == other.target.id
            && self.column == other.column
            && self.value == other.value
    }
}

impl fmt::Debug for ToOne {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToOne::Empty => write!(fmt, "None"),
            ToOne::Loaded(entity) => EntityRef(entity).fmt(fmt),
            ToOne::Unloaded(lazy) => write!(fmt, "<not loaded: {}>", lazy.target.name),
            ToOne::Missing(lazy) => write!(
                fmt,
                "<missing: {} where {} = {}>",
                lazy.target.name, lazy.column, lazy.value
            ),
        }
    }
}

impl fmt::Debug for LazyRef {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("LazyRef")
            .field("target", &self.target.name)
            .field("column", &self.column)
            .field("value", &self.value)
            .finish()
    }
}
