use crate::{Db, Entity, Query, Result};

use strata_core::{schema::EntityDescriptor, stmt::Value};

/// A type registered with a [`Db`].
///
/// Implementors describe how the entity is mapped; instances are handled as
/// dynamic [`Entity`] values.
pub trait Model {
    /// Entity name, unique within a registry.
    const NAME: &'static str;

    /// Table, fields and relations of the entity.
    fn describe() -> EntityDescriptor;

    /// A new, unsaved instance.
    fn create(db: &Db) -> Result<Entity> {
        db.new_entity(Self::NAME)
    }

    fn query(db: &Db) -> Result<Query> {
        db.query(Self::NAME)
    }

    fn find_by_id(db: &Db, id: impl Into<Value>) -> Result<Option<Entity>> {
        Self::query(db)?.find_by_id(id)
    }
}
