mod builder;
pub use builder::Builder;

use crate::{engine::Persister, Entity, Query, RemoveOptions, Result, SaveOptions};

use strata_core::{
    schema::{EntityMetadata, Registry},
    Executor,
};
use strata_sql::SqlBuilder;

use std::{fmt, sync::Arc};

/// How the root alias of a query is derived from its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AliasStrategy {
    /// First letter of the entity name, lowercased: `User` queries as `u`.
    #[default]
    FirstLetter,

    /// The table name.
    Table,
}

/// Shared state between all `Db` clones.
struct Shared {
    registry: Registry,
    executor: Arc<dyn Executor>,
    alias: AliasStrategy,
}

/// A database handle: the entity registry plus the executor statements run
/// on. Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn metadata(&self, entity: &str) -> Result<Arc<EntityMetadata>> {
        self.shared.registry.metadata_by_name(entity)
    }

    /// A new, unsaved instance of `entity`.
    pub fn new_entity(&self, entity: &str) -> Result<Entity> {
        Ok(Entity::new(self.metadata(entity)?))
    }

    /// Starts a query over `entity`.
    pub fn query(&self, entity: &str) -> Result<Query> {
        Ok(Query::new(self, self.metadata(entity)?))
    }

    /// Saves `entity` and everything reachable through its owning relations,
    /// plus the relations named in `options`.
    pub fn save(&self, entity: &Entity, options: &SaveOptions) -> Result<()> {
        Persister::new(self).save_graph(entity, options)
    }

    /// Saves every entity in turn, sharing one visited set so an instance
    /// reachable from several of them is written once.
    pub fn save_all<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a Entity>,
        options: &SaveOptions,
    ) -> Result<()> {
        let mut persister = Persister::new(self);
        for entity in entities {
            persister.save_graph(entity, options)?;
        }
        Ok(())
    }

    /// Deletes `entity`, cascading through every relation.
    pub fn remove(&self, entity: &Entity) -> Result<()> {
        self.remove_with(entity, &RemoveOptions::all())
    }

    /// Deletes `entity`, cascading only through the relations `options`
    /// selects.
    pub fn remove_with(&self, entity: &Entity, options: &RemoveOptions) -> Result<()> {
        Persister::new(self).remove(entity, options)
    }

    pub(crate) fn alias_for(&self, metadata: &EntityMetadata) -> String {
        match self.shared.alias {
            AliasStrategy::FirstLetter => metadata
                .name
                .chars()
                .next()
                .map(|c| c.to_lowercase().collect())
                .unwrap_or_else(|| metadata.table_name.clone()),
            AliasStrategy::Table => metadata.table_name.clone(),
        }
    }

    pub(crate) fn sql(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(&self.shared.registry)
    }

    pub(crate) fn executor(&self) -> &dyn Executor {
        &*self.shared.executor
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Db")
            .field("executor", &self.shared.executor)
            .field("alias", &self.shared.alias)
            .finish()
    }
}
