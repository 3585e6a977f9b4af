use super::{AliasStrategy, Db, Shared};
use crate::{Model, Result};

use strata_core::{
    schema::{EntityDescriptor, Registry},
    Error, Executor,
};

use std::sync::Arc;

pub struct Builder {
    descriptors: Vec<EntityDescriptor>,
    executor: Option<Arc<dyn Executor>>,
    alias: AliasStrategy,

    /// Resolve every entity's metadata up front instead of on first use
    verify: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            descriptors: vec![],
            executor: None,
            alias: AliasStrategy::default(),
            verify: true,
        }
    }
}

impl Builder {
    pub fn register<T: Model>(&mut self) -> &mut Self {
        self.descriptors.push(T::describe());
        self
    }

    /// Registers an entity described at runtime rather than by a [`Model`]
    /// implementation.
    pub fn register_descriptor(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn default_alias(&mut self, alias: AliasStrategy) -> &mut Self {
        self.alias = alias;
        self
    }

    pub fn verify(&mut self, verify: bool) -> &mut Self {
        self.verify = verify;
        self
    }

    pub fn executor(&mut self, executor: impl Executor) -> &mut Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Opens the database at `url` and builds the handle.
    #[cfg(feature = "sqlite")]
    pub fn connect(&mut self, url: &str) -> Result<Db> {
        self.executor(strata_driver_sqlite::Sqlite::new(url)?);
        self.build()
    }

    pub fn build(&mut self) -> Result<Db> {
        let Some(executor) = self.executor.clone() else {
            return Err(Error::configuration("no executor configured"));
        };

        let registry = Registry::new(self.descriptors.clone())?;
        if self.verify {
            registry.verify()?;
        }

        tracing::debug!(
            entities = registry.model_ids().count(),
            alias = ?self.alias,
            "built database handle"
        );

        Ok(Db {
            shared: Arc::new(Shared {
                registry,
                executor,
                alias: self.alias,
            }),
        })
    }
}
