mod cascade;
mod crud;
mod sync;

use crate::{entity::EntityAddress, Db, Entity, Result, SaveOptions, ToOne};

use std::collections::HashSet;
use strata_core::{
    schema::{RelationMetadata, RelationType},
    stmt::Value,
    Error,
};
use strata_sql::stmt::Lookup;

/// Writes entity graphs.
///
/// One persister backs one `save`, `save_all` or `remove` call. Entities are
/// marked visited when first reached, so cycles in the graph terminate and
/// every instance is written at most once.
pub(crate) struct Persister<'a> {
    db: &'a Db,
    visited: HashSet<EntityAddress>,
}

impl<'a> Persister<'a> {
    pub(crate) fn new(db: &'a Db) -> Persister<'a> {
        Persister {
            db,
            visited: HashSet::new(),
        }
    }

    pub(crate) fn save_graph(&mut self, entity: &Entity, options: &SaveOptions) -> Result<()> {
        if entity.is_removed() {
            return Err(Error::persistence(format!(
                "cannot save `{}` after it was removed",
                entity.name()
            )));
        }

        if !self.visited.insert(entity.address()) {
            return Ok(());
        }

        let metadata = entity.metadata();

        for relation in metadata.owning_relations() {
            if let ToOne::Loaded(target) = entity.one_state(&relation.field_name)? {
                self.save_graph(&target, options)?;
            }
        }

        if entity.is_new() {
            self.insert(entity)?;
        } else {
            self.update(entity)?;
        }

        for relation in metadata.relations() {
            if !options.cascades(&relation.field_name) {
                continue;
            }

            let res = match relation.ty {
                RelationType::OneToOne if relation.is_inverse_side() => {
                    self.save_inverse_one_to_one(entity, relation, options)
                }
                RelationType::OneToMany => self.sync_one_to_many(entity, relation, options),
                RelationType::ManyToMany => self.sync_many_to_many(entity, relation, options),
                _ => Ok(()),
            };

            res.map_err(|e| {
                e.context(Error::persistence(format!(
                    "saving relation `{}.{}`",
                    metadata.name, relation.field_name
                )))
            })?;
        }

        Ok(())
    }

    /// Points the owning side back at `owner` and saves it.
    fn save_inverse_one_to_one(
        &mut self,
        owner: &Entity,
        relation: &RelationMetadata,
        options: &SaveOptions,
    ) -> Result<()> {
        let ToOne::Loaded(target) = owner.one_state(&relation.field_name)? else {
            return Ok(());
        };

        let owning = self.db.registry().inverse_of(relation)?;
        target.put_to_one(&owning.field_name, ToOne::Loaded(owner.clone()))?;

        tracing::debug!(
            entity = %owner.name(),
            relation = %relation.field_name,
            "cascading save to inverse one-to-one"
        );

        self.save_graph(&target, options)
    }

    /// Reads one column of every row `lookup` matches, skipping nulls.
    fn lookup_column(&self, lookup: &Lookup, column: &str) -> Result<Vec<Value>> {
        let prepared = self.db.sql().prepare(lookup);
        self.db.fetch_column(&prepared, column)
    }
}
