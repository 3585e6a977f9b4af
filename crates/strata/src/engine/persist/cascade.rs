use super::Persister;
use crate::{relation, Entity, RemoveOptions, Result};

use strata_core::{schema::RelationType, Error};
use strata_sql::WhereClause;

impl Persister<'_> {
    /// Deletes `entity` after handling the rows that reference it through
    /// the relations `options` cascades over.
    pub(crate) fn remove(&mut self, entity: &Entity, options: &RemoveOptions) -> Result<()> {
        let metadata = entity.metadata();

        if entity.is_removed() {
            return Err(Error::persistence(format!(
                "`{}` was already removed",
                metadata.name
            )));
        }

        let id = entity.id();
        if id.is_null() {
            return Err(Error::persistence(format!(
                "cannot remove `{}` before it is saved",
                metadata.name
            )));
        }

        let registry = self.db.registry();

        for relation in metadata.relations() {
            if !options.cascades(&relation.field_name) {
                continue;
            }

            match relation.ty {
                RelationType::OneToMany => {
                    let target = registry.metadata(relation.target)?;
                    let foreign_key = relation::owning_join_column(self.db, relation)?;
                    let filter = WhereClause::eq(&foreign_key, id.clone());

                    let count = if relation.orphan_removal {
                        self.delete_where(&target.table_name, filter)?
                    } else {
                        self.null_where(&target.table_name, &foreign_key, filter)?
                    };

                    tracing::debug!(
                        entity = %metadata.name,
                        relation = %relation.field_name,
                        count,
                        deleted = relation.orphan_removal,
                        "cascaded remove to children"
                    );
                }
                RelationType::OneToOne if relation.is_inverse_side() => {
                    let target = registry.metadata(relation.target)?;
                    let owning = registry.inverse_of(relation)?;
                    let foreign_key = relation::owning_join_column(self.db, relation)?;
                    let filter = WhereClause::eq(&foreign_key, id.clone());
                    let delete = relation.orphan_removal || !owning.foreign_key_nullable;

                    if delete {
                        self.delete_where(&target.table_name, filter)?;
                    } else {
                        self.null_where(&target.table_name, &foreign_key, filter)?;
                    }

                    tracing::debug!(
                        entity = %metadata.name,
                        relation = %relation.field_name,
                        deleted = delete,
                        "cascaded remove to inverse one-to-one"
                    );
                }
                RelationType::ManyToMany => {
                    let pivot = registry.pivot(relation)?;
                    let count = self.delete_where(
                        &pivot.table,
                        WhereClause::eq(&pivot.owner_column, id.clone()),
                    )?;

                    tracing::debug!(
                        entity = %metadata.name,
                        relation = %relation.field_name,
                        count,
                        "removed links"
                    );
                }
                _ => {}
            }
        }

        self.delete_where(
            &metadata.table_name,
            WhereClause::eq(metadata.primary_key_column(), id.clone()),
        )?;
        entity.mark_removed();

        tracing::debug!(entity = %metadata.name, %id, "removed entity");
        Ok(())
    }
}
