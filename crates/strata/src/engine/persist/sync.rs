use super::Persister;
use crate::{relation, Entity, Result, SaveOptions, ToOne};

use indexmap::IndexSet;
use strata_core::{schema::RelationMetadata, stmt::Value, Error};
use strata_sql::{
    stmt::{Delete, Insert, Lookup},
    WhereClause,
};

impl Persister<'_> {
    /// Saves the members of a one-to-many collection and detaches rows that
    /// are no longer members: deleted with orphan removal, otherwise their
    /// foreign key is cleared. A collection that was never loaded is left
    /// untouched.
    pub(super) fn sync_one_to_many(
        &mut self,
        owner: &Entity,
        relation: &RelationMetadata,
        options: &SaveOptions,
    ) -> Result<()> {
        let Some(members) = owner.many(&relation.field_name)?.loaded_items() else {
            return Ok(());
        };

        let registry = self.db.registry();
        let owning = registry.inverse_of(relation)?;
        let foreign_key = relation::owning_join_column(self.db, relation)?;
        let target = registry.metadata(relation.target)?;
        let primary_key = target.primary_key_column();
        let owner_id = owner.id();

        let current = self.lookup_column(
            &Lookup::new(&target.table_name, vec![primary_key.to_string()])
                .filter(WhereClause::eq(&foreign_key, owner_id.clone())),
            primary_key,
        )?;

        for member in &members {
            member.put_to_one(&owning.field_name, ToOne::Loaded(owner.clone()))?;
            self.save_graph(member, options)?;
        }

        let kept: IndexSet<Value> = members
            .iter()
            .map(Entity::id)
            .filter(|id| !id.is_null())
            .collect();

        let detached: Vec<Value> = current
            .into_iter()
            .filter(|id| !kept.contains(id))
            .collect();

        if detached.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            entity = %target.name,
            relation = %relation.field_name,
            count = detached.len(),
            orphan_removal = relation.orphan_removal,
            "detaching removed members"
        );

        let filter = WhereClause::in_list(primary_key, detached);
        if relation.orphan_removal {
            self.delete_where(&target.table_name, filter)?;
        } else {
            self.null_where(&target.table_name, &foreign_key, filter)?;
        }

        Ok(())
    }

    /// Saves the members of a many-to-many collection, then rewrites the
    /// link table with one delete for dropped links and one insert for new
    /// ones.
    pub(super) fn sync_many_to_many(
        &mut self,
        owner: &Entity,
        relation: &RelationMetadata,
        options: &SaveOptions,
    ) -> Result<()> {
        let Some(members) = owner.many(&relation.field_name)?.loaded_items() else {
            return Ok(());
        };

        let pivot = self.db.registry().pivot(relation)?;
        let owner_id = owner.id();
        if owner_id.is_null() {
            return Err(Error::persistence(format!(
                "`{}` has no key to link `{}` with",
                owner.name(),
                relation.field_name
            )));
        }

        for member in &members {
            self.save_graph(member, options)?;
        }

        let desired: IndexSet<Value> = members
            .iter()
            .map(Entity::id)
            .filter(|id| !id.is_null())
            .collect();

        let current: IndexSet<Value> = self
            .lookup_column(
                &Lookup::new(&pivot.table, vec![pivot.target_column.clone()])
                    .filter(WhereClause::eq(&pivot.owner_column, owner_id.clone())),
                &pivot.target_column,
            )?
            .into_iter()
            .collect();

        let unlinked: Vec<Value> = current.difference(&desired).cloned().collect();
        let linked: Vec<Value> = desired.difference(&current).cloned().collect();

        tracing::debug!(
            entity = %owner.name(),
            relation = %relation.field_name,
            unlinked = unlinked.len(),
            linked = linked.len(),
            "synchronizing link table"
        );

        if !unlinked.is_empty() {
            let delete = Delete::new(&pivot.table)
                .filter(WhereClause::eq(&pivot.owner_column, owner_id.clone()))
                .filter(WhereClause::in_list(&pivot.target_column, unlinked));
            self.db.exec_delete(&self.db.sql().prepare(&delete))?;
        }

        if !linked.is_empty() {
            let mut insert = Insert::new(
                &pivot.table,
                vec![pivot.owner_column.clone(), pivot.target_column.clone()],
            );
            for target_id in linked {
                insert.push_row(vec![owner_id.clone(), target_id]);
            }
            self.db.exec_insert(self.db.sql().prepare(&insert))?;
        }

        Ok(())
    }
}
