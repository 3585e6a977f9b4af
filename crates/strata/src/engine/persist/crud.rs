use super::Persister;
use crate::{Entity, Result, ToOne};

use indexmap::IndexMap;
use strata_core::{stmt::Value, Error};
use strata_sql::{
    stmt::{Delete, Insert, Update},
    WhereClause,
};

impl Persister<'_> {
    /// Inserts the entity's non-null columns and adopts the generated key.
    pub(super) fn insert(&mut self, entity: &Entity) -> Result<()> {
        let metadata = entity.metadata();
        let foreign_keys = self.foreign_keys(entity)?;

        let mut values = IndexMap::new();
        for (field, value) in entity.column_values() {
            if !field.primary_key && !value.is_null() {
                values.insert(field.column, value);
            }
        }
        for (column, value) in &foreign_keys {
            if value.is_null() {
                values.shift_remove(column);
            } else {
                values.insert(column.clone(), value.clone());
            }
        }

        let insert = Insert::from_values(&metadata.table_name, values);
        let generated = self.db.exec_insert(self.db.sql().prepare(&insert))?;

        match generated {
            Some(id) => entity.set_id(id)?,
            None => {
                return Err(Error::persistence(format!(
                    "no key was generated for `{}`",
                    metadata.name
                )))
            }
        }

        self.write_foreign_keys(entity, foreign_keys)?;

        tracing::debug!(entity = %metadata.name, id = %entity.id(), "inserted entity");
        Ok(())
    }

    /// Writes every non-key column, nulls included, by primary key.
    pub(super) fn update(&mut self, entity: &Entity) -> Result<()> {
        let metadata = entity.metadata();
        let id = entity.id();
        let foreign_keys = self.foreign_keys(entity)?;

        let mut update = Update::new(&metadata.table_name);
        for (field, value) in entity.column_values() {
            if !field.primary_key {
                update = update.set(field.column, value);
            }
        }
        for (column, value) in &foreign_keys {
            update = update.set(column, value.clone());
        }

        if !update.assignments.is_empty() {
            let update = update.filter(WhereClause::eq(metadata.primary_key_column(), id.clone()));
            self.db.exec_update(&self.db.sql().prepare(&update))?;
        }

        self.write_foreign_keys(entity, foreign_keys)?;

        tracing::debug!(entity = %metadata.name, %id, "updated entity");
        Ok(())
    }

    /// Deletes the rows of `table` matching `filter`.
    pub(super) fn delete_where(&self, table: &str, filter: WhereClause) -> Result<u64> {
        let delete = Delete::new(table).filter(filter);
        self.db.exec_delete(&self.db.sql().prepare(&delete))
    }

    /// Sets `column` to null on the rows of `table` matching `filter`.
    pub(super) fn null_where(&self, table: &str, column: &str, filter: WhereClause) -> Result<u64> {
        let update = Update::new(table).set(column, Value::Null).filter(filter);
        self.db.exec_update(&self.db.sql().prepare(&update))
    }

    /// The foreign key value of every owning to-one relation.
    ///
    /// A loaded target contributes its key, which is known by now because
    /// owning targets are saved first. An unloaded reference keeps the key it
    /// was read with; otherwise the column's current value stands.
    fn foreign_keys(&self, entity: &Entity) -> Result<Vec<(String, Value)>> {
        let metadata = entity.metadata();
        let mut keys = vec![];

        for relation in metadata.owning_relations() {
            let Some(column) = relation.join_column.as_deref() else {
                continue;
            };

            let value = match entity.one_state(&relation.field_name)? {
                ToOne::Loaded(target) => target.id(),
                ToOne::Unloaded(lazy) => lazy.value().clone(),
                ToOne::Empty | ToOne::Missing(_) => entity.attribute(column),
            };

            if value.is_null() && !relation.foreign_key_nullable {
                return Err(Error::persistence(format!(
                    "`{}.{}` requires a value",
                    metadata.name, relation.field_name
                )));
            }

            keys.push((column.to_string(), value));
        }

        Ok(keys)
    }

    fn write_foreign_keys(&self, entity: &Entity, keys: Vec<(String, Value)>) -> Result<()> {
        for (column, value) in keys {
            entity.write_foreign_key(&column, value)?;
        }
        Ok(())
    }
}
