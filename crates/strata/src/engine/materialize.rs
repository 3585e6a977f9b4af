use crate::{entity::RelationSlot, relation, Db, Entity, Result, ToOne};

use indexmap::IndexMap;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use strata_core::{
    driver::Row,
    schema::{EntityMetadata, ModelId, RelationMetadata},
    stmt::Value,
};
use strata_sql::QuerySpec;

/// Turns joined result rows into entity graphs.
///
/// Within one call every `(entity, primary key)` pair maps to exactly one
/// instance, so a row repeated by a to-many join extends the entity built
/// from the first row instead of producing a copy.
pub(crate) fn materialize(db: &Db, spec: &QuerySpec, rows: Vec<Row>) -> Result<Vec<Entity>> {
    let registry = db.registry();
    let root = registry.metadata(spec.model)?;

    let mut eager = vec![];
    for (join, join_relation) in spec.relation_joins() {
        let Some(relation) = root.relation(&join_relation.name) else {
            continue;
        };
        let target = registry.metadata(relation.target)?;
        eager.push((join.alias.as_str(), relation, target));
    }

    let eager_names: HashSet<&str> = eager
        .iter()
        .map(|(_, relation, _)| relation.field_name.as_str())
        .collect();

    let mut materializer = Materializer {
        db,
        cache: HashMap::new(),
    };

    let mut roots = vec![];
    let mut seen = HashSet::new();

    for row in &rows {
        let Some(entity) =
            materializer.entity(&root, row, Some(&spec.alias), true, &eager_names)?
        else {
            continue;
        };

        if seen.insert(entity.id()) {
            roots.push(entity.clone());
        }

        for (alias, relation, target) in &eager {
            let Some(related) =
                materializer.entity(target, row, Some(alias), false, &HashSet::new())?
            else {
                continue;
            };
            materializer.link(&entity, relation, &related)?;
        }
    }

    tracing::trace!(
        entity = %root.name,
        rows = rows.len(),
        roots = roots.len(),
        "materialized rows"
    );

    Ok(roots)
}

/// Maps rows of a hand-written select onto `metadata`, one distinct entity
/// per primary key. Columns are read as `{alias}_{column}`, falling back to
/// the bare column name, or only by bare name without an alias. Every
/// relation is left to load lazily.
pub(crate) fn map_rows(
    db: &Db,
    metadata: &Arc<EntityMetadata>,
    rows: &[Row],
    alias: Option<&str>,
) -> Result<Vec<Entity>> {
    let mut materializer = Materializer {
        db,
        cache: HashMap::new(),
    };

    let mut entities = vec![];
    let mut seen = HashSet::new();

    for row in rows {
        let Some(entity) = materializer.entity(metadata, row, alias, true, &HashSet::new())?
        else {
            continue;
        };
        if seen.insert(entity.id()) {
            entities.push(entity);
        }
    }

    Ok(entities)
}

struct Materializer<'a> {
    db: &'a Db,
    cache: HashMap<(ModelId, Value), Entity>,
}

impl Materializer<'_> {
    /// Returns the entity whose columns appear under `alias` in `row`, or
    /// `None` when its primary key is null (an unmatched outer join).
    fn entity(
        &mut self,
        metadata: &Arc<EntityMetadata>,
        row: &Row,
        alias: Option<&str>,
        is_root: bool,
        eager: &HashSet<&str>,
    ) -> Result<Option<Entity>> {
        let read = |column: &str| match alias {
            Some(alias) => row
                .get(&format!("{alias}_{column}"))
                .or_else(|| if is_root { row.get(column) } else { None }),
            None => row.get(column),
        };

        let id = read(metadata.primary_key_column()).cloned().unwrap_or_default();
        if id.is_null() {
            return Ok(None);
        }
        let id = metadata.primary_key().coerce(&metadata.name, id)?;

        let key = (metadata.id, id);
        if let Some(entity) = self.cache.get(&key) {
            return Ok(Some(entity.clone()));
        }

        let mut attributes = IndexMap::new();
        for column in metadata.columns() {
            if let Some(value) = read(column) {
                attributes.insert(column.to_string(), value.clone());
            }
        }

        let entity = Entity::new(metadata.clone());
        entity.hydrate(attributes)?;

        for relation in metadata.relations() {
            if eager.contains(relation.field_name.as_str()) {
                continue;
            }
            match relation::placeholder(self.db, &entity, relation)? {
                RelationSlot::One(slot) => entity.put_to_one(&relation.field_name, slot)?,
                RelationSlot::Many(collection) => {
                    entity.put_collection(&relation.field_name, collection)?
                }
            }
        }

        self.cache.insert(key, entity.clone());
        Ok(Some(entity))
    }

    /// Attaches `related` to `owner` through `relation`, then sets the
    /// counterpart relation on `related`. Repeated rows are no-ops.
    fn link(&self, owner: &Entity, relation: &RelationMetadata, related: &Entity) -> Result<()> {
        attach(owner, relation, related)?;

        let target = related.metadata();
        let counterpart = match relation.mapped_by.as_deref() {
            Some(mapped_by) => target.relation(mapped_by),
            None => target.relation_mapped_by(&relation.field_name),
        }
        .filter(|counterpart| counterpart.target == owner.model());

        if let Some(counterpart) = counterpart {
            attach(related, counterpart, owner)?;
        }

        tracing::trace!(
            owner = %owner.name(),
            relation = %relation.field_name,
            related = %related.id(),
            "linked eager relation"
        );

        Ok(())
    }
}

/// Points a to-one slot at `target` unless it already holds a loaded
/// entity, or appends `target` to a collection. Collections that were not
/// loaded are left alone.
fn attach(entity: &Entity, relation: &RelationMetadata, target: &Entity) -> Result<()> {
    let name = &relation.field_name;

    if relation.is_collection() {
        entity.many(name)?.push_unique(target.clone());
    } else if !entity.one_state(name)?.is_loaded() {
        entity.put_to_one(name, ToOne::Loaded(target.clone()))?;
    }

    Ok(())
}
