use crate::{Entity, LazyCollection, Query, Result, ToOne};

use std::collections::HashMap;
use strata_core::{schema::RelationMetadata, Error};

/// Loads a self-referential tree in two queries: a recursive query for the
/// keys of every node under the matched roots, then one select hydrating
/// all of them. Returns the top-level nodes.
pub(crate) fn resolve(query: &Query, children: &RelationMetadata) -> Result<Vec<Entity>> {
    let db = query.db();
    let metadata = query.metadata();

    let parent = db.registry().parent_relation(metadata, children)?;
    let Some(parent_column) = parent.join_column.as_deref() else {
        return Err(Error::configuration(format!(
            "relation `{}.{}` has no join column",
            metadata.name, parent.field_name
        )));
    };

    let prepared = db
        .sql()
        .build_recursive_ids(query.spec(), parent_column)?;
    let ids = db.fetch_column(&prepared, metadata.primary_key_column())?;

    tracing::debug!(
        entity = %metadata.name,
        relation = %children.field_name,
        nodes = ids.len(),
        "resolved tree keys"
    );

    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut spec = query.spec().clone();
    spec.filters.clear();
    spec.limit = None;
    spec.offset = None;
    spec.recursive = false;

    let nodes = Query::from_spec(db, metadata.clone(), spec)
        .filter_ids(ids)
        .get()?;

    build_tree(&nodes, children, &parent, parent_column)
}

/// Links every node to its parent and returns the nodes without one.
fn build_tree(
    nodes: &[Entity],
    children: &RelationMetadata,
    parent: &RelationMetadata,
    parent_column: &str,
) -> Result<Vec<Entity>> {
    let mut by_id = HashMap::with_capacity(nodes.len());
    for node in nodes {
        node.put_collection(
            &children.field_name,
            LazyCollection::loaded(children.collection_kind(), vec![]),
        )?;
        by_id.insert(node.id(), node.clone());
    }

    let mut roots = vec![];
    for node in nodes {
        let parent_id = node.attribute(parent_column);

        match by_id.get(&parent_id) {
            Some(parent_node) if !parent_id.is_null() && !parent_node.same(node) => {
                parent_node
                    .many(&children.field_name)?
                    .push_unique(node.clone());
                node.put_to_one(&parent.field_name, ToOne::Loaded(parent_node.clone()))?;
            }
            _ => roots.push(node.clone()),
        }
    }

    Ok(roots)
}
