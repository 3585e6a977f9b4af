use super::{
    EntityDescriptor, EntityMetadata, FieldMetadata, RelationDescriptor, RelationMetadata,
    RelationType,
};
use crate::{Error, Result};

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// Identifies an entity type registered with a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

/// Link table columns of a many-to-many relation, seen from one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub table: String,

    /// Column referencing the entity that declares the relation
    pub owner_column: String,

    /// Column referencing the relation's target
    pub target_column: String,
}

/// Resolves entity descriptors into metadata, once per type.
///
/// Metadata is computed lazily and memoized. Computation happens outside the
/// cache lock, so two threads racing on the same type may both compute it;
/// the first insert wins and both observe the same `Arc`.
#[derive(Debug)]
pub struct Registry {
    descriptors: Vec<EntityDescriptor>,
    names: HashMap<String, ModelId>,
    cache: RwLock<HashMap<ModelId, Arc<EntityMetadata>>>,
}

impl Registry {
    pub fn new(descriptors: impl IntoIterator<Item = EntityDescriptor>) -> Result<Registry> {
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        let mut names = HashMap::with_capacity(descriptors.len());

        for (index, descriptor) in descriptors.iter().enumerate() {
            if names
                .insert(descriptor.name.clone(), ModelId(index))
                .is_some()
            {
                return Err(Error::configuration(format!(
                    "entity `{}` is registered more than once",
                    descriptor.name
                )));
            }
        }

        Ok(Registry {
            descriptors,
            names,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn model_id(&self, name: &str) -> Result<ModelId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| Error::configuration(format!("unknown entity `{name}`")))
    }

    pub fn model_ids(&self) -> impl Iterator<Item = ModelId> {
        (0..self.descriptors.len()).map(ModelId)
    }

    pub fn metadata(&self, id: ModelId) -> Result<Arc<EntityMetadata>> {
        if let Some(metadata) = self.cache.read().get(&id) {
            return Ok(metadata.clone());
        }

        let computed = Arc::new(self.compute(id)?);
        Ok(self.cache.write().entry(id).or_insert(computed).clone())
    }

    pub fn metadata_by_name(&self, name: &str) -> Result<Arc<EntityMetadata>> {
        self.metadata(self.model_id(name)?)
    }

    /// Resolves metadata for every registered entity, surfacing configuration
    /// errors up front.
    pub fn verify(&self) -> Result<()> {
        for id in self.model_ids() {
            self.metadata(id)?;
        }
        Ok(())
    }

    /// Returns the owning relation that an inverse relation is mapped by.
    pub fn inverse_of(&self, relation: &RelationMetadata) -> Result<RelationMetadata> {
        let Some(mapped_by) = relation.mapped_by.as_deref() else {
            return Err(Error::configuration(format!(
                "relation `{}` is not mapped by another relation",
                relation.field_name
            )));
        };
        let target = self.metadata(relation.target)?;

        target.relation(mapped_by).cloned().ok_or_else(|| {
            Error::configuration(format!(
                "`{}` has no relation `{mapped_by}`",
                target.name
            ))
        })
    }

    /// Returns the link table of a many-to-many relation, oriented from the
    /// declaring side. Inverse sides borrow the owning side's join table with
    /// the columns swapped.
    pub fn pivot(&self, relation: &RelationMetadata) -> Result<Pivot> {
        if relation.ty != RelationType::ManyToMany {
            return Err(Error::configuration(format!(
                "relation `{}` is not many-to-many",
                relation.field_name
            )));
        }

        if let Some(join_table) = &relation.join_table {
            return Ok(Pivot {
                table: join_table.table.clone(),
                owner_column: join_table.join_column.clone(),
                target_column: join_table.inverse_join_column.clone(),
            });
        }

        let owning = self.inverse_of(relation)?;
        let Some(join_table) = owning.join_table else {
            return Err(Error::configuration(format!(
                "many-to-many relation `{}` has no join table on either side",
                relation.field_name
            )));
        };

        Ok(Pivot {
            table: join_table.table,
            owner_column: join_table.inverse_join_column,
            target_column: join_table.join_column,
        })
    }

    /// Returns the many-to-one relation linking a node of a self-referential
    /// tree to its parent, given the one-to-many `children` relation.
    pub fn parent_relation(
        &self,
        model: &EntityMetadata,
        children: &RelationMetadata,
    ) -> Result<RelationMetadata> {
        let parent = self.inverse_of(children)?;

        if children.target != model.id || parent.join_column.is_none() {
            return Err(Error::configuration(format!(
                "relation `{}.{}` does not describe a self-referential tree",
                model.name, children.field_name
            )));
        }

        Ok(parent)
    }

    fn compute(&self, id: ModelId) -> Result<EntityMetadata> {
        let descriptor = self
            .descriptors
            .get(id.0)
            .ok_or_else(|| Error::configuration(format!("unknown model id {}", id.0)))?;
        let name = &descriptor.name;

        let table_name = match descriptor.table.as_deref() {
            Some(table) if !table.is_empty() => table.to_string(),
            _ => {
                return Err(Error::configuration(format!(
                    "entity `{name}` has no table name"
                )))
            }
        };

        let fields: Vec<_> = descriptor
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| FieldMetadata {
                index,
                name: field.name.clone(),
                column: field.column.clone(),
                ty: field.ty,
                primary_key: field.primary_key,
            })
            .collect();

        let mut primary_keys = fields.iter().filter(|field| field.primary_key);
        let primary_key = match (primary_keys.next(), primary_keys.next()) {
            (Some(field), None) => field.index,
            (None, _) => {
                return Err(Error::configuration(format!(
                    "entity `{name}` has no primary key"
                )))
            }
            (Some(_), Some(_)) => {
                return Err(Error::configuration(format!(
                    "entity `{name}` declares more than one primary key"
                )))
            }
        };

        let mut relations = IndexMap::with_capacity(descriptor.relations.len());
        for relation in &descriptor.relations {
            let resolved = self.resolve_relation(descriptor, relation)?;
            relations.insert(relation.name.clone(), resolved);
        }

        Ok(EntityMetadata {
            id,
            name: name.clone(),
            table_name,
            fields,
            primary_key,
            relations,
        })
    }

    fn resolve_relation(
        &self,
        owner: &EntityDescriptor,
        relation: &RelationDescriptor,
    ) -> Result<RelationMetadata> {
        let path = format!("{}.{}", owner.name, relation.name);

        let target = self.names.get(&relation.target).copied().ok_or_else(|| {
            Error::configuration(format!(
                "relation `{path}` targets unknown entity `{}`",
                relation.target
            ))
        })?;

        let mapped_by = relation
            .mapped_by
            .clone()
            .filter(|mapped_by| !mapped_by.is_empty());

        if let Some(mapped_by) = &mapped_by {
            let target_descriptor = &self.descriptors[target.0];
            if target_descriptor.find_relation(mapped_by).is_none() {
                return Err(Error::configuration(format!(
                    "relation `{path}` is mapped by `{mapped_by}`, which `{}` does not declare",
                    relation.target
                )));
            }
        }

        match relation.ty {
            RelationType::OneToOne | RelationType::ManyToOne => {
                if mapped_by.is_none() && relation.join_column.is_none() {
                    return Err(Error::configuration(format!(
                        "relation `{path}` needs a join column or mapped_by"
                    )));
                }
            }
            RelationType::OneToMany => {
                if mapped_by.is_none() {
                    return Err(Error::configuration(format!(
                        "one-to-many relation `{path}` needs mapped_by"
                    )));
                }
            }
            RelationType::ManyToMany => {
                if mapped_by.is_none() && relation.join_table.is_none() {
                    return Err(Error::configuration(format!(
                        "many-to-many relation `{path}` has neither a join table nor mapped_by"
                    )));
                }
            }
        }

        Ok(RelationMetadata {
            field_name: relation.name.clone(),
            target,
            ty: relation.ty,
            mapped_by,
            join_column: relation.join_column.clone(),
            foreign_key_nullable: relation.nullable,
            orphan_removal: relation.orphan_removal,
            join_table: relation.join_table.clone(),
            collection: relation
                .ty
                .is_collection()
                .then(|| relation.collection.unwrap_or_default()),
        })
    }
}
