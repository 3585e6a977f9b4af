mod collection;
pub use collection::LazyCollection;
pub(crate) use collection::{CollectionLoader, Source};

mod to_one;
pub use to_one::{LazyRef, ToOne};

use crate::{entity::RelationSlot, Db, Entity, Result};

use strata_core::{
    schema::{RelationMetadata, RelationType},
    Error,
};

/// Builds the unloaded state of a relation that was not joined, keyed from
/// the values already read into `entity`.
pub(crate) fn placeholder(
    db: &Db,
    entity: &Entity,
    relation: &RelationMetadata,
) -> Result<RelationSlot> {
    let registry = db.registry();
    let target = registry.metadata(relation.target)?;
    let id = entity.id();

    Ok(match relation.ty {
        RelationType::OneToMany => {
            let foreign_key = owning_join_column(db, relation)?;
            RelationSlot::Many(LazyCollection::unloaded(
                relation.collection_kind(),
                CollectionLoader {
                    db: db.clone(),
                    target,
                    relation: relation.field_name.clone(),
                    owner: id,
                    source: Source::ForeignKey(foreign_key),
                },
            ))
        }
        RelationType::ManyToMany => RelationSlot::Many(LazyCollection::unloaded(
            relation.collection_kind(),
            CollectionLoader {
                db: db.clone(),
                target,
                relation: relation.field_name.clone(),
                owner: id,
                source: Source::Pivot(registry.pivot(relation)?),
            },
        )),
        _ if relation.is_owning_side_of_association() => {
            let join_column = relation.join_column.as_deref().unwrap_or_default();
            let key = entity.attribute(join_column);
            if key.is_null() {
                RelationSlot::One(ToOne::Empty)
            } else {
                let column = target.primary_key_column().to_string();
                RelationSlot::One(ToOne::Unloaded(LazyRef::new(db, target, column, key)))
            }
        }
        _ => {
            let foreign_key = owning_join_column(db, relation)?;
            if id.is_null() {
                RelationSlot::One(ToOne::Empty)
            } else {
                RelationSlot::One(ToOne::Unloaded(LazyRef::new(db, target, foreign_key, id)))
            }
        }
    })
}

/// The foreign key column of the owning relation an inverse relation is
/// mapped by.
pub(crate) fn owning_join_column(db: &Db, relation: &RelationMetadata) -> Result<String> {
    let owning = db.registry().inverse_of(relation)?;
    owning.join_column.ok_or_else(|| {
        Error::configuration(format!(
            "relation `{}` is mapped by `{}`, which has no join column",
            relation.field_name, owning.field_name
        ))
    })
}
