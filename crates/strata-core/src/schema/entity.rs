use super::{ModelId, RelationMetadata};
use crate::{
    stmt::{Type, Value},
    Error, Result,
};

use indexmap::IndexMap;

/// Resolved, immutable metadata for one entity type.
#[derive(Debug)]
pub struct EntityMetadata {
    pub id: ModelId,
    pub name: String,
    pub table_name: String,
    pub(crate) fields: Vec<FieldMetadata>,
    pub(crate) primary_key: usize,
    pub(crate) relations: IndexMap<String, RelationMetadata>,
}

/// One entry of an entity's field accessor table.
///
/// Entities store field values in a slot vector indexed by
/// [`FieldMetadata::index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub index: usize,
    pub name: String,
    pub column: String,
    pub ty: Type,
    pub primary_key: bool,
}

impl EntityMetadata {
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.column == column)
    }

    pub fn primary_key(&self) -> &FieldMetadata {
        &self.fields[self.primary_key]
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key().column
    }

    pub fn relation(&self, name: &str) -> Option<&RelationMetadata> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationMetadata> {
        self.relations.values()
    }

    /// Relations whose foreign key column lives on this entity's table.
    pub fn owning_relations(&self) -> impl Iterator<Item = &RelationMetadata> {
        self.relations()
            .filter(|relation| relation.is_owning_side_of_association())
    }

    /// The relation on this entity declared as the inverse of `name`.
    pub fn relation_mapped_by(&self, name: &str) -> Option<&RelationMetadata> {
        self.relations()
            .find(|relation| relation.mapped_by.as_deref() == Some(name))
    }

    /// Every column read for this entity: mapped fields followed by the
    /// join columns of owning relations that no field maps.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.fields.iter().map(|f| f.column.as_str()).collect();

        for relation in self.owning_relations() {
            if let Some(column) = relation.join_column.as_deref() {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }

        columns
    }
}

impl FieldMetadata {
    /// Coerces a column value to this field's type.
    pub fn coerce(&self, entity: &str, value: Value) -> Result<Value> {
        self.ty
            .cast(value)
            .map_err(|err| err.context(Error::mapping(entity, &self.name)))
    }
}
