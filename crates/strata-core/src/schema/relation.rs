use super::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationType {
    pub fn is_collection(self) -> bool {
        matches!(self, RelationType::OneToMany | RelationType::ManyToMany)
    }
}

/// How a to-many relation holds its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionKind {
    /// Insertion ordered, duplicates allowed
    #[default]
    List,

    /// Deduplicated by primary key, falling back to instance identity
    Set,
}

/// The link table backing the owning side of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    pub table: String,

    /// Column referencing the owning entity
    pub join_column: String,

    /// Column referencing the target entity
    pub inverse_join_column: String,
}

impl JoinTable {
    pub fn new(
        table: impl Into<String>,
        join_column: impl Into<String>,
        inverse_join_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            join_column: join_column.into(),
            inverse_join_column: inverse_join_column.into(),
        }
    }
}

/// A resolved relation between two entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMetadata {
    /// Name of the relation field on the declaring entity
    pub field_name: String,

    /// Entity type on the other end
    pub target: ModelId,

    pub ty: RelationType,

    /// Name of the owning relation on the target, set on inverse sides
    pub mapped_by: Option<String>,

    /// Foreign key column on the declaring table, set on owning to-one sides
    pub join_column: Option<String>,

    pub foreign_key_nullable: bool,

    /// Delete rows that lose their parent instead of nulling the foreign key
    pub orphan_removal: bool,

    pub join_table: Option<JoinTable>,

    /// Set for collection relations
    pub collection: Option<CollectionKind>,
}

impl RelationMetadata {
    /// A to-one relation whose table holds the foreign key.
    pub fn is_owning_side_of_association(&self) -> bool {
        matches!(self.ty, RelationType::OneToOne | RelationType::ManyToOne)
            && self.join_column.is_some()
    }

    /// The side that controls the stored link: the foreign key holder for
    /// to-one relations, the join table holder for many-to-many.
    pub fn is_owning_side(&self) -> bool {
        match self.ty {
            RelationType::ManyToMany => self.join_table.is_some(),
            _ => self.is_owning_side_of_association(),
        }
    }

    pub fn is_inverse_side(&self) -> bool {
        self.mapped_by.as_deref().is_some_and(|name| !name.is_empty())
    }

    pub fn is_collection(&self) -> bool {
        self.ty.is_collection()
    }

    pub fn collection_kind(&self) -> CollectionKind {
        self.collection.unwrap_or_default()
    }
}
