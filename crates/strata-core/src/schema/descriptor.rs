use super::{CollectionKind, JoinTable, RelationType};
use crate::stmt::Type;

/// Declarative description of an entity type.
///
/// Descriptors are registered with a [`Registry`](super::Registry), which
/// validates and resolves them into [`EntityMetadata`](super::EntityMetadata)
/// on first use.
///
/// ```
/// use strata_core::schema::{EntityDescriptor, RelationDescriptor};
/// use strata_core::stmt::Type;
///
/// let post = EntityDescriptor::new("Post")
///     .table("posts")
///     .primary_key("id", Type::I64)
///     .field("title", Type::String)
///     .relation(RelationDescriptor::many_to_one("author", "User").join_column("user_id"));
///
/// assert_eq!(post.name(), "Post");
/// ```
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) relations: Vec<RelationDescriptor>,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) column: String,
    pub(crate) ty: Type,
    pub(crate) primary_key: bool,
}

#[derive(Debug, Clone)]
pub struct RelationDescriptor {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) ty: RelationType,
    pub(crate) mapped_by: Option<String>,
    pub(crate) join_column: Option<String>,
    pub(crate) nullable: bool,
    pub(crate) orphan_removal: bool,
    pub(crate) join_table: Option<JoinTable>,
    pub(crate) collection: Option<CollectionKind>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: vec![],
            relations: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declares the primary key field, stored in a column of the same name.
    pub fn primary_key(self, name: impl Into<String>, ty: Type) -> Self {
        self.mapped_field(FieldDescriptor::new(name, ty).primary_key())
    }

    /// Declares a field stored in a column of the same name.
    pub fn field(self, name: impl Into<String>, ty: Type) -> Self {
        self.mapped_field(FieldDescriptor::new(name, ty))
    }

    pub fn mapped_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    pub(crate) fn find_relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|relation| relation.name == name)
    }
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            ty,
            primary_key: false,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

impl RelationDescriptor {
    fn new(name: impl Into<String>, target: impl Into<String>, ty: RelationType) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            ty,
            mapped_by: None,
            join_column: None,
            nullable: true,
            orphan_removal: false,
            join_table: None,
            collection: ty.is_collection().then_some(CollectionKind::List),
        }
    }

    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationType::OneToOne)
    }

    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationType::ManyToOne)
    }

    pub fn one_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationType::OneToMany)
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, RelationType::ManyToMany)
    }

    /// Marks this as the inverse side of `relation` on the target entity.
    pub fn mapped_by(mut self, relation: impl Into<String>) -> Self {
        self.mapped_by = Some(relation.into());
        self
    }

    /// Stores the link in `column` on this entity's table.
    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }

    /// The foreign key column does not accept `NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn orphan_removal(mut self) -> Self {
        self.orphan_removal = true;
        self
    }

    pub fn join_table(mut self, join_table: JoinTable) -> Self {
        self.join_table = Some(join_table);
        self
    }

    /// Holds elements as a set, deduplicated by primary key.
    pub fn set(mut self) -> Self {
        self.collection = Some(CollectionKind::Set);
        self
    }
}
