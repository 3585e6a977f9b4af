mod descriptor;
pub use descriptor::{EntityDescriptor, FieldDescriptor, RelationDescriptor};

mod entity;
pub use entity::{EntityMetadata, FieldMetadata};

mod relation;
pub use relation::{CollectionKind, JoinTable, RelationMetadata, RelationType};

mod registry;
pub use registry::{ModelId, Pivot, Registry};
