use crate::{
    relation::{LazyCollection, ToOne},
    Result,
};

use by_address::ByAddress;
use indexmap::IndexMap;
use std::{cell::RefCell, fmt, rc::Rc, sync::Arc};
use strata_core::{
    err,
    schema::{EntityMetadata, FieldMetadata, ModelId, RelationMetadata},
    stmt::Value,
    Error,
};

/// A shared handle to one entity instance.
///
/// Cloning the handle does not copy the entity: every clone observes the same
/// field values and relation state. Handles compare equal only when they
/// point at the same instance.
#[derive(Clone)]
pub struct Entity {
    state: Rc<RefCell<EntityState>>,
}

/// Identity of an entity instance, used to track visited nodes while walking
/// a graph.
pub(crate) type EntityAddress = ByAddress<Rc<RefCell<EntityState>>>;

pub(crate) struct EntityState {
    metadata: Arc<EntityMetadata>,

    /// Field values, indexed by `FieldMetadata::index`
    values: Vec<Value>,

    /// Raw column values, including foreign keys no field maps
    attributes: IndexMap<String, Value>,

    relations: IndexMap<String, RelationSlot>,

    removed: bool,
}

#[derive(Clone)]
pub(crate) enum RelationSlot {
    One(ToOne),
    Many(LazyCollection),
}

impl Entity {
    /// Creates an empty, unsaved instance. Collections start empty and
    /// to-one relations unset.
    pub(crate) fn new(metadata: Arc<EntityMetadata>) -> Entity {
        let relations = metadata
            .relations()
            .map(|relation| {
                let slot = match relation.collection {
                    Some(kind) => RelationSlot::Many(LazyCollection::loaded(kind, vec![])),
                    None => RelationSlot::One(ToOne::Empty),
                };
                (relation.field_name.clone(), slot)
            })
            .collect();

        Entity {
            state: Rc::new(RefCell::new(EntityState {
                values: vec![Value::Null; metadata.fields().len()],
                attributes: IndexMap::new(),
                relations,
                removed: false,
                metadata,
            })),
        }
    }

    pub fn metadata(&self) -> Arc<EntityMetadata> {
        self.state.borrow().metadata.clone()
    }

    pub fn model(&self) -> ModelId {
        self.state.borrow().metadata.id
    }

    /// The primary key, `Null` until the entity is saved.
    pub fn id(&self) -> Value {
        let state = self.state.borrow();
        state.values[state.metadata.primary_key().index].clone()
    }

    /// `true` when the primary key is null or zero.
    pub fn is_new(&self) -> bool {
        let id = self.id();
        id.is_null() || id.is_zero()
    }

    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn same(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        let state = self.state.borrow();
        let field = state.field(field)?;
        Ok(state.values[field.index].clone())
    }

    /// Reads a field converted to `T`.
    pub fn get_as<T>(&self, field: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        let value = self.get(field)?;
        T::try_from(value).map_err(|err| err.context(Error::mapping(self.name(), field)))
    }

    /// Sets a field, coercing the value to the field's declared type.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let field = state.field(field)?.clone();
        let value = field.coerce(&state.metadata.name, value.into())?;

        state.attributes.insert(field.column.clone(), value.clone());
        state.values[field.index] = value;
        Ok(())
    }

    /// Field values keyed by field name, in declaration order.
    pub fn values(&self) -> IndexMap<String, Value> {
        let state = self.state.borrow();
        state
            .metadata
            .fields()
            .iter()
            .map(|field| (field.name.clone(), state.values[field.index].clone()))
            .collect()
    }

    /// The raw value of a column, `Null` if it was never read or written.
    pub fn attribute(&self, column: &str) -> Value {
        self.state
            .borrow()
            .attributes
            .get(column)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the target of a to-one relation, loading it on first access.
    pub fn one(&self, relation: &str) -> Result<Option<Entity>> {
        match self.one_state(relation)? {
            ToOne::Unloaded(lazy) => {
                let resolved = lazy.resolve()?;
                let entity = resolved.entity();
                self.put_to_one(relation, resolved)?;
                Ok(entity)
            }
            other => Ok(other.entity()),
        }
    }

    /// Points a to-one relation at `target`, or clears it.
    ///
    /// On the owning side the foreign key column is updated as well; the key
    /// of a target that is not yet saved is resolved when the graph is saved.
    pub fn set_one(&self, relation: &str, target: Option<&Entity>) -> Result<()> {
        let metadata = self.relation(relation)?;
        if metadata.is_collection() {
            return Err(self.not_to_one(relation));
        }

        if let Some(join_column) = metadata.join_column.as_deref() {
            let key = target.map(Entity::id).unwrap_or_default();
            self.write_foreign_key(join_column, key)?;
        }

        let slot = match target {
            Some(target) => ToOne::Loaded(target.clone()),
            None => ToOne::Empty,
        };
        self.put_to_one(relation, slot)
    }

    /// Returns the collection behind a to-many relation.
    ///
    /// The collection is a shared handle: mutating it changes this entity's
    /// relation state.
    pub fn many(&self, relation: &str) -> Result<LazyCollection> {
        let state = self.state.borrow();
        match state.relations.get(relation) {
            Some(RelationSlot::Many(collection)) => Ok(collection.clone()),
            Some(RelationSlot::One(_)) => Err(err!("relation is not a collection")
                .context(Error::mapping(&state.metadata.name, relation))),
            None => Err(unknown_relation(&state.metadata.name, relation)),
        }
    }

    /// Replaces the contents of a to-many relation.
    pub fn set_many(&self, relation: &str, items: impl IntoIterator<Item = Entity>) -> Result<()> {
        let metadata = self.relation(relation)?;
        let Some(kind) = metadata.collection else {
            return Err(err!("relation is not a collection")
                .context(Error::mapping(self.name(), relation)));
        };

        let collection = LazyCollection::loaded(kind, items.into_iter().collect());
        self.put_collection(relation, collection)
    }

    pub(crate) fn name(&self) -> String {
        self.state.borrow().metadata.name.clone()
    }

    pub(crate) fn address(&self) -> EntityAddress {
        ByAddress(self.state.clone())
    }

    pub(crate) fn relation(&self, name: &str) -> Result<RelationMetadata> {
        let state = self.state.borrow();
        state
            .metadata
            .relation(name)
            .cloned()
            .ok_or_else(|| unknown_relation(&state.metadata.name, name))
    }

    /// Assigns freshly read column values, populating every mapped field.
    pub(crate) fn hydrate(&self, attributes: IndexMap<String, Value>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let metadata = state.metadata.clone();

        for field in metadata.fields() {
            if let Some(value) = attributes.get(&field.column) {
                state.values[field.index] = field.coerce(&metadata.name, value.clone())?;
            }
        }

        state.attributes = attributes;
        Ok(())
    }

    pub(crate) fn set_id(&self, id: Value) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let field = state.metadata.primary_key().clone();
        let id = field.coerce(&state.metadata.name, id)?;

        state.attributes.insert(field.column.clone(), id.clone());
        state.values[field.index] = id;
        Ok(())
    }

    /// Field values by column, in declaration order.
    pub(crate) fn column_values(&self) -> Vec<(FieldMetadata, Value)> {
        let state = self.state.borrow();
        state
            .metadata
            .fields()
            .iter()
            .map(|field| (field.clone(), state.values[field.index].clone()))
            .collect()
    }

    /// Writes a foreign key to the attribute bag and to any field mapped to
    /// the same column.
    pub(crate) fn write_foreign_key(&self, column: &str, value: Value) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let metadata = state.metadata.clone();

        let value = match metadata.field_by_column(column) {
            Some(field) => {
                let value = field.coerce(&metadata.name, value)?;
                state.values[field.index] = value.clone();
                value
            }
            None => value,
        };

        state.attributes.insert(column.to_string(), value);
        Ok(())
    }

    /// The state of a to-one relation, without loading it.
    pub fn one_state(&self, relation: &str) -> Result<ToOne> {
        let state = self.state.borrow();
        match state.relations.get(relation) {
            Some(RelationSlot::One(slot)) => Ok(slot.clone()),
            Some(RelationSlot::Many(_)) => Err(self.not_to_one_in(&state, relation)),
            None => Err(unknown_relation(&state.metadata.name, relation)),
        }
    }

    pub(crate) fn put_to_one(&self, relation: &str, slot: ToOne) -> Result<()> {
        self.put_slot(relation, RelationSlot::One(slot))
    }

    pub(crate) fn put_collection(&self, relation: &str, collection: LazyCollection) -> Result<()> {
        self.put_slot(relation, RelationSlot::Many(collection))
    }

    fn put_slot(&self, relation: &str, slot: RelationSlot) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let name = state.metadata.name.clone();
        match state.relations.get_mut(relation) {
            Some(current) => {
                *current = slot;
                Ok(())
            }
            None => Err(unknown_relation(&name, relation)),
        }
    }

    pub(crate) fn mark_removed(&self) {
        self.state.borrow_mut().removed = true;
    }

    fn not_to_one(&self, relation: &str) -> Error {
        self.not_to_one_in(&self.state.borrow(), relation)
    }

    fn not_to_one_in(&self, state: &EntityState, relation: &str) -> Error {
        err!("relation is not to-one").context(Error::mapping(&state.metadata.name, relation))
    }
}

impl EntityState {
    fn field(&self, name: &str) -> Result<&FieldMetadata> {
        self.metadata.field(name).ok_or_else(|| {
            err!("no such field").context(Error::mapping(&self.metadata.name, name))
        })
    }
}

fn unknown_relation(entity: &str, relation: &str) -> Error {
    Error::configuration(format!("`{entity}` has no relation `{relation}`"))
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(state) = self.state.try_borrow() else {
            return write!(fmt, "<entity in use>");
        };

        let mut s = fmt.debug_struct(&state.metadata.name);
        for field in state.metadata.fields() {
            s.field(&field.name, &state.values[field.index]);
        }
        for (name, slot) in &state.relations {
            match slot {
                RelationSlot::One(one) => s.field(name, one),
                RelationSlot::Many(many) => s.field(name, many),
            };
        }
        if state.removed {
            s.field("removed", &true);
        }
        s.finish()
    }
}

/// Short form used when an entity appears inside another entity's debug
/// output: `User(1)`.
pub(crate) struct EntityRef<'a>(pub(crate) &'a Entity);

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => {
                let id = &state.values[state.metadata.primary_key().index];
                write!(fmt, "{}({})", state.metadata.name, id)
            }
            Err(_) => write!(fmt, "<entity in use>"),
        }
    }
}
