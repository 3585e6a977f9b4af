use crate::{entity::EntityRef, Db, Entity, Query, Result};

use strata_core::{
    schema::{CollectionKind, EntityMetadata, Pivot},
    stmt::Value,
};
use strata_sql::{JoinType, Operator};

use std::{cell::RefCell, fmt, rc::Rc, sync::Arc};

/// The to-many side of a relation.
///
/// Contents are read from the database the first time any operation needs
/// them; after that the collection is purely in memory until the owning
/// entity is saved. Cloning shares the same underlying collection.
#[derive(Clone)]
pub struct LazyCollection {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    kind: CollectionKind,
    state: State,
}

enum State {
    Loaded(Vec<Entity>),
    Unloaded(CollectionLoader),
}

/// Reads the members of a collection that has not been loaded.
#[derive(Clone)]
pub(crate) struct CollectionLoader {
    pub(crate) db: Db,
    pub(crate) target: Arc<EntityMetadata>,

    /// Name of the relation on the owner
    pub(crate) relation: String,

    /// Primary key of the owning entity
    pub(crate) owner: Value,

    pub(crate) source: Source,
}

#[derive(Clone, Debug)]
pub(crate) enum Source {
    /// Members carry the owner's key in this column.
    ForeignKey(String),

    /// Members are linked through a join table.
    Pivot(Pivot),
}

impl LazyCollection {
    pub(crate) fn loaded(kind: CollectionKind, items: Vec<Entity>) -> LazyCollection {
        LazyCollection::from_state(kind, State::Loaded(dedup(kind, items)))
    }

    pub(crate) fn unloaded(kind: CollectionKind, loader: CollectionLoader) -> LazyCollection {
        LazyCollection::from_state(kind, State::Unloaded(loader))
    }

    fn from_state(kind: CollectionKind, state: State) -> LazyCollection {
        LazyCollection {
            inner: Rc::new(RefCell::new(Inner { kind, state })),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.inner.borrow().kind
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.inner.borrow().state, State::Loaded(_))
    }

    pub fn len(&self) -> Result<usize> {
        self.with_items(|items| items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_items(|items| items.is_empty())
    }

    /// A snapshot of the members.
    pub fn to_vec(&self) -> Result<Vec<Entity>> {
        self.with_items(|items| items.to_vec())
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<Entity>> {
        Ok(self.to_vec()?.into_iter())
    }

    pub fn get(&self, index: usize) -> Result<Option<Entity>> {
        self.with_items(|items| items.get(index).cloned())
    }

    /// Whether `entity` is a member, by primary key or by identity for
    /// unsaved entities.
    pub fn contains(&self, entity: &Entity) -> Result<bool> {
        self.with_items(|items| contains(items, entity))
    }

    /// Adds `entity`. A set ignores entities it already holds; returns
    /// whether the entity was added.
    pub fn push(&self, entity: Entity) -> Result<bool> {
        let kind = self.kind();
        self.with_items_mut(|items| {
            if kind == CollectionKind::Set && contains(items, &entity) {
                return false;
            }
            items.push(entity);
            true
        })
    }

    /// Removes every occurrence of `entity`; returns whether any was found.
    pub fn remove(&self, entity: &Entity) -> Result<bool> {
        self.with_items_mut(|items| {
            let before = items.len();
            items.retain(|item| !same_member(item, entity));
            items.len() != before
        })
    }

    /// Keeps the members for which `f` returns true.
    ///
    /// `f` runs against a snapshot, so it may read this collection.
    pub fn retain(&self, mut f: impl FnMut(&Entity) -> bool) -> Result<()> {
        let mut items = self.to_vec()?;
        items.retain(|item| f(item));
        self.inner.borrow_mut().state = State::Loaded(items);
        Ok(())
    }

    /// Empties the collection without reading it first.
    pub fn clear(&self) {
        self.inner.borrow_mut().state = State::Loaded(vec![]);
    }

    /// The members, if the collection has been loaded or replaced.
    pub(crate) fn loaded_items(&self) -> Option<Vec<Entity>> {
        match &self.inner.borrow().state {
            State::Loaded(items) => Some(items.clone()),
            State::Unloaded(_) => None,
        }
    }

    /// Appends a member read from a result row, skipping keys already
    /// present. Does nothing on an unloaded collection.
    pub(crate) fn push_unique(&self, entity: Entity) {
        if let State::Loaded(items) = &mut self.inner.borrow_mut().state {
            if !contains(items, &entity) {
                items.push(entity);
            }
        }
    }

    fn with_items<R>(&self, f: impl FnOnce(&[Entity]) -> R) -> Result<R> {
        self.ensure_loaded()?;
        match &self.inner.borrow().state {
            State::Loaded(items) => Ok(f(items)),
            State::Unloaded(_) => unreachable!(),
        }
    }

    fn with_items_mut<R>(&self, f: impl FnOnce(&mut Vec<Entity>) -> R) -> Result<R> {
        self.ensure_loaded()?;
        match &mut self.inner.borrow_mut().state {
            State::Loaded(items) => Ok(f(items)),
            State::Unloaded(_) => unreachable!(),
        }
    }

    fn ensure_loaded(&self) -> Result<()> {
        let loader = match &self.inner.borrow().state {
            State::Loaded(_) => return Ok(()),
            State::Unloaded(loader) => loader.clone(),
        };

        let items = loader.load()?;
        let kind = self.kind();
        self.inner.borrow_mut().state = State::Loaded(dedup(kind, items));
        Ok(())
    }
}

impl CollectionLoader {
    fn load(&self) -> Result<Vec<Entity>> {
        if self.owner.is_null() {
            return Ok(vec![]);
        }

        tracing::trace!(
            entity = %self.target.name,
            relation = %self.relation,
            owner = %self.owner,
            "loading lazy collection"
        );

        let query = Query::new(&self.db, self.target.clone()).disable_recursion();

        let query = match &self.source {
            Source::ForeignKey(column) => query.filter(column, Operator::Eq, self.owner.clone()),
            Source::Pivot(pivot) => {
                let alias = format!("{}_pivot", self.relation);
                let target_key = query.spec().qualify(self.target.primary_key_column());

                query
                    .join(
                        JoinType::Join,
                        &pivot.table,
                        &alias,
                        format!("{alias}.{}", pivot.target_column),
                        Operator::Eq,
                        target_key,
                    )
                    .filter(
                        format!("{alias}.{}", pivot.owner_column),
                        Operator::Eq,
                        self.owner.clone(),
                    )
            }
        };

        query.get()
    }
}

fn dedup(kind: CollectionKind, items: Vec<Entity>) -> Vec<Entity> {
    if kind == CollectionKind::List {
        return items;
    }

    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !contains(&unique, &item) {
            unique.push(item);
        }
    }
    unique
}

fn contains(items: &[Entity], entity: &Entity) -> bool {
    items.iter().any(|item| same_member(item, entity))
}

/// Members match by primary key once saved, otherwise by identity.
fn same_member(a: &Entity, b: &Entity) -> bool {
    if a.same(b) {
        return true;
    }

    let (a_id, b_id) = (a.id(), b.id());
    a.model() == b.model() && !a_id.is_null() && a_id == b_id
}

impl fmt::Debug for LazyCollection {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(inner) = self.inner.try_borrow() else {
            return write!(fmt, "<collection in use>");
        };

        match &inner.state {
            State::Loaded(items) => fmt.debug_list().entries(items.iter().map(EntityRef)).finish(),
            State::Unloaded(loader) => write!(fmt, "<not loaded: {}>", loader.target.name),
        }
    }
}
