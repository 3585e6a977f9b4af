use crate::{
    engine::{hierarchy, materialize},
    Db, Entity, Page, Result, TransferObject,
};

use strata_core::{
    driver::Row,
    schema::{EntityMetadata, RelationMetadata, RelationType},
    stmt::Value,
    Error,
};
use strata_sql::{
    Conjunction, Direction, JoinClause, JoinType, Operator, OrderBy, QuerySpec, WhereClause,
};

use std::sync::Arc;

/// A fluent query over one entity type.
///
/// Builder methods consume and return the query; terminal methods borrow it,
/// so a query can be run more than once.
#[derive(Debug, Clone)]
pub struct Query {
    db: Db,
    metadata: Arc<EntityMetadata>,
    spec: QuerySpec,
}

impl Query {
    pub(crate) fn new(db: &Db, metadata: Arc<EntityMetadata>) -> Query {
        let spec = QuerySpec::new(&metadata, db.alias_for(&metadata));
        Query::from_spec(db, metadata, spec)
    }

    pub(crate) fn from_spec(db: &Db, metadata: Arc<EntityMetadata>, spec: QuerySpec) -> Query {
        Query {
            db: db.clone(),
            metadata,
            spec,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn metadata(&self) -> &Arc<EntityMetadata> {
        &self.metadata
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Alias of the root table.
    pub fn alias(&self) -> &str {
        &self.spec.alias
    }

    /// Replaces the default select list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.spec
            .push_filter(Conjunction::And, column, operator, value);
        self
    }

    pub fn or_filter(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.spec.push_filter(Conjunction::Or, column, operator, value);
        self
    }

    pub fn filter_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Eq, value)
    }

    /// `column IN (values)`. An empty list matches no rows.
    pub fn filter_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, Operator::In, values)
    }

    /// `column NOT IN (values)`. An empty list matches every row.
    pub fn filter_not_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, Operator::NotIn, values)
    }

    pub fn filter_null(self, column: impl Into<String>) -> Self {
        self.filter(column, Operator::IsNull, Value::Null)
    }

    pub fn filter_not_null(self, column: impl Into<String>) -> Self {
        self.filter(column, Operator::IsNotNull, Value::Null)
    }

    /// `column BETWEEN low AND high`, both bounds inclusive.
    pub fn filter_between(
        mut self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.spec
            .filters
            .push(WhereClause::between(column, low, high));
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.spec.group_by.push(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.spec.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.spec.offset = Some(offset);
        self
    }

    /// Loads `relation` together with the root rows.
    ///
    /// A self-referential one-to-many relation is resolved as a tree unless
    /// recursion is disabled.
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        let relation = relation.into();
        if !self.spec.with.contains(&relation) {
            self.spec.with.push(relation);
        }
        self
    }

    /// Adds an explicit join. The joined table's columns are not
    /// materialized.
    pub fn join(
        mut self,
        ty: JoinType,
        table: impl Into<String>,
        alias: impl Into<String>,
        left: impl Into<String>,
        operator: Operator,
        right: impl Into<String>,
    ) -> Self {
        self.spec.joins.push(JoinClause {
            ty,
            table: table.into(),
            alias: alias.into(),
            left: left.into(),
            operator,
            right: right.into(),
            relation: None,
        });
        self
    }

    pub fn disable_recursion(mut self) -> Self {
        self.spec.recursive = false;
        self
    }

    /// Runs the query and returns the distinct root entities in row order.
    pub fn get(&self) -> Result<Vec<Entity>> {
        if let Some(children) = self.tree_relation()? {
            return hierarchy::resolve(self, &children);
        }

        if self.pages_joined_collection()? {
            return self.get_page_by_keys();
        }

        let mut spec = self.spec.clone();
        let prepared = self.db.sql().build_select(&mut spec)?;
        let rows = self.db.fetch(&prepared)?;

        materialize::materialize(&self.db, &spec, rows)
    }

    pub fn first(&self) -> Result<Option<Entity>> {
        Ok(self.clone().limit(1).get()?.into_iter().next())
    }

    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<Entity>> {
        let column = self.spec.qualify(self.metadata.primary_key_column());
        self.clone().filter_eq(column, id).first()
    }

    /// Like [`Query::find_by_id`], but a missing row is an error.
    pub fn get_by_id(&self, id: impl Into<Value>) -> Result<Entity> {
        let id = id.into();
        self.find_by_id(id.clone())?.ok_or_else(|| {
            Error::record_not_found(format!("`{}` with id {id}", self.metadata.name))
        })
    }

    /// Number of distinct root rows, or of groups when grouped.
    pub fn count(&self) -> Result<u64> {
        let mut spec = self.spec.clone();
        spec.limit = None;
        spec.offset = None;

        let prepared = self.db.sql().build_count(&mut spec)?;
        let rows = self.db.fetch(&prepared)?;

        let Some(value) = rows.into_iter().next().and_then(|row| row.get("count").cloned())
        else {
            return Ok(0);
        };

        let count = i64::try_from(value)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// Runs the select and returns the rows without materializing them.
    pub fn raw(&self) -> Result<Vec<Row>> {
        let mut spec = self.spec.clone();
        let prepared = self.db.sql().build_select(&mut spec)?;
        self.db.fetch(&prepared)
    }

    /// Returns page `page` (1-based) of `per_page` entities, with the total
    /// row count.
    ///
    /// A page past the last one is empty and costs no select.
    pub fn paginate(&self, page: u64, per_page: u64) -> Result<Page> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let total = self.count()?;
        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| *offset < total);

        let items = match offset {
            Some(offset) => self.clone().limit(per_page).offset(offset).get()?,
            None => vec![],
        };

        Ok(Page::new(items, total, per_page, page))
    }

    pub fn get_dtos<D: TransferObject>(&self) -> Result<Vec<D>> {
        self.get()?.iter().map(D::from_entity).collect()
    }

    /// The first match as a transfer object.
    pub fn find_dto<D: TransferObject>(&self) -> Result<Option<D>> {
        self.first()?.as_ref().map(D::from_entity).transpose()
    }

    /// Like [`Query::find_dto`], but no match is an error.
    pub fn get_dto<D: TransferObject>(&self) -> Result<D> {
        self.find_dto()?.ok_or_else(|| {
            Error::record_not_found(format!("no `{}` matched the query", self.metadata.name))
        })
    }

    pub fn find_dto_by_id<D: TransferObject>(&self, id: impl Into<Value>) -> Result<Option<D>> {
        self.find_by_id(id)?
            .as_ref()
            .map(D::from_entity)
            .transpose()
    }

    pub fn paginate_dtos<D: TransferObject>(&self, page: u64, per_page: u64) -> Result<Page<D>> {
        self.paginate(page, per_page)?
            .try_map(|entity| D::from_entity(&entity))
    }

    /// Restricts the query to the given primary keys.
    pub(crate) fn filter_ids(mut self, ids: Vec<Value>) -> Self {
        let column = self.spec.qualify(self.metadata.primary_key_column());
        self.spec.filters.push(WhereClause::in_list(column, ids));
        self
    }

    /// Whether a limit or offset applies to a query that joins an eager
    /// to-many relation, where it would count joined rows instead of
    /// entities.
    fn pages_joined_collection(&self) -> Result<bool> {
        if self.spec.limit.is_none() && self.spec.offset.is_none() {
            return Ok(false);
        }
        if !self.spec.group_by.is_empty() || !self.spec.columns.is_empty() {
            return Ok(false);
        }

        for name in &self.spec.with {
            let relation = self.metadata.relation(name).ok_or_else(|| {
                Error::configuration(format!("`{}` has no relation `{name}`", self.metadata.name))
            })?;

            if relation.is_collection() && relation.target != self.metadata.id {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Selects the primary keys of the requested page, then loads those
    /// entities with their eager relations and no limit.
    fn get_page_by_keys(&self) -> Result<Vec<Entity>> {
        let primary_key = self.spec.qualify(self.metadata.primary_key_column());

        let mut keys = self.spec.clone();
        keys.columns = vec![primary_key.clone()];
        keys.group_by = vec![primary_key];

        let prepared = self.db.sql().build_select(&mut keys)?;
        let ids = self
            .db
            .fetch_column(&prepared, self.metadata.primary_key_column())?;

        tracing::debug!(
            entity = %self.metadata.name,
            keys = ids.len(),
            "paged root keys"
        );

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut spec = self.spec.clone();
        spec.filters.clear();
        spec.limit = None;
        spec.offset = None;

        Query::from_spec(&self.db, self.metadata.clone(), spec)
            .filter_ids(ids)
            .get()
    }

    /// The eager relation to resolve as a tree, if any.
    fn tree_relation(&self) -> Result<Option<RelationMetadata>> {
        if !self.spec.recursive {
            return Ok(None);
        }

        for name in &self.spec.with {
            let relation = self.metadata.relation(name).ok_or_else(|| {
                Error::configuration(format!("`{}` has no relation `{name}`", self.metadata.name))
            })?;

            if relation.ty == RelationType::OneToMany && relation.target == self.metadata.id {
                return Ok(Some(relation.clone()));
            }
        }

        Ok(None)
    }
}
