use strata_core::{
    schema::{EntityMetadata, ModelId, RelationType},
    stmt::Value,
    Error, Result,
};

use std::str::FromStr;

/// A fluent select over one root entity, before SQL generation.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub model: ModelId,
    pub table: String,
    pub alias: String,

    /// Explicit select list. Empty selects every mapped column.
    pub columns: Vec<String>,

    pub filters: Vec<WhereClause>,
    pub joins: Vec<JoinClause>,
    pub group_by: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,

    /// Relations of the root entity to load eagerly
    pub with: Vec<String>,

    /// Resolve self-referential eager relations with a recursive query
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub conjunction: Conjunction,
    pub column: String,
    pub operator: Operator,

    /// Compared value. `IN`, `NOT IN` and `BETWEEN` take a [`Value::List`].
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,

    /// `column BETWEEN low AND high`, with a two element [`Value::List`]
    Between,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub ty: JoinType,
    pub table: String,
    pub alias: String,
    pub left: String,
    pub operator: Operator,
    pub right: String,

    /// Set when the join was derived from a relation of the root entity
    pub relation: Option<JoinRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRelation {
    pub name: String,
    pub target: ModelId,
    pub ty: RelationType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Join,
    Left,
    Right,
    Inner,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl QuerySpec {
    pub fn new(metadata: &EntityMetadata, alias: impl Into<String>) -> QuerySpec {
        QuerySpec {
            model: metadata.id,
            table: metadata.table_name.clone(),
            alias: alias.into(),
            columns: vec![],
            filters: vec![],
            joins: vec![],
            group_by: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            with: vec![],
            recursive: true,
        }
    }

    pub fn push_filter(
        &mut self,
        conjunction: Conjunction,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) {
        self.filters.push(WhereClause {
            conjunction,
            column: column.into(),
            operator,
            value: value.into(),
        });
    }

    /// Prefixes `column` with the root alias unless it is already qualified
    /// or is an expression.
    pub fn qualify(&self, column: &str) -> String {
        if is_qualified(column) {
            column.to_string()
        } else {
            format!("{}.{}", self.alias, column)
        }
    }

    /// Joins derived from relations of the root entity, in join order.
    pub fn relation_joins(&self) -> impl Iterator<Item = (&JoinClause, &JoinRelation)> {
        self.joins
            .iter()
            .filter_map(|join| join.relation.as_ref().map(|relation| (join, relation)))
    }

    pub fn has_relation_join(&self, name: &str) -> bool {
        self.relation_joins()
            .any(|(_, relation)| relation.name == name)
    }
}

pub(crate) fn is_qualified(column: &str) -> bool {
    column.contains('.') || column.contains('(')
}

impl WhereClause {
    pub fn new(
        conjunction: Conjunction,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> WhereClause {
        WhereClause {
            conjunction,
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// `column = value`, joined with `AND`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> WhereClause {
        WhereClause::new(Conjunction::And, column, Operator::Eq, value)
    }

    /// `column BETWEEN low AND high`, joined with `AND`.
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> WhereClause {
        WhereClause::new(
            Conjunction::And,
            column,
            Operator::Between,
            Value::List(vec![low.into(), high.into()]),
        )
    }

    /// `column IN (values)`, joined with `AND`.
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> WhereClause {
        WhereClause::new(Conjunction::And, column, Operator::In, Value::List(values))
    }
}

impl Conjunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
        }
    }

    /// Operators that bind no value.
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Operator> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");

        Ok(match normalized.to_ascii_uppercase().as_str() {
            "=" => Operator::Eq,
            "<>" | "!=" => Operator::Ne,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "IS NULL" => Operator::IsNull,
            "IS NOT NULL" => Operator::IsNotNull,
            "BETWEEN" => Operator::Between,
            _ => return Err(Error::configuration(format!("unsupported operator `{s}`"))),
        })
    }
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinType::Join => "JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Inner => "INNER JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}
