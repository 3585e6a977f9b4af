mod builder;
pub use builder::SqlBuilder;

mod prepared;
pub use prepared::PreparedQuery;

mod query;
pub use query::{
    Conjunction, Direction, JoinClause, JoinRelation, JoinType, Operator, OrderBy, QuerySpec,
    WhereClause,
};

pub mod serializer;
pub use serializer::{Params, Placeholder, Serializer};

pub mod stmt;
