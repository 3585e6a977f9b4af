use crate::QuerySpec;

/// `SELECT` over a query spec whose joins have been resolved.
#[derive(Debug)]
pub struct Select<'a> {
    pub spec: &'a QuerySpec,
    pub columns: &'a [String],
}

/// Row count of a query spec.
#[derive(Debug)]
pub struct Count<'a> {
    pub spec: &'a QuerySpec,
    pub primary_key: &'a str,
}

/// Primary keys of every row reachable from the rows matching `spec`'s
/// filters by following `parent_column` downwards.
#[derive(Debug)]
pub struct RecursiveIds<'a> {
    pub spec: &'a QuerySpec,
    pub primary_key: &'a str,
    pub parent_column: &'a str,
}
