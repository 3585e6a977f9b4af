use super::{
    filter::{Filters, Qualify},
    Comma, Formatter, Params, ToSql,
};

use crate::{
    query::is_qualified,
    stmt::{Count, Delete, Insert, Lookup, RecursiveIds, Select, Statement, Update},
    Direction, JoinClause, QuerySpec,
};
use strata_core::stmt::Value;

impl ToSql for String {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        f.dst.push_str(&self);
    }
}

impl ToSql for Statement<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Count(stmt) => stmt.to_sql(f),
            Statement::RecursiveIds(stmt) => stmt.to_sql(f),
            Statement::Lookup(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
        }
    }
}

/// `FROM <table> AS <alias>`, the joins and the filters of a query spec.
struct Source<'a>(&'a QuerySpec);

impl ToSql for Source<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let spec = self.0;
        let table = &spec.table;
        let alias = &spec.alias;

        fmt!(f, "FROM " table " AS " alias);

        for join in &spec.joins {
            join.to_sql(f);
        }

        Filters {
            clauses: &spec.filters,
            qualify: Qualify::Alias(alias),
        }
        .to_sql(f);
    }
}

impl ToSql for &JoinClause {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;
        let alias = &self.alias;
        let left = &self.left;
        let right = &self.right;

        fmt!(f, " " self.ty.as_sql() " " table " AS " alias " ON " left " " self.operator.as_sql() " " right);
    }
}

/// A group or sort column, qualified with the root alias unless it names a
/// select alias, is already qualified or is an expression.
fn sort_column(spec: &QuerySpec, select_aliases: &[&str], column: &str) -> String {
    if is_qualified(column) || select_aliases.contains(&column) {
        column.to_string()
    } else {
        spec.qualify(column)
    }
}

fn select_aliases(columns: &[String]) -> Vec<&str> {
    columns
        .iter()
        .filter_map(|column| {
            let upper = column.to_ascii_uppercase();
            upper.rfind(" AS ").map(|pos| column[pos + 4..].trim())
        })
        .collect()
}

struct GroupBy<'a> {
    spec: &'a QuerySpec,
    select_aliases: &'a [&'a str],
}

impl ToSql for GroupBy<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let spec = self.spec;
        if spec.group_by.is_empty() {
            return;
        }

        let columns = spec
            .group_by
            .iter()
            .map(|column| sort_column(spec, self.select_aliases, column));

        fmt!(f, " GROUP BY " Comma(columns));
    }
}

struct SortKey(String, Direction);

impl ToSql for SortKey {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.0 " " self.1.as_sql());
    }
}

impl ToSql for Select<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let spec = self.spec;
        let aliases = select_aliases(self.columns);

        fmt!(f, "SELECT " Comma(self.columns) " " Source(spec));

        GroupBy {
            spec,
            select_aliases: &aliases,
        }
        .to_sql(f);

        if !spec.order_by.is_empty() {
            let keys = spec.order_by.iter().map(|order_by| {
                SortKey(
                    sort_column(spec, &aliases, &order_by.column),
                    order_by.direction,
                )
            });

            fmt!(f, " ORDER BY " Comma(keys));
        }

        if let Some(limit) = spec.limit {
            fmt!(f, " LIMIT " limit);
        }

        if let Some(offset) = spec.offset {
            fmt!(f, " OFFSET " offset);
        }
    }
}

impl ToSql for Count<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let spec = self.spec;

        if spec.group_by.is_empty() {
            let primary_key = spec.qualify(self.primary_key);
            fmt!(f, "SELECT COUNT(DISTINCT " primary_key ") AS count " Source(spec));
        } else {
            fmt!(f, "SELECT COUNT(*) AS count FROM (SELECT 1 " Source(spec));
            GroupBy {
                spec,
                select_aliases: &[],
            }
            .to_sql(f);
            fmt!(f, ") AS count_subquery");
        }
    }
}

impl ToSql for RecursiveIds<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let spec = self.spec;
        let table = &spec.table;
        let cte = format!("{table}_cte");
        let cte = &cte;
        let primary_key = self.primary_key;
        let parent = self.parent_column;

        fmt!(f, "WITH RECURSIVE " cte " AS (SELECT * FROM " table " AS anchor");

        Filters {
            clauses: &spec.filters,
            qualify: Qualify::Realias {
                from: &spec.alias,
                to: "anchor",
            },
        }
        .to_sql(f);

        fmt!(
            f, " UNION SELECT t.* FROM " table " t JOIN " cte " ON t." parent " = " cte "." primary_key
            ") SELECT " primary_key " FROM " cte
        );
    }
}

impl ToSql for &Lookup {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;

        fmt!(f, "SELECT " Comma(&self.columns) " FROM " table);

        Filters {
            clauses: &self.filters,
            qualify: Qualify::None,
        }
        .to_sql(f);
    }
}

struct ValuesRow<'a>(&'a [Value]);

impl ToSql for ValuesRow<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0) ")");
    }
}

impl ToSql for &Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;

        if self.columns.is_empty() {
            fmt!(f, "INSERT INTO " table " DEFAULT VALUES");
            return;
        }

        let rows = self.rows.iter().map(|row| ValuesRow(row));
        fmt!(f, "INSERT INTO " table " (" Comma(&self.columns) ") VALUES " Comma(rows));
    }
}

struct Assignment<'a>(&'a str, &'a Value);

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, self.0 " = " self.1);
    }
}

impl ToSql for &Update {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;
        let assignments = self
            .assignments
            .iter()
            .map(|(column, value)| Assignment(column, value));

        fmt!(f, "UPDATE " table " SET " Comma(assignments));

        Filters {
            clauses: &self.filters,
            qualify: Qualify::None,
        }
        .to_sql(f);
    }
}

impl ToSql for &Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;

        fmt!(f, "DELETE FROM " table);

        Filters {
            clauses: &self.filters,
            qualify: Qualify::None,
        }
        .to_sql(f);
    }
}
