use crate::{
    stmt::{Count, RecursiveIds, Select, Statement},
    JoinClause, JoinRelation, JoinType, Operator, PreparedQuery, QuerySpec, Serializer,
};

use strata_core::{
    driver,
    schema::{EntityMetadata, Registry, RelationMetadata, RelationType},
    stmt::Value,
    Error, Result,
};

/// Generates SQL for query specs, deriving joins and select lists from
/// entity metadata.
#[derive(Debug)]
pub struct SqlBuilder<'a> {
    registry: &'a Registry,
    serializer: Serializer,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(registry: &'a Registry) -> SqlBuilder<'a> {
        SqlBuilder {
            registry,
            serializer: Serializer::new(),
        }
    }

    /// Builds the `SELECT` for `spec`.
    ///
    /// Relation joins for the eager-load list are added to `spec` first, so
    /// the caller can hand the same spec to the materializer.
    pub fn build_select(&self, spec: &mut QuerySpec) -> Result<PreparedQuery> {
        check_filters(spec)?;
        self.resolve_joins(spec)?;

        let columns = if spec.columns.is_empty() {
            self.default_columns(spec)?
        } else {
            spec.columns.clone()
        };

        Ok(self.prepare(Select {
            spec,
            columns: &columns,
        }))
    }

    pub fn build_count(&self, spec: &mut QuerySpec) -> Result<PreparedQuery> {
        check_filters(spec)?;
        self.resolve_joins(spec)?;

        let root = self.registry.metadata(spec.model)?;

        Ok(self.prepare(Count {
            spec,
            primary_key: root.primary_key_column(),
        }))
    }

    /// Builds the recursive query collecting the keys of every row below the
    /// rows matched by `spec`'s filters. `parent_column` is the self
    /// referencing foreign key.
    pub fn build_recursive_ids(
        &self,
        spec: &QuerySpec,
        parent_column: &str,
    ) -> Result<PreparedQuery> {
        let root = self.registry.metadata(spec.model)?;

        Ok(self.prepare(RecursiveIds {
            spec,
            primary_key: root.primary_key_column(),
            parent_column,
        }))
    }

    /// Serializes any statement into SQL plus its named parameters.
    pub fn prepare<'s>(&self, stmt: impl Into<Statement<'s>>) -> PreparedQuery {
        let mut params = driver::Params::new();
        let sql = self.serializer.serialize(stmt, &mut params);
        PreparedQuery { sql, params }
    }

    /// Adds a join for every eager-loaded relation that has none yet.
    ///
    /// Relations pointing back at the root type are skipped: those are
    /// resolved by a recursive query instead of a self join.
    pub fn resolve_joins(&self, spec: &mut QuerySpec) -> Result<()> {
        let root = self.registry.metadata(spec.model)?;

        for name in spec.with.clone() {
            if spec.has_relation_join(&name) {
                continue;
            }

            let relation = root.relation(&name).ok_or_else(|| {
                Error::configuration(format!("`{}` has no relation `{name}`", root.name))
            })?;

            if relation.target == root.id {
                continue;
            }

            let joins = self.relation_joins(&root, spec, relation)?;
            spec.joins.extend(joins);
        }

        Ok(())
    }

    fn relation_joins(
        &self,
        root: &EntityMetadata,
        spec: &QuerySpec,
        relation: &RelationMetadata,
    ) -> Result<Vec<JoinClause>> {
        let target = self.registry.metadata(relation.target)?;
        let alias = relation.field_name.to_lowercase();
        let taken = |alias: &str| {
            alias.eq_ignore_ascii_case(&spec.alias)
                || spec
                    .joins
                    .iter()
                    .any(|join| join.alias.eq_ignore_ascii_case(alias))
        };
        if taken(&alias) {
            return Err(Error::configuration(format!(
                "alias `{alias}` of relation `{}.{}` is already used by the query",
                root.name, relation.field_name
            )));
        }

        let root_pk = format!("{}.{}", spec.alias, root.primary_key_column());
        let target_pk = format!("{alias}.{}", target.primary_key_column());

        let join = |left: String, right: String| JoinClause {
            ty: JoinType::Left,
            table: target.table_name.clone(),
            alias: alias.clone(),
            left,
            operator: Operator::Eq,
            right,
            relation: Some(JoinRelation {
                name: relation.field_name.clone(),
                target: relation.target,
                ty: relation.ty,
            }),
        };

        let joins = match relation.ty {
            RelationType::ManyToOne | RelationType::OneToOne
                if relation.is_owning_side_of_association() =>
            {
                let join_column = relation.join_column.as_deref().unwrap_or_default();
                vec![join(format!("{}.{join_column}", spec.alias), target_pk)]
            }
            RelationType::ManyToOne | RelationType::OneToOne | RelationType::OneToMany => {
                let owning = self.registry.inverse_of(relation)?;
                let Some(foreign_key) = owning.join_column else {
                    return Err(Error::configuration(format!(
                        "relation `{}.{}` is mapped by `{}`, which has no join column",
                        root.name, relation.field_name, owning.field_name
                    )));
                };
                vec![join(root_pk, format!("{alias}.{foreign_key}"))]
            }
            RelationType::ManyToMany => {
                let pivot = self.registry.pivot(relation)?;
                let pivot_alias = format!("{}_pivot", relation.field_name);

                vec![
                    JoinClause {
                        ty: JoinType::Left,
                        table: pivot.table,
                        alias: pivot_alias.clone(),
                        left: root_pk,
                        operator: Operator::Eq,
                        right: format!("{pivot_alias}.{}", pivot.owner_column),
                        relation: None,
                    },
                    join(format!("{pivot_alias}.{}", pivot.target_column), target_pk),
                ]
            }
        };

        Ok(joins)
    }

    /// `alias.col AS alias_col` for every column of the root and of each
    /// relation join, plus the join columns of owning relations that are not
    /// loaded eagerly.
    fn default_columns(&self, spec: &QuerySpec) -> Result<Vec<String>> {
        let root = self.registry.metadata(spec.model)?;
        let mut columns = vec![];

        let mut root_columns: Vec<&str> = root.fields().iter().map(|f| f.column.as_str()).collect();
        for relation in root.owning_relations() {
            let Some(join_column) = relation.join_column.as_deref() else {
                continue;
            };
            if !spec.has_relation_join(&relation.field_name) && !root_columns.contains(&join_column)
            {
                root_columns.push(join_column);
            }
        }
        push_aliased(&mut columns, &spec.alias, root_columns);

        for (join, relation) in spec.relation_joins() {
            let target = self.registry.metadata(relation.target)?;
            push_aliased(&mut columns, &join.alias, target.columns());
        }

        Ok(columns)
    }
}

fn push_aliased<'a>(
    dst: &mut Vec<String>,
    alias: &str,
    columns: impl IntoIterator<Item = &'a str>,
) {
    for column in columns {
        let item = format!("{alias}.{column} AS {alias}_{column}");
        if !dst.contains(&item) {
            dst.push(item);
        }
    }
}

fn check_filters(spec: &QuerySpec) -> Result<()> {
    for clause in &spec.filters {
        if clause.operator == Operator::Between
            && !matches!(&clause.value, Value::List(bounds) if bounds.len() == 2)
        {
            return Err(Error::configuration(format!(
                "`BETWEEN` on `{}` needs exactly two bounds",
                clause.column
            )));
        }
    }

    Ok(())
}
