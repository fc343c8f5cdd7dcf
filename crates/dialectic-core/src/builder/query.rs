//! Fluent SELECT specification builder.

use std::fmt;
use std::marker::PhantomData;

use super::expr::{col, exists, not_exists, Condition};
use super::window::WindowBuilder;
use crate::error::{Error, Result};
use crate::predicate::{ColumnRef, Scope, Subquery};
use crate::schema::{Entity, EntityDescriptor};
use crate::spec::{
    validate_set_operand, AggregateFunction, AggregateSpec, CteBody, CteSpec, JoinKind, JoinSpec,
    OrderKey, ProjectedColumn, Projection, QuerySpec, SetOpKind, SetOperation, Shape, Source,
    WindowFunction,
};

#[derive(Debug, Clone)]
struct Include {
    alias: String,
    descriptor: &'static EntityDescriptor,
}

/// Accumulates a [`QuerySpec`] for the entity `E`.
///
/// Every call that can fail returns `Result<Self>`, so an invalid column,
/// negative page size or incompatible set operand is reported at the call
/// that introduced it.
pub struct QueryBuilder<E> {
    spec: QuerySpec,
    includes: Vec<Include>,
    last_include: Option<usize>,
    selected: bool,
    group_columns: Vec<ProjectedColumn>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for QueryBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<E> Clone for QueryBuilder<E> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            includes: self.includes.clone(),
            last_include: self.last_include,
            selected: self.selected,
            group_columns: self.group_columns.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Default for QueryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> QueryBuilder<E> {
    /// Starts an empty specification over `E`'s table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: QuerySpec::new(Source::Table(E::descriptor().table().to_string())),
            includes: vec![],
            last_include: None,
            selected: false,
            group_columns: vec![],
            _entity: PhantomData,
        }
    }

    fn scope(&self) -> Scope<'_> {
        self.includes
            .iter()
            .fold(Scope::new(E::descriptor()), |scope, inc| {
                scope.with_join(&inc.alias, inc.descriptor)
            })
    }

    pub(super) fn resolve(&self, name: &str) -> Result<ProjectedColumn> {
        let (column, descriptor) = self.scope().resolve(name)?;
        Ok(ProjectedColumn::new(column, Some(descriptor.column_type)))
    }

    fn is_output_alias(&self, name: &str) -> bool {
        self.spec.aggregates.iter().any(|a| a.alias == name)
            || self.spec.windows.iter().any(|w| w.alias == name)
    }

    fn order_key(&self, name: &str) -> Result<ColumnRef> {
        if self.is_output_alias(name) {
            return Ok(ColumnRef::new(name));
        }
        Ok(self.resolve(name)?.column)
    }

    /// Adds a WHERE condition, combined with earlier ones by AND.
    ///
    /// # Errors
    ///
    /// Returns the compiler's error if the condition is invalid for `E`.
    pub fn filter(mut self, condition: impl Into<Condition>) -> Result<Self> {
        let predicate = self.scope().compile(&condition.into())?;
        self.spec.filter = Some(match self.spec.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        Ok(self)
    }

    /// `WHERE EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::filter`].
    pub fn where_exists(self, subquery: impl Into<Subquery>) -> Result<Self> {
        self.filter(exists(subquery))
    }

    /// `WHERE NOT EXISTS (subquery)`.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::filter`].
    pub fn where_not_exists(self, subquery: impl Into<Subquery>) -> Result<Self> {
        self.filter(not_exists(subquery))
    }

    /// `WHERE column IN (nested specification)`.
    ///
    /// The nested specification is rendered with the outer dialect and its
    /// parameters are numbered after the outer ones that precede it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] for an unknown column.
    pub fn where_in(self, column: &str, subquery: QuerySpec) -> Result<Self> {
        self.filter(col(column).in_subquery(subquery))
    }

    /// `WHERE column IN (raw SQL)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] for an unknown column.
    pub fn where_in_raw(self, column: &str, sql: &str) -> Result<Self> {
        self.filter(col(column).in_subquery(sql))
    }

    /// Sets the primary ascending sort key, replacing any earlier ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] if `column` is neither a column in
    /// scope nor an aggregate or window alias.
    pub fn order_by(mut self, column: &str) -> Result<Self> {
        self.spec.order_by = vec![OrderKey::asc(self.order_key(column)?)];
        Ok(self)
    }

    /// Sets the primary descending sort key.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::order_by`].
    pub fn order_by_desc(mut self, column: &str) -> Result<Self> {
        self.spec.order_by = vec![OrderKey::desc(self.order_key(column)?)];
        Ok(self)
    }

    fn then(mut self, column: &str, descending: bool) -> Result<Self> {
        if self.spec.order_by.is_empty() {
            return Err(Error::unsupported("then_by without order_by"));
        }
        let key = self.order_key(column)?;
        self.spec.order_by.push(OrderKey {
            column: key,
            descending,
        });
        Ok(self)
    }

    /// Appends an ascending secondary sort key.
    ///
    /// # Errors
    ///
    /// Fails if no primary key was set, or for an unknown column.
    pub fn then_by(self, column: &str) -> Result<Self> {
        self.then(column, false)
    }

    /// Appends a descending secondary sort key.
    ///
    /// # Errors
    ///
    /// Fails if no primary key was set, or for an unknown column.
    pub fn then_by_desc(self, column: &str) -> Result<Self> {
        self.then(column, true)
    }

    /// Skips `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPagination`] for a negative count.
    pub fn skip(mut self, rows: i64) -> Result<Self> {
        self.spec.skip = Some(non_negative("skip", rows)?);
        Ok(self)
    }

    /// Returns at most `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPagination`] for a negative count.
    pub fn take(mut self, rows: i64) -> Result<Self> {
        self.spec.take = Some(non_negative("take", rows)?);
        Ok(self)
    }

    /// Replaces the default projection with explicit columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] for an unknown column.
    pub fn select(mut self, columns: &[&str]) -> Result<Self> {
        let projected = columns
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<Vec<_>>>()?;
        self.spec.projection = Projection::Columns(projected);
        self.selected = true;
        Ok(self)
    }

    /// `SELECT DISTINCT`.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.spec.distinct = true;
        self
    }

    /// Adds GROUP BY columns. Without an explicit `select`, a grouped
    /// query projects its grouping columns followed by its aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] for an unknown column.
    pub fn group_by(mut self, columns: &[&str]) -> Result<Self> {
        for name in columns {
            let projected = self.resolve(name)?;
            self.spec.group_by.push(projected.column.clone());
            self.group_columns.push(projected);
        }
        Ok(self)
    }

    /// Adds an aggregate output column. `column` is `None` for `*`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown column, a non-numeric argument to SUM or AVG,
    /// or a function that needs an argument but got `*`.
    pub fn aggregate(
        mut self,
        function: AggregateFunction,
        column: Option<&str>,
        alias: &str,
    ) -> Result<Self> {
        let (column, input) = match column {
            Some(name) => {
                let projected = self.resolve(name)?;
                check_aggregate_input(function, &projected)?;
                (Some(projected.column), projected.column_type)
            }
            None if function == AggregateFunction::Count => (None, None),
            None => {
                return Err(Error::unsupported(format!("{}(*)", function.as_sql())));
            }
        };
        self.spec.aggregates.push(AggregateSpec {
            function,
            column,
            alias: String::from(alias),
            result_type: function.result_type(input),
        });
        Ok(self)
    }

    /// `COUNT(*) AS alias`.
    #[must_use]
    pub fn count(mut self, alias: &str) -> Self {
        self.spec.aggregates.push(AggregateSpec {
            function: AggregateFunction::Count,
            column: None,
            alias: String::from(alias),
            result_type: AggregateFunction::Count.result_type(None),
        });
        self
    }

    /// LEFT JOINs the target of one of `E`'s relations and projects its
    /// columns as `{relation}_{column}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] for an unknown relation or key.
    pub fn include(self, relation: &str) -> Result<Self> {
        let parent = self.spec.source.name().to_string();
        self.add_include(parent, E::descriptor(), relation)
    }

    /// Includes a relation of the most recently included entity.
    ///
    /// # Errors
    ///
    /// Fails when nothing was included yet, or for an unknown relation.
    pub fn then_include(self, relation: &str) -> Result<Self> {
        let Some(index) = self.last_include else {
            return Err(Error::unsupported("then_include without include"));
        };
        let parent = &self.includes[index];
        let (alias, descriptor) = (parent.alias.clone(), parent.descriptor);
        self.add_include(alias, descriptor, relation)
    }

    fn add_include(
        mut self,
        parent: String,
        parent_descriptor: &'static EntityDescriptor,
        relation: &str,
    ) -> Result<Self> {
        let relation = parent_descriptor.require_relation(relation)?;
        if let Some(index) = self.includes.iter().position(|i| i.alias == relation.name) {
            self.last_include = Some(index);
            return Ok(self);
        }
        let target = (relation.target)();
        parent_descriptor.require_column(&relation.local_key)?;
        target.require_column(&relation.foreign_key)?;

        let alias = relation.name.clone();
        let columns = target
            .columns()
            .iter()
            .map(|c| ProjectedColumn {
                column: ColumnRef::qualified(alias.clone(), c.name.clone()),
                alias: Some(format!("{alias}_{}", c.name)),
                column_type: Some(c.column_type),
            })
            .collect();
        self.spec.joins.push(JoinSpec {
            kind: JoinKind::Left,
            table: target.table().to_string(),
            alias: alias.clone(),
            left_column: ColumnRef::qualified(parent, relation.local_key.clone()),
            right_column: relation.foreign_key.clone(),
            columns,
        });
        self.includes.push(Include {
            alias,
            descriptor: target,
        });
        self.last_include = Some(self.includes.len() - 1);
        Ok(self)
    }

    /// Starts a window column; finish it with
    /// [`WindowBuilder::end_window`].
    #[must_use]
    pub fn with_window_function(self, function: WindowFunction, alias: &str) -> WindowBuilder<E> {
        WindowBuilder::new(self, function, alias)
    }

    pub(super) fn push_window(mut self, window: crate::spec::WindowSpec) -> Self {
        self.spec.windows.push(window);
        self
    }

    fn push_cte(mut self, cte: CteSpec) -> Result<Self> {
        if self.spec.ctes.iter().any(|c| c.name == cte.name) {
            return Err(Error::unsupported(format!("duplicate CTE `{}`", cte.name)));
        }
        self.spec.ctes.push(cte);
        Ok(self)
    }

    /// Registers a common table expression.
    ///
    /// # Errors
    ///
    /// Fails if a CTE with the same name is already registered.
    pub fn with_cte(self, name: &str, body: impl Into<CteBody>) -> Result<Self> {
        self.push_cte(CteSpec {
            name: String::from(name),
            columns: vec![],
            body: body.into(),
            recursive: None,
        })
    }

    /// Registers a recursive CTE: `anchor UNION ALL recursive`.
    ///
    /// # Errors
    ///
    /// Fails if a CTE with the same name is already registered.
    pub fn with_recursive_cte(
        self,
        name: &str,
        columns: &[&str],
        anchor: impl Into<CteBody>,
        recursive: impl Into<CteBody>,
    ) -> Result<Self> {
        self.push_cte(CteSpec {
            name: String::from(name),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            body: anchor.into(),
            recursive: Some(recursive.into()),
        })
    }

    /// Selects from a registered CTE instead of `E`'s table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] if no CTE has that name.
    pub fn from_cte(mut self, name: &str) -> Result<Self> {
        if !self.spec.ctes.iter().any(|c| c.name == name) {
            return Err(Error::unknown_member(E::descriptor().table(), name));
        }
        self.spec.source = Source::Cte(String::from(name));
        Ok(self)
    }

    fn set_operation(mut self, kind: SetOpKind, right: QuerySpec) -> Result<Self> {
        validate_set_operand(&right)?;
        if let (Some(left), Some(right)) = (self.shape(), right.shape()) {
            if !left.is_compatible_with(&right) {
                return Err(Error::IncompatibleProjection {
                    left: left.to_string(),
                    right: right.to_string(),
                });
            }
        }
        self.spec.set_op_tail_mut().set_op = Some(SetOperation {
            kind,
            right: Box::new(right),
        });
        Ok(self)
    }

    /// `UNION` with another specification.
    ///
    /// A later set operation combines with the right side of the previous
    /// one: `a.union(b)?.intersect(c)?` is `a UNION (b INTERSECT c)`, rendered
    /// with the inner operation as a derived table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleProjection`] or
    /// [`Error::InvalidSetOperand`].
    pub fn union(self, right: QuerySpec) -> Result<Self> {
        self.set_operation(SetOpKind::Union, right)
    }

    /// `UNION ALL` with another specification.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::union`].
    pub fn union_all(self, right: QuerySpec) -> Result<Self> {
        self.set_operation(SetOpKind::UnionAll, right)
    }

    /// `INTERSECT` with another specification.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::union`].
    pub fn intersect(self, right: QuerySpec) -> Result<Self> {
        self.set_operation(SetOpKind::Intersect, right)
    }

    /// `EXCEPT` with another specification.
    ///
    /// # Errors
    ///
    /// See [`QueryBuilder::union`].
    pub fn except(self, right: QuerySpec) -> Result<Self> {
        self.set_operation(SetOpKind::Except, right)
    }

    fn projection(&self) -> Projection {
        if self.selected {
            return self.spec.projection.clone();
        }
        if !self.spec.aggregates.is_empty() {
            return Projection::Columns(self.group_columns.clone());
        }
        match self.spec.source {
            Source::Cte(_) => Projection::Star,
            Source::Table(_) => Projection::Columns(
                E::descriptor()
                    .columns()
                    .iter()
                    .map(|c| {
                        ProjectedColumn::new(ColumnRef::new(c.name.clone()), Some(c.column_type))
                    })
                    .collect(),
            ),
        }
    }

    fn shape(&self) -> Option<Shape> {
        let mut spec = QuerySpec::new(self.spec.source.clone());
        spec.projection = self.projection();
        spec.joins.clone_from(&self.spec.joins);
        spec.windows.clone_from(&self.spec.windows);
        spec.aggregates.clone_from(&self.spec.aggregates);
        spec.shape()
    }

    /// Finishes the specification.
    #[must_use]
    pub fn build(mut self) -> QuerySpec {
        self.spec.projection = self.projection();
        self.spec
    }
}

fn non_negative(clause: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidPagination { clause, value })
}

pub(super) fn check_aggregate_input(
    function: AggregateFunction,
    input: &ProjectedColumn,
) -> Result<()> {
    let numeric_only = matches!(function, AggregateFunction::Sum | AggregateFunction::Avg);
    match input.column_type {
        Some(ty) if numeric_only && !ty.is_numeric() => Err(Error::TypeMismatch {
            column: input.column.to_string(),
            expected: String::from("numeric"),
            found: String::from(ty.as_str()),
        }),
        _ => Ok(()),
    }
}
