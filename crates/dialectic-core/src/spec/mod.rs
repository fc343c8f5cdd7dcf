//! The query specification.
//!
//! A [`QuerySpec`] is the complete, dialect-independent description of a
//! SELECT statement. It is accumulated by [`QueryBuilder`] and consumed by
//! the renderer, which only ever borrows it. Specifications also
//! (de)serialize with serde, so they can be stored as JSON and rendered
//! later.
//!
//! [`QueryBuilder`]: crate::builder::QueryBuilder

mod mutation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::predicate::{ColumnRef, Predicate};
use crate::schema::ColumnType;

pub use mutation::{Assignment, DeleteSpec, InsertSpec, UpdateSpec};

/// Where rows come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A base table.
    Table(String),
    /// A common table expression registered on the same specification.
    Cte(String),
}

impl Source {
    /// Returns the table or CTE name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Table(name) | Self::Cte(name) => name,
        }
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedColumn {
    /// The column.
    pub column: ColumnRef,
    /// Output alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Declared type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
}

impl ProjectedColumn {
    /// Projects a column without alias.
    #[must_use]
    pub const fn new(column: ColumnRef, column_type: Option<ColumnType>) -> Self {
        Self {
            column,
            alias: None,
            column_type,
        }
    }
}

/// The SELECT list, before window and aggregate columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// `*`.
    #[default]
    Star,
    /// Explicit columns.
    Columns(Vec<ProjectedColumn>),
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    /// Sorted column or output alias.
    pub column: ColumnRef,
    /// `DESC` when true.
    #[serde(default)]
    pub descending: bool,
}

impl OrderKey {
    /// Ascending key.
    #[must_use]
    pub const fn asc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    /// Descending key.
    #[must_use]
    pub const fn desc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A joined table, normally produced by `include`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Join type.
    pub kind: JoinKind,
    /// Joined table.
    pub table: String,
    /// Alias of the joined table (the relation name).
    pub alias: String,
    /// Key on the parent side, qualified with the parent's name.
    pub left_column: ColumnRef,
    /// Key on the joined table.
    pub right_column: String,
    /// Columns of the joined table added to the projection.
    #[serde(default)]
    pub columns: Vec<ProjectedColumn>,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// `COUNT(x)` or `COUNT(*)`.
    Count,
    /// `COUNT(DISTINCT x)`.
    CountDistinct,
    /// `SUM(x)`.
    Sum,
    /// `AVG(x)`.
    Avg,
    /// `MIN(x)`.
    Min,
    /// `MAX(x)`.
    Max,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Count | Self::CountDistinct => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// Result type when the input column has type `input`.
    #[must_use]
    pub const fn result_type(self, input: Option<ColumnType>) -> Option<ColumnType> {
        match self {
            Self::Count | Self::CountDistinct => Some(ColumnType::Integer),
            Self::Avg => Some(ColumnType::Real),
            Self::Sum | Self::Min | Self::Max => input,
        }
    }
}

/// An aggregate output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    /// Function.
    pub function: AggregateFunction,
    /// Argument; `None` is `*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnRef>,
    /// Output alias.
    pub alias: String,
    /// Result type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ColumnType>,
}

/// Window functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    /// `ROW_NUMBER()`.
    RowNumber,
    /// `RANK()`.
    Rank,
    /// `DENSE_RANK()`.
    DenseRank,
    /// `NTILE(n)`.
    Ntile(u32),
    /// `LAG(column, offset)`.
    Lag {
        /// Column read from the earlier row.
        column: ColumnRef,
        /// Row distance.
        offset: u32,
    },
    /// `LEAD(column, offset)`.
    Lead {
        /// Column read from the later row.
        column: ColumnRef,
        /// Row distance.
        offset: u32,
    },
    /// `FIRST_VALUE(column)`.
    FirstValue(ColumnRef),
    /// `LAST_VALUE(column)`.
    LastValue(ColumnRef),
    /// An aggregate evaluated over the window.
    Aggregate {
        /// Function; `CountDistinct` is rejected by the builder.
        function: AggregateFunction,
        /// Argument; `None` is `*`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column: Option<ColumnRef>,
    },
}

impl WindowFunction {
    /// `LAG(column, offset)`.
    #[must_use]
    pub fn lag(column: &str, offset: u32) -> Self {
        Self::Lag {
            column: ColumnRef::new(column),
            offset,
        }
    }

    /// `LEAD(column, offset)`.
    #[must_use]
    pub fn lead(column: &str, offset: u32) -> Self {
        Self::Lead {
            column: ColumnRef::new(column),
            offset,
        }
    }

    /// `FIRST_VALUE(column)`.
    #[must_use]
    pub fn first_value(column: &str) -> Self {
        Self::FirstValue(ColumnRef::new(column))
    }

    /// `LAST_VALUE(column)`.
    #[must_use]
    pub fn last_value(column: &str) -> Self {
        Self::LastValue(ColumnRef::new(column))
    }

    /// An aggregate over the window; `None` is `*`.
    #[must_use]
    pub fn aggregate(function: AggregateFunction, column: Option<&str>) -> Self {
        Self::Aggregate {
            function,
            column: column.map(ColumnRef::new),
        }
    }

    /// Returns the SQL function name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RowNumber => "ROW_NUMBER",
            Self::Rank => "RANK",
            Self::DenseRank => "DENSE_RANK",
            Self::Ntile(_) => "NTILE",
            Self::Lag { .. } => "LAG",
            Self::Lead { .. } => "LEAD",
            Self::FirstValue(_) => "FIRST_VALUE",
            Self::LastValue(_) => "LAST_VALUE",
            Self::Aggregate { function, .. } => function.as_sql(),
        }
    }
}

/// Window frame clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFrame {
    /// No frame clause.
    #[default]
    None,
    /// `ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`.
    UnboundedPreceding,
    /// `ROWS BETWEEN CURRENT ROW AND UNBOUNDED FOLLOWING`.
    UnboundedFollowing,
    /// `ROWS BETWEEN UNBOUNDED PRECEDING AND UNBOUNDED FOLLOWING`.
    Entire,
    /// `ROWS BETWEEN n PRECEDING AND m FOLLOWING`.
    Rows {
        /// Rows before the current row.
        preceding: u32,
        /// Rows after the current row.
        following: u32,
    },
}

/// A window function output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Function.
    pub function: WindowFunction,
    /// Output alias.
    pub alias: String,
    /// `PARTITION BY` columns.
    #[serde(default)]
    pub partition_by: Vec<ColumnRef>,
    /// `ORDER BY` keys inside `OVER`.
    #[serde(default)]
    pub order_by: Vec<OrderKey>,
    /// Frame clause.
    #[serde(default)]
    pub frame: WindowFrame,
}

impl WindowSpec {
    /// Result type of the window column, when known.
    #[must_use]
    pub const fn result_type(&self) -> Option<ColumnType> {
        match &self.function {
            WindowFunction::RowNumber
            | WindowFunction::Rank
            | WindowFunction::DenseRank
            | WindowFunction::Ntile(_) => Some(ColumnType::Integer),
            WindowFunction::Aggregate { function, .. } => function.result_type(None),
            _ => None,
        }
    }
}

/// The body of a common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CteBody {
    /// Trusted raw SQL.
    Raw(String),
    /// A nested specification, rendered with the outer dialect.
    Query(Box<QuerySpec>),
}

impl From<&str> for CteBody {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for CteBody {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<QuerySpec> for CteBody {
    fn from(spec: QuerySpec) -> Self {
        Self::Query(Box::new(spec))
    }
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CteSpec {
    /// CTE name.
    pub name: String,
    /// Optional column list.
    #[serde(default)]
    pub columns: Vec<String>,
    /// The body, or the anchor member of a recursive CTE.
    pub body: CteBody,
    /// The recursive member, joined to the anchor with `UNION ALL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<CteBody>,
}

impl CteSpec {
    /// Returns true for a recursive CTE.
    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive.is_some()
    }
}

/// Set operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOpKind {
    /// `UNION`.
    Union,
    /// `UNION ALL`.
    UnionAll,
    /// `INTERSECT`.
    Intersect,
    /// `EXCEPT`.
    Except,
}

impl SetOpKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// A set operation with the specification on its right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    /// Operation.
    pub kind: SetOpKind,
    /// Right operand; may itself chain further set operations.
    pub right: Box<QuerySpec>,
}

/// A complete SELECT specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Row source.
    pub source: Source,
    /// `SELECT DISTINCT`.
    #[serde(default)]
    pub distinct: bool,
    /// SELECT list.
    #[serde(default)]
    pub projection: Projection,
    /// Joins.
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    /// WHERE predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Predicate>,
    /// ORDER BY keys, primary first.
    #[serde(default)]
    pub order_by: Vec<OrderKey>,
    /// Rows to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Rows to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<u64>,
    /// GROUP BY columns.
    #[serde(default)]
    pub group_by: Vec<ColumnRef>,
    /// Aggregate output columns.
    #[serde(default)]
    pub aggregates: Vec<AggregateSpec>,
    /// Window output columns.
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    /// Common table expressions, in registration order.
    #[serde(default)]
    pub ctes: Vec<CteSpec>,
    /// Trailing set operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_op: Option<SetOperation>,
}

impl QuerySpec {
    /// Creates an empty specification selecting `*` from `source`.
    #[must_use]
    pub const fn new(source: Source) -> Self {
        Self {
            source,
            distinct: false,
            projection: Projection::Star,
            joins: vec![],
            filter: None,
            order_by: vec![],
            skip: None,
            take: None,
            group_by: vec![],
            aggregates: vec![],
            windows: vec![],
            ctes: vec![],
            set_op: None,
        }
    }

    /// Returns the output column types, or `None` when the projection is
    /// `*` and the arity is unknown.
    #[must_use]
    pub fn shape(&self) -> Option<Shape> {
        let mut columns = match &self.projection {
            Projection::Star => return None,
            Projection::Columns(cols) => cols.iter().map(|c| c.column_type).collect::<Vec<_>>(),
        };
        for join in &self.joins {
            columns.extend(join.columns.iter().map(|c| c.column_type));
        }
        columns.extend(self.windows.iter().map(WindowSpec::result_type));
        columns.extend(self.aggregates.iter().map(|a| a.result_type));
        Some(Shape(columns))
    }

    /// Returns true when any registered CTE is recursive.
    #[must_use]
    pub fn has_recursive_cte(&self) -> bool {
        self.ctes.iter().any(CteSpec::is_recursive)
    }

    /// Returns the last specification of the set-operation chain.
    pub(crate) fn set_op_tail_mut(&mut self) -> &mut Self {
        match self.set_op {
            Some(ref mut op) => op.right.set_op_tail_mut(),
            None => self,
        }
    }
}

/// Rejects a set-operation right operand that carries clauses only the
/// combined query may have.
///
/// # Errors
///
/// Returns [`Error::InvalidSetOperand`] naming the offending clause.
pub fn validate_set_operand(spec: &QuerySpec) -> Result<()> {
    let reason = if !spec.order_by.is_empty() {
        "right operand has ORDER BY; order the combined query instead"
    } else if spec.skip.is_some() || spec.take.is_some() {
        "right operand has pagination; paginate the combined query instead"
    } else if !spec.ctes.is_empty() {
        "right operand declares CTEs; register them on the combined query"
    } else {
        return Ok(());
    };
    Err(Error::InvalidSetOperand {
        reason: String::from(reason),
    })
}

/// Output column types of a specification; `None` entries are unknown
/// and compatible with anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape(pub Vec<Option<ColumnType>>);

impl Shape {
    /// Same arity and pairwise compatible types.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|pair| match pair {
                (Some(a), Some(b)) => a.is_compatible_with(*b),
                _ => true,
            })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match ty {
                Some(ty) => f.write_str(ty.as_str())?,
                None => f.write_str("?")?,
            }
        }
        Ok(())
    }
}
