//! The predicate AST.
//!
//! A [`Predicate`] is the validated, backend-independent form of a filter
//! condition. It is produced by [`compile`] and rendered by the dialect
//! renderer. Precedence is carried by nesting only; parentheses are decided
//! at render time.

mod compiler;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::value::SqlValue;
use crate::schema::EnumStorage;
use crate::spec::QuerySpec;

pub use compiler::{compile, Scope};

/// A column reference, optionally qualified by a table or join alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table or alias qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Creates an unqualified reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    /// Creates a qualified reference.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{t}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A value slot together with the storage flag of the column it meets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundValue {
    /// The value.
    pub value: SqlValue,
    /// Enum storage of the compared column, if it declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<EnumStorage>,
}

impl BoundValue {
    /// Creates a slot with no column storage attached.
    #[must_use]
    pub const fn new(value: SqlValue) -> Self {
        Self {
            value,
            storage: None,
        }
    }

    /// Creates a slot carrying a column's enum storage.
    #[must_use]
    pub const fn with_storage(value: SqlValue, storage: Option<EnumStorage>) -> Self {
        Self { value, storage }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl CompareOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// Returns the operator with its operands swapped (`a < b` is `b > a`).
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
        }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl LogicalOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl ArithmeticOp {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Rem => 2,
        }
    }

    /// Whether `a op (b op c)` equals `(a op b) op c`.
    #[must_use]
    pub const fn is_associative(self) -> bool {
        matches!(self, Self::Add | Self::Mul)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A column.
    Column(ColumnRef),
    /// A value slot.
    Value(BoundValue),
    /// An arithmetic sub-expression.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Operand>,
        /// Right operand.
        right: Box<Operand>,
    },
}

/// A subquery used by membership and existence predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subquery {
    /// A trusted raw SQL fragment.
    Raw(String),
    /// A nested specification, rendered with the outer query's dialect.
    Query(Box<QuerySpec>),
}

/// The right-hand side of a membership test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipSource {
    /// One value slot per element.
    List(Vec<BoundValue>),
    /// A subquery.
    Subquery(Subquery),
}

/// A compiled boolean condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `left op right`.
    Comparison {
        /// Left operand.
        left: Operand,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Operand,
    },
    /// `left AND right` / `left OR right`.
    Logical {
        /// Connective.
        op: LogicalOp,
        /// Left predicate.
        left: Box<Predicate>,
        /// Right predicate.
        right: Box<Predicate>,
    },
    /// `NOT inner`.
    Negation(Box<Predicate>),
    /// `column [NOT] LIKE pattern`.
    Like {
        /// Matched column.
        column: ColumnRef,
        /// Complete pattern, wildcards included.
        pattern: String,
        /// Whether the pattern contains escaped wildcard characters.
        escaped_wildcards: bool,
        /// `NOT LIKE`.
        negated: bool,
    },
    /// `column [NOT] IN (...)`.
    Membership {
        /// Tested column.
        column: ColumnRef,
        /// Values or subquery.
        source: MembershipSource,
        /// `NOT IN`.
        negated: bool,
    },
    /// `column IS [NOT] NULL`.
    NullCheck {
        /// Tested column.
        column: ColumnRef,
        /// `IS NULL` when true, `IS NOT NULL` otherwise.
        is_null: bool,
    },
    /// `[NOT] EXISTS (subquery)`.
    Exists {
        /// The subquery.
        subquery: Subquery,
        /// `NOT EXISTS`.
        negated: bool,
    },
    /// A trusted raw SQL fragment with `?` markers for its parameters.
    Raw {
        /// SQL text.
        sql: String,
        /// Parameters, in marker order.
        params: Vec<SqlValue>,
    },
}

impl Predicate {
    /// Combines two predicates with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Combines two predicates with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Returns the top-level connective, if this is a logical node.
    #[must_use]
    pub const fn logical_op(&self) -> Option<LogicalOp> {
        match self {
            Self::Logical { op, .. } => Some(*op),
            _ => None,
        }
    }
}
