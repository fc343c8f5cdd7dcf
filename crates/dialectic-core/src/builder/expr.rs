//! Condition combinators.
//!
//! Filters are written with explicit combinators instead of closures:
//!
//! ```
//! use dialectic_core::builder::col;
//!
//! let adults = col("age").gt_eq(25).and(col("first_name").eq("John").or(col("first_name").eq("Jane")));
//! ```
//!
//! A [`Condition`] is not validated when it is built; the predicate compiler
//! checks it against an entity descriptor.

use std::fmt;

use super::value::{SqlValue, ToSqlValue};
use crate::predicate::{ArithmeticOp, CompareOp, Subquery};
use crate::spec::QuerySpec;

/// Creates a column operand.
#[must_use]
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Creates a constant operand.
#[must_use]
pub fn lit<T: ToSqlValue>(value: T) -> Expr {
    Expr::Value(value.to_sql_value())
}

/// `EXISTS (subquery)`.
#[must_use]
pub fn exists(subquery: impl Into<Subquery>) -> Condition {
    Condition::Exists {
        subquery: subquery.into(),
        negated: false,
    }
}

/// `NOT EXISTS (subquery)`.
#[must_use]
pub fn not_exists(subquery: impl Into<Subquery>) -> Condition {
    Condition::Exists {
        subquery: subquery.into(),
        negated: true,
    }
}

/// An operand of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column of the queried entity, or `relation.column` of an include.
    Column(String),
    /// A constant.
    Value(SqlValue),
    /// An arithmetic expression.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

/// Conversion into an operand: columns and expressions pass through,
/// anything else becomes a constant.
pub trait IntoExpr {
    /// Converts `self` into an operand.
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl<T: ToSqlValue> IntoExpr for T {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_sql_value())
    }
}

impl Expr {
    fn compare(self, op: CompareOp, rhs: impl IntoExpr) -> Condition {
        Condition::Compare {
            left: self,
            op,
            right: rhs.into_expr(),
        }
    }

    fn arithmetic(self, op: ArithmeticOp, rhs: impl IntoExpr) -> Self {
        Self::Arithmetic {
            op,
            left: Box::new(self),
            right: Box::new(rhs.into_expr()),
        }
    }

    fn matching(self, kind: MatchKind, text: &str, negated: bool) -> Condition {
        Condition::Match {
            column: self,
            kind,
            text: String::from(text),
            negated,
        }
    }

    /// `self = rhs`. Comparing with `None` or `SqlValue::Null` compiles to
    /// `IS NULL`.
    #[must_use]
    pub fn eq(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Eq, rhs)
    }

    /// `self <> rhs`.
    #[must_use]
    pub fn not_eq(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Ne, rhs)
    }

    /// `self < rhs`.
    #[must_use]
    pub fn lt(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Lt, rhs)
    }

    /// `self <= rhs`.
    #[must_use]
    pub fn lt_eq(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Lte, rhs)
    }

    /// `self > rhs`.
    #[must_use]
    pub fn gt(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Gt, rhs)
    }

    /// `self >= rhs`.
    #[must_use]
    pub fn gt_eq(self, rhs: impl IntoExpr) -> Condition {
        self.compare(CompareOp::Gte, rhs)
    }

    /// `self >= low AND self <= high`.
    #[must_use]
    pub fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Condition {
        self.clone().gt_eq(low).and(self.lt_eq(high))
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: false,
        }
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: true,
        }
    }

    /// `self LIKE pattern`, with the pattern used verbatim.
    #[must_use]
    pub fn like(self, pattern: &str) -> Condition {
        self.matching(MatchKind::Pattern, pattern, false)
    }

    /// `self NOT LIKE pattern`, with the pattern used verbatim.
    #[must_use]
    pub fn not_like(self, pattern: &str) -> Condition {
        self.matching(MatchKind::Pattern, pattern, true)
    }

    /// Substring match; wildcards in `text` match literally.
    #[must_use]
    pub fn contains(self, text: &str) -> Condition {
        self.matching(MatchKind::Contains, text, false)
    }

    /// Prefix match; wildcards in `text` match literally.
    #[must_use]
    pub fn starts_with(self, text: &str) -> Condition {
        self.matching(MatchKind::StartsWith, text, false)
    }

    /// Suffix match; wildcards in `text` match literally.
    #[must_use]
    pub fn ends_with(self, text: &str) -> Condition {
        self.matching(MatchKind::EndsWith, text, false)
    }

    /// `self IN (values...)`.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: impl IntoIterator<Item = T>) -> Condition {
        Condition::InList {
            expr: self,
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: false,
        }
    }

    /// `self NOT IN (values...)`.
    #[must_use]
    pub fn not_in_list<T: ToSqlValue>(self, values: impl IntoIterator<Item = T>) -> Condition {
        Condition::InList {
            expr: self,
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated: true,
        }
    }

    /// `self IN (subquery)`.
    #[must_use]
    pub fn in_subquery(self, subquery: impl Into<Subquery>) -> Condition {
        Condition::InSubquery {
            expr: self,
            subquery: subquery.into(),
            negated: false,
        }
    }

    /// `self NOT IN (subquery)`.
    #[must_use]
    pub fn not_in_subquery(self, subquery: impl Into<Subquery>) -> Condition {
        Condition::InSubquery {
            expr: self,
            subquery: subquery.into(),
            negated: true,
        }
    }

    /// `self + rhs`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: impl IntoExpr) -> Self {
        self.arithmetic(ArithmeticOp::Add, rhs)
    }

    /// `self - rhs`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, rhs: impl IntoExpr) -> Self {
        self.arithmetic(ArithmeticOp::Sub, rhs)
    }

    /// `self * rhs`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, rhs: impl IntoExpr) -> Self {
        self.arithmetic(ArithmeticOp::Mul, rhs)
    }

    /// `self / rhs`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, rhs: impl IntoExpr) -> Self {
        self.arithmetic(ArithmeticOp::Div, rhs)
    }

    /// `self % rhs`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn rem(self, rhs: impl IntoExpr) -> Self {
        self.arithmetic(ArithmeticOp::Rem, rhs)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => f.write_str(name),
            Self::Value(v) => f.write_str(v.kind()),
            Self::Arithmetic { op, left, right } => {
                write!(f, "({left} {} {right})", op.as_sql())
            }
        }
    }
}

/// How a string match builds its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `%text%`
    Contains,
    /// `text%`
    StartsWith,
    /// `%text`
    EndsWith,
    /// The text is the pattern.
    Pattern,
}

/// An uncompiled boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Binary comparison.
    Compare {
        /// Left operand.
        left: Expr,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Expr,
    },
    /// Both conditions hold.
    And(Box<Condition>, Box<Condition>),
    /// Either condition holds.
    Or(Box<Condition>, Box<Condition>),
    /// The condition does not hold.
    Not(Box<Condition>),
    /// LIKE match.
    Match {
        /// Matched operand.
        column: Expr,
        /// Pattern construction.
        kind: MatchKind,
        /// Text or pattern.
        text: String,
        /// NOT LIKE.
        negated: bool,
    },
    /// Membership in a constant list.
    InList {
        /// Tested operand.
        expr: Expr,
        /// Candidates.
        values: Vec<SqlValue>,
        /// NOT IN.
        negated: bool,
    },
    /// Membership in a subquery.
    InSubquery {
        /// Tested operand.
        expr: Expr,
        /// The subquery.
        subquery: Subquery,
        /// NOT IN.
        negated: bool,
    },
    /// Explicit NULL test.
    IsNull {
        /// Tested operand.
        expr: Expr,
        /// IS NOT NULL.
        negated: bool,
    },
    /// Subquery existence.
    Exists {
        /// The subquery.
        subquery: Subquery,
        /// NOT EXISTS.
        negated: bool,
    },
    /// A bare operand; only boolean columns are valid here.
    Operand(Expr),
    /// Trusted SQL with `?` markers.
    Raw {
        /// SQL text.
        sql: String,
        /// Parameters, in marker order.
        params: Vec<SqlValue>,
    },
}

impl Condition {
    /// Creates a raw condition. The SQL is trusted; values must go through
    /// `params`.
    #[must_use]
    pub fn raw(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self::Raw {
            sql: sql.into(),
            params,
        }
    }

    /// Combines with AND.
    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        Self::And(Box::new(self), Box::new(other.into()))
    }

    /// Combines with OR.
    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        Self::Or(Box::new(self), Box::new(other.into()))
    }

    /// Negates the condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl From<Expr> for Condition {
    fn from(expr: Expr) -> Self {
        Self::Operand(expr)
    }
}

impl From<&str> for Subquery {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for Subquery {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<QuerySpec> for Subquery {
    fn from(spec: QuerySpec) -> Self {
        Self::Query(Box::new(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_comparison() {
        assert_eq!(
            col("age").gt(18),
            Condition::Compare {
                left: Expr::Column(String::from("age")),
                op: CompareOp::Gt,
                right: Expr::Value(SqlValue::Int(18)),
            }
        );
    }

    #[test]
    fn test_column_against_column() {
        let c = col("updated_at").gt_eq(col("created_at"));
        match c {
            Condition::Compare { right, .. } => {
                assert_eq!(right, Expr::Column(String::from("created_at")));
            }
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn test_arithmetic_nesting() {
        let e = col("salary").mul(1.1).add(100);
        assert_eq!(e.to_string(), "((salary * real) + integer)");
    }

    #[test]
    fn test_between_expands_to_and() {
        assert!(matches!(col("age").between(18, 65), Condition::And(_, _)));
    }

    #[test]
    fn test_in_list_collects_values() {
        match col("department").in_list(["Eng", "Sales"]) {
            Condition::InList { values, negated, .. } => {
                assert!(!negated);
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn test_bare_column_is_operand() {
        let c: Condition = col("active").into();
        assert_eq!(c, Condition::Operand(Expr::Column(String::from("active"))));
    }

    #[test]
    fn test_not_wraps() {
        let c = col("a").is_null().not();
        assert!(matches!(c, Condition::Not(_)));
    }
}
