//! Condition to predicate compilation.

use tracing::trace;

use super::{
    ArithmeticOp, BoundValue, ColumnRef, CompareOp, MembershipSource, Operand, Predicate, Subquery,
};
use crate::builder::expr::{Condition, Expr, MatchKind};
use crate::builder::value::SqlValue;
use crate::error::{Error, Result};
use crate::schema::{ColumnDescriptor, ColumnType, EntityDescriptor};

/// Compiles a condition against an entity descriptor.
///
/// # Errors
///
/// Fails with [`Error::UnknownMember`] for a column the entity does not
/// declare, [`Error::TypeMismatch`] for operands of incompatible types and
/// [`Error::UnsupportedExpression`] for conditions with no SQL meaning.
pub fn compile(condition: &Condition, descriptor: &EntityDescriptor) -> Result<Predicate> {
    Scope::new(descriptor).compile(condition)
}

/// The set of columns visible to a condition: the queried entity plus any
/// included relations, addressed as `relation.column`.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    entity: &'a EntityDescriptor,
    joins: Vec<(&'a str, &'a EntityDescriptor)>,
}

/// A compiled operand with the type information the checks need.
struct Typed<'a> {
    operand: Operand,
    column_type: Option<ColumnType>,
    column: Option<&'a ColumnDescriptor>,
    has_column: bool,
    label: String,
}

impl Typed<'_> {
    fn value(&self) -> Option<&SqlValue> {
        match &self.operand {
            Operand::Value(bound) => Some(&bound.value),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        self.value().is_some_and(SqlValue::is_null)
    }

    fn found(&self) -> &'static str {
        match (self.column_type, self.value()) {
            (Some(ty), _) => ty.as_str(),
            (None, Some(v)) => v.kind(),
            (None, None) => "unknown",
        }
    }

    fn is_numeric(&self) -> bool {
        match (self.column_type, self.value()) {
            (Some(ty), _) => ty.is_numeric(),
            (None, Some(v)) => matches!(v, SqlValue::Int(_) | SqlValue::Float(_)),
            (None, None) => false,
        }
    }
}

impl<'a> Scope<'a> {
    /// Creates a scope over a single entity.
    #[must_use]
    pub fn new(entity: &'a EntityDescriptor) -> Self {
        Self {
            entity,
            joins: vec![],
        }
    }

    /// Makes the columns of an included relation visible under `alias`.
    #[must_use]
    pub fn with_join(mut self, alias: &'a str, descriptor: &'a EntityDescriptor) -> Self {
        self.joins.push((alias, descriptor));
        self
    }

    /// Compiles a condition in this scope.
    ///
    /// # Errors
    ///
    /// See [`compile`].
    pub fn compile(&self, condition: &Condition) -> Result<Predicate> {
        let predicate = self.condition(condition)?;
        trace!(entity = self.entity.table(), ?predicate, "compiled condition");
        Ok(predicate)
    }

    /// Resolves a column name, or `relation.column` for an included
    /// relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMember`] if nothing in scope declares it.
    pub fn resolve(&self, name: &str) -> Result<(ColumnRef, &'a ColumnDescriptor)> {
        if let Some((prefix, column)) = name.split_once('.') {
            if prefix == self.entity.table() {
                let descriptor = self.entity.require_column(column)?;
                return Ok((ColumnRef::new(column), descriptor));
            }
            let (alias, target) = self
                .joins
                .iter()
                .find(|(alias, _)| *alias == prefix)
                .ok_or_else(|| Error::unknown_member(self.entity.table(), name))?;
            let descriptor = target.require_column(column)?;
            return Ok((ColumnRef::qualified(*alias, column), descriptor));
        }
        let descriptor = self.entity.require_column(name)?;
        Ok((ColumnRef::new(name), descriptor))
    }

    fn column(&self, expr: &Expr, context: &str) -> Result<(ColumnRef, &'a ColumnDescriptor)> {
        match expr {
            Expr::Column(name) => self.resolve(name),
            _ => Err(Error::unsupported(format!("{context} on a non-column operand"))),
        }
    }

    fn condition(&self, condition: &Condition) -> Result<Predicate> {
        match condition {
            Condition::Compare { left, op, right } => self.comparison(left, *op, right),
            Condition::And(l, r) => Ok(self.condition(l)?.and(self.condition(r)?)),
            Condition::Or(l, r) => Ok(self.condition(l)?.or(self.condition(r)?)),
            Condition::Not(inner) => Ok(Predicate::Negation(Box::new(self.condition(inner)?))),
            Condition::Match {
                column,
                kind,
                text,
                negated,
            } => self.like(column, *kind, text, *negated),
            Condition::InList {
                expr,
                values,
                negated,
            } => self.in_list(expr, values, *negated),
            Condition::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let (column, _) = self.column(expr, "IN")?;
                if let Subquery::Query(spec) = subquery {
                    let arity = spec.shape().map(|shape| shape.0.len());
                    if let Some(n) = arity.filter(|n| *n != 1) {
                        return Err(Error::TypeMismatch {
                            column: column.to_string(),
                            expected: String::from("single-column subquery"),
                            found: format!("{n} columns"),
                        });
                    }
                }
                Ok(Predicate::Membership {
                    column,
                    source: MembershipSource::Subquery(subquery.clone()),
                    negated: *negated,
                })
            }
            Condition::IsNull { expr, negated } => {
                let (column, _) = self.column(expr, "IS NULL")?;
                Ok(Predicate::NullCheck {
                    column,
                    is_null: !negated,
                })
            }
            Condition::Exists { subquery, negated } => Ok(Predicate::Exists {
                subquery: subquery.clone(),
                negated: *negated,
            }),
            Condition::Operand(expr) => self.bare(expr),
            Condition::Raw { sql, params } => Ok(Predicate::Raw {
                sql: sql.clone(),
                params: params.clone(),
            }),
        }
    }

    fn operand(&self, expr: &Expr) -> Result<Typed<'a>> {
        match expr {
            Expr::Column(name) => {
                let (column, descriptor) = self.resolve(name)?;
                Ok(Typed {
                    operand: Operand::Column(column),
                    column_type: Some(descriptor.column_type),
                    column: Some(descriptor),
                    has_column: true,
                    label: name.clone(),
                })
            }
            Expr::Value(value) => Ok(Typed {
                operand: Operand::Value(BoundValue::new(value.clone())),
                column_type: None,
                column: None,
                has_column: false,
                label: String::from(value.kind()),
            }),
            Expr::Arithmetic { op, left, right } => self.arithmetic(expr, *op, left, right),
        }
    }

    fn arithmetic(
        &self,
        expr: &Expr,
        op: ArithmeticOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Typed<'a>> {
        let l = self.operand(left)?;
        let r = self.operand(right)?;
        for side in [&l, &r] {
            if !side.is_numeric() {
                return Err(Error::TypeMismatch {
                    column: side.label.clone(),
                    expected: String::from("numeric"),
                    found: String::from(side.found()),
                });
            }
        }
        let integral = |t: &Typed<'_>| match (t.column_type, t.value()) {
            (Some(ty), _) => ty == ColumnType::Integer,
            (None, Some(v)) => matches!(v, SqlValue::Int(_)),
            (None, None) => false,
        };
        let column_type = if integral(&l) && integral(&r) {
            ColumnType::Integer
        } else {
            ColumnType::Real
        };
        Ok(Typed {
            has_column: l.has_column || r.has_column,
            operand: Operand::Arithmetic {
                op,
                left: Box::new(l.operand),
                right: Box::new(r.operand),
            },
            column_type: Some(column_type),
            column: None,
            label: expr.to_string(),
        })
    }

    fn comparison(&self, left: &Expr, op: CompareOp, right: &Expr) -> Result<Predicate> {
        let l = self.operand(left)?;
        let r = self.operand(right)?;
        if !l.has_column && !r.has_column {
            return Err(Error::unsupported("comparison without a column"));
        }
        if r.is_null() {
            return null_check(l, op);
        }
        if l.is_null() {
            return null_check(r, op.flipped());
        }

        // Keep the column side on the left.
        let (l, op, r) = if l.value().is_some() {
            (r, op.flipped(), l)
        } else {
            (l, op, r)
        };

        let right = match r.operand {
            Operand::Value(bound) => Operand::Value(bind(&l, bound.value)?),
            other => {
                if let (Some(lt), Some(rt)) = (l.column_type, r.column_type) {
                    if !lt.is_compatible_with(rt) {
                        return Err(Error::TypeMismatch {
                            column: l.label,
                            expected: String::from(lt.as_str()),
                            found: String::from(rt.as_str()),
                        });
                    }
                }
                other
            }
        };
        Ok(Predicate::Comparison {
            left: l.operand,
            op,
            right,
        })
    }

    fn like(&self, expr: &Expr, kind: MatchKind, text: &str, negated: bool) -> Result<Predicate> {
        let (column, descriptor) = self.column(expr, "LIKE")?;
        if descriptor.column_type != ColumnType::Text {
            return Err(Error::TypeMismatch {
                column: column.to_string(),
                expected: String::from(ColumnType::Text.as_str()),
                found: String::from(descriptor.column_type.as_str()),
            });
        }
        let (pattern, escaped_wildcards) = match kind {
            MatchKind::Pattern => (String::from(text), false),
            MatchKind::Contains => {
                let (escaped, changed) = escape_like(text);
                (format!("%{escaped}%"), changed)
            }
            MatchKind::StartsWith => {
                let (escaped, changed) = escape_like(text);
                (format!("{escaped}%"), changed)
            }
            MatchKind::EndsWith => {
                let (escaped, changed) = escape_like(text);
                (format!("%{escaped}"), changed)
            }
        };
        Ok(Predicate::Like {
            column,
            pattern,
            escaped_wildcards,
            negated,
        })
    }

    fn in_list(&self, expr: &Expr, values: &[SqlValue], negated: bool) -> Result<Predicate> {
        let (column, descriptor) = self.column(expr, "IN")?;
        let typed = Typed {
            operand: Operand::Column(column.clone()),
            column_type: Some(descriptor.column_type),
            column: Some(descriptor),
            has_column: true,
            label: column.to_string(),
        };
        let slots = values
            .iter()
            .map(|v| bind(&typed, v.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Predicate::Membership {
            column,
            source: MembershipSource::List(slots),
            negated,
        })
    }

    fn bare(&self, expr: &Expr) -> Result<Predicate> {
        match expr {
            Expr::Column(name) => {
                let (column, descriptor) = self.resolve(name)?;
                if descriptor.column_type != ColumnType::Boolean {
                    return Err(Error::TypeMismatch {
                        column: name.clone(),
                        expected: String::from(ColumnType::Boolean.as_str()),
                        found: String::from(descriptor.column_type.as_str()),
                    });
                }
                Ok(Predicate::Comparison {
                    left: Operand::Column(column),
                    op: CompareOp::Eq,
                    right: Operand::Value(BoundValue::new(SqlValue::Bool(true))),
                })
            }
            Expr::Value(_) => Err(Error::unsupported("bare constant")),
            Expr::Arithmetic { .. } => Err(Error::unsupported("bare arithmetic expression")),
        }
    }
}

/// Type-checks a constant against the operand it is compared with and
/// attaches the column's enum storage.
fn bind(against: &Typed<'_>, value: SqlValue) -> Result<BoundValue> {
    let expected = match (against.column, against.column_type) {
        (Some(column), _) if !column.accepts(&value) => Some(column.expected()),
        (None, Some(ty)) if !ty.accepts(&value) => Some(String::from(ty.as_str())),
        _ => None,
    };
    if let Some(expected) = expected {
        return Err(Error::TypeMismatch {
            column: against.label.clone(),
            expected,
            found: String::from(value.kind()),
        });
    }
    let storage = against
        .column
        .filter(|c| c.column_type == ColumnType::Enum)
        .and_then(|c| c.enum_storage);
    Ok(BoundValue::with_storage(value, storage))
}

fn null_check(operand: Typed<'_>, op: CompareOp) -> Result<Predicate> {
    let is_null = match op {
        CompareOp::Eq => true,
        CompareOp::Ne => false,
        _ => return Err(Error::unsupported("ordering comparison against null")),
    };
    match operand.operand {
        Operand::Column(column) => Ok(Predicate::NullCheck { column, is_null }),
        _ => Err(Error::unsupported("null comparison on a non-column operand")),
    }
}

/// Escapes LIKE wildcards and the escape character itself.
fn escape_like(text: &str) -> (String, bool) {
    let mut escaped = String::with_capacity(text.len());
    let mut changed = false;
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
            changed = true;
        }
        escaped.push(c);
    }
    (escaped, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::expr::{col, exists, lit};
    use crate::builder::value::EnumValue;
    use crate::predicate::LogicalOp;
    use crate::spec::{ProjectedColumn, Projection, QuerySpec, Source};
    use crate::schema::{EnumStorage, Relation};
    use std::sync::OnceLock;

    fn orders() -> &'static EntityDescriptor {
        static D: OnceLock<EntityDescriptor> = OnceLock::new();
        D.get_or_init(|| {
            EntityDescriptor::builder("orders")
                .column(ColumnDescriptor::new("id", ColumnType::Integer).primary_key())
                .column(ColumnDescriptor::new("employee_id", ColumnType::Integer))
                .column(ColumnDescriptor::new("total", ColumnType::Real))
                .build()
        })
    }

    fn employees() -> EntityDescriptor {
        EntityDescriptor::builder("employees")
            .column(ColumnDescriptor::new("id", ColumnType::Integer).primary_key())
            .column(ColumnDescriptor::new("first_name", ColumnType::Text))
            .column(ColumnDescriptor::new("age", ColumnType::Integer))
            .column(ColumnDescriptor::new("salary", ColumnType::Real))
            .column(ColumnDescriptor::new("active", ColumnType::Boolean))
            .column(ColumnDescriptor::new("manager_id", ColumnType::Integer).nullable())
            .column(
                ColumnDescriptor::new("level", ColumnType::Enum).enum_storage(EnumStorage::Integer),
            )
            .relation(Relation::new("orders", orders, "id", "employee_id"))
            .build()
    }

    #[test]
    fn test_comparison() {
        let p = compile(&col("age").gt_eq(25), &employees()).unwrap();
        assert_eq!(
            p,
            Predicate::Comparison {
                left: Operand::Column(ColumnRef::new("age")),
                op: CompareOp::Gte,
                right: Operand::Value(BoundValue::new(SqlValue::Int(25))),
            }
        );
    }

    #[test]
    fn test_constant_on_left_is_flipped() {
        let p = compile(&lit(25).lt(col("age")), &employees()).unwrap();
        match p {
            Predicate::Comparison { left, op, .. } => {
                assert_eq!(left, Operand::Column(ColumnRef::new("age")));
                assert_eq!(op, CompareOp::Gt);
            }
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn test_null_comparisons() {
        let d = employees();
        assert_eq!(
            compile(&col("manager_id").eq(SqlValue::Null), &d).unwrap(),
            Predicate::NullCheck {
                column: ColumnRef::new("manager_id"),
                is_null: true,
            }
        );
        assert_eq!(
            compile(&col("manager_id").not_eq(None::<i64>), &d).unwrap(),
            Predicate::NullCheck {
                column: ColumnRef::new("manager_id"),
                is_null: false,
            }
        );
        let err = compile(&col("manager_id").gt(SqlValue::Null), &d).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { .. }));
    }

    #[test]
    fn test_logical_nesting_is_preserved() {
        let c = col("age")
            .gt_eq(25)
            .and(col("first_name").eq("John").or(col("first_name").eq("Jane")));
        let p = compile(&c, &employees()).unwrap();
        match p {
            Predicate::Logical { op, right, .. } => {
                assert_eq!(op, LogicalOp::And);
                assert_eq!(right.logical_op(), Some(LogicalOp::Or));
            }
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn test_like_escapes_literal_wildcards() {
        let p = compile(&col("first_name").contains("50%_off"), &employees()).unwrap();
        assert_eq!(
            p,
            Predicate::Like {
                column: ColumnRef::new("first_name"),
                pattern: String::from("%50\\%\\_off%"),
                escaped_wildcards: true,
                negated: false,
            }
        );
        let p = compile(&col("first_name").starts_with("Jo"), &employees()).unwrap();
        assert!(matches!(p, Predicate::Like { ref pattern, escaped_wildcards: false, .. } if pattern == "Jo%"));
        let p = compile(&col("first_name").ends_with("n"), &employees()).unwrap();
        assert!(matches!(p, Predicate::Like { ref pattern, .. } if pattern == "%n"));
    }

    #[test]
    fn test_like_on_non_text_column() {
        let err = compile(&col("age").contains("3"), &employees()).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                column: String::from("age"),
                expected: String::from("text"),
                found: String::from("integer"),
            }
        );
    }

    #[test]
    fn test_arithmetic_requires_numeric_operands() {
        let ok = compile(&col("salary").mul(1.1).gt(5000), &employees()).unwrap();
        assert!(matches!(
            ok,
            Predicate::Comparison {
                left: Operand::Arithmetic { .. },
                ..
            }
        ));
        let err = compile(&col("first_name").add(1).gt(5), &employees()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref expected, .. } if expected == "numeric"));
    }

    #[test]
    fn test_membership_list_binds_each_element() {
        let p = compile(&col("age").in_list([30, 40, 50]), &employees()).unwrap();
        match p {
            Predicate::Membership {
                source: MembershipSource::List(slots),
                negated,
                ..
            } => {
                assert!(!negated);
                assert_eq!(slots.len(), 3);
            }
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn test_enum_storage_attached() {
        let c = col("level").eq(EnumValue::new("Senior", 2));
        match compile(&c, &employees()).unwrap() {
            Predicate::Comparison {
                right: Operand::Value(bound),
                ..
            } => assert_eq!(bound.storage, Some(EnumStorage::Integer)),
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn test_raw_enum_value_must_match_storage() {
        assert!(compile(&col("level").eq(2), &employees()).is_ok());
        assert_eq!(
            compile(&col("level").in_list(["Senior"]), &employees()).unwrap_err(),
            Error::TypeMismatch {
                column: String::from("level"),
                expected: String::from("enum stored as integer"),
                found: String::from("text"),
            }
        );
    }

    #[test]
    fn test_bare_boolean_column() {
        let p = compile(&col("active").into(), &employees()).unwrap();
        assert_eq!(
            p,
            Predicate::Comparison {
                left: Operand::Column(ColumnRef::new("active")),
                op: CompareOp::Eq,
                right: Operand::Value(BoundValue::new(SqlValue::Bool(true))),
            }
        );
        let err = compile(&col("age").into(), &employees()).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        let err = compile(&lit(true).into(), &employees()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExpression { .. }));
    }

    #[test]
    fn test_comparison_without_column() {
        let err = compile(&lit(1).eq(1), &employees()).unwrap_err();
        assert_eq!(err, Error::unsupported("comparison without a column"));
    }

    #[test]
    fn test_unknown_member() {
        let err = compile(&col("nickname").eq("x"), &employees()).unwrap_err();
        assert_eq!(err, Error::unknown_member("employees", "nickname"));
    }

    #[test]
    fn test_type_mismatch() {
        let err = compile(&col("age").eq("thirty"), &employees()).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                column: String::from("age"),
                expected: String::from("integer"),
                found: String::from("text"),
            }
        );
    }

    #[test]
    fn test_joined_columns_resolve_through_scope() {
        let d = employees();
        let scope = Scope::new(&d).with_join("orders", orders());
        let p = scope.compile(&col("orders.total").gt(100.0)).unwrap();
        match p {
            Predicate::Comparison {
                left: Operand::Column(c),
                ..
            } => assert_eq!(c, ColumnRef::qualified("orders", "total")),
            other => panic!("unexpected predicate: {other:?}"),
        }
        assert!(compile(&col("orders.total").gt(100.0), &d).is_err());
    }

    #[test]
    fn test_exists_passes_subquery_through() {
        let p = compile(&exists("SELECT 1 FROM orders"), &employees()).unwrap();
        assert_eq!(
            p,
            Predicate::Exists {
                subquery: Subquery::Raw(String::from("SELECT 1 FROM orders")),
                negated: false,
            }
        );
    }

    #[test]
    fn test_in_subquery_needs_one_column() {
        let mut orders = QuerySpec::new(Source::Table(String::from("orders")));
        orders.projection = Projection::Columns(vec![ProjectedColumn::new(
            ColumnRef::new("employee_id"),
            Some(ColumnType::Integer),
        )]);
        assert!(compile(&col("id").in_subquery(orders.clone()), &employees()).is_ok());

        if let Projection::Columns(columns) = &mut orders.projection {
            columns.push(ProjectedColumn::new(ColumnRef::new("total"), Some(ColumnType::Real)));
        }
        assert_eq!(
            compile(&col("id").in_subquery(orders), &employees()).unwrap_err(),
            Error::TypeMismatch {
                column: String::from("id"),
                expected: String::from("single-column subquery"),
                found: String::from("2 columns"),
            }
        );

        let raw = compile(&col("id").in_subquery("SELECT a, b FROM t"), &employees());
        assert!(raw.is_ok());
    }
}
