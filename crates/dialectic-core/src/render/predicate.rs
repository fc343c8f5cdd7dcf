//! WHERE-clause rendering with minimal parentheses.

use super::Writer;
use crate::builder::value::SqlValue;
use crate::error::{Error, Result};
use crate::predicate::{
    ArithmeticOp, BoundValue, LogicalOp, MembershipSource, Operand, Predicate, Subquery,
};

impl Writer<'_> {
    /// Writes a predicate. `parent` is the connective of the enclosing
    /// logical node, if any.
    pub(super) fn predicate(
        &mut self,
        predicate: &Predicate,
        parent: Option<LogicalOp>,
    ) -> Result<String> {
        match predicate {
            Predicate::Comparison { left, op, right } => {
                let left = self.operand(left)?;
                let right = self.operand(right)?;
                Ok(format!("{left} {} {right}", op.as_sql()))
            }
            Predicate::Logical { op, left, right } => {
                let left = self.predicate(left, Some(*op))?;
                let right = self.predicate(right, Some(*op))?;
                let sql = format!("{left} {} {right}", op.as_sql());
                Ok(match parent {
                    Some(outer) if outer != *op => format!("({sql})"),
                    _ => sql,
                })
            }
            Predicate::Negation(inner) => {
                let sql = self.predicate(inner, None)?;
                Ok(match inner.as_ref() {
                    Predicate::Logical { .. } | Predicate::Raw { .. } => format!("NOT ({sql})"),
                    _ => format!("NOT {sql}"),
                })
            }
            Predicate::Like {
                column,
                pattern,
                escaped_wildcards,
                negated,
            } => {
                let column = self.column(column);
                let pattern = self.value(&BoundValue::new(SqlValue::Text(pattern.clone())))?;
                let not = if *negated { "NOT " } else { "" };
                let mut sql = format!("{column} {not}LIKE {pattern}");
                if *escaped_wildcards {
                    sql.push_str(" ESCAPE ");
                    sql.push_str(&self.sanitizer.sanitize_string(Some("\\")));
                }
                Ok(sql)
            }
            Predicate::Membership {
                column,
                source,
                negated,
            } => {
                let column = self.column(column);
                self.membership(&column, source, *negated)
            }
            Predicate::NullCheck { column, is_null } => {
                let keyword = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                Ok(format!("{} {keyword}", self.column(column)))
            }
            Predicate::Exists { subquery, negated } => {
                let sql = self.subquery(subquery)?;
                let not = if *negated { "NOT " } else { "" };
                Ok(format!("{not}EXISTS ({sql})"))
            }
            Predicate::Raw { sql, params } => {
                let sql = self.raw(sql, params)?;
                Ok(if parent.is_some() { format!("({sql})") } else { sql })
            }
        }
    }

    fn membership(
        &mut self,
        column: &str,
        source: &MembershipSource,
        negated: bool,
    ) -> Result<String> {
        let not = if negated { "NOT " } else { "" };
        let items = match source {
            MembershipSource::List(values) if values.is_empty() => {
                // Nothing is IN an empty set.
                return Ok(String::from(if negated { "1 = 1" } else { "1 = 0" }));
            }
            MembershipSource::List(values)
                if values.len() > self.profile().inline_list_threshold =>
            {
                let mut literals = Vec::with_capacity(values.len());
                for value in values {
                    let normalized = self.sanitizer.normalize(value);
                    literals.push(self.sanitizer.literal(&normalized)?);
                }
                literals.join(", ")
            }
            MembershipSource::List(values) => {
                let mut slots = Vec::with_capacity(values.len());
                for value in values {
                    slots.push(self.value(value)?);
                }
                slots.join(", ")
            }
            MembershipSource::Subquery(subquery) => self.subquery(subquery)?,
        };
        Ok(format!("{column} {not}IN ({items})"))
    }

    fn subquery(&mut self, subquery: &Subquery) -> Result<String> {
        match subquery {
            Subquery::Raw(sql) => Ok(sql.clone()),
            Subquery::Query(spec) => self.query(spec),
        }
    }

    /// Substitutes each `?` outside string literals with a value slot.
    fn raw(&mut self, sql: &str, params: &[SqlValue]) -> Result<String> {
        let markers = marker_positions(sql);
        if markers.len() != params.len() {
            return Err(Error::unsupported(format!(
                "raw fragment with {} markers and {} parameters",
                markers.len(),
                params.len()
            )));
        }
        let mut out = String::with_capacity(sql.len());
        let mut last = 0;
        for (position, value) in markers.into_iter().zip(params) {
            out.push_str(&sql[last..position]);
            out.push_str(&self.value(&BoundValue::new(value.clone()))?);
            last = position + 1;
        }
        out.push_str(&sql[last..]);
        Ok(out)
    }

    fn operand(&mut self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Column(column) => Ok(self.column(column)),
            Operand::Value(value) => self.value(value),
            Operand::Arithmetic { op, left, right } => {
                let mut l = self.operand(left)?;
                if needs_parens(*op, left, false) {
                    l = format!("({l})");
                }
                let mut r = self.operand(right)?;
                if needs_parens(*op, right, true) {
                    r = format!("({r})");
                }
                Ok(format!("{l} {} {r}", op.as_sql()))
            }
        }
    }
}

fn marker_positions(sql: &str) -> Vec<usize> {
    let mut in_string = false;
    sql.char_indices()
        .filter_map(|(i, c)| {
            match c {
                '\'' => in_string = !in_string,
                '?' if !in_string => return Some(i),
                _ => {}
            }
            None
        })
        .collect()
}

fn needs_parens(parent: ArithmeticOp, child: &Operand, is_right: bool) -> bool {
    let Operand::Arithmetic { op, .. } = child else {
        return false;
    };
    if op.precedence() != parent.precedence() {
        return op.precedence() < parent.precedence();
    }
    is_right && !(*op == parent && parent.is_associative())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dialect::{MYSQL, POSTGRES, SQLITE, SQLSERVER};
    use crate::predicate::{ColumnRef, CompareOp};
    use crate::render::Renderer;
    use crate::sanitize::ValueMode;

    fn render(predicate: &Predicate, renderer: &Renderer) -> Result<(String, Vec<SqlValue>)> {
        let mut writer = Writer::new(renderer);
        let sql = writer.predicate(predicate, None)?;
        Ok(writer.finish(sql).into_parts())
    }

    fn sqlite(predicate: &Predicate) -> String {
        render(predicate, &Renderer::new(&SQLITE)).unwrap().0
    }

    fn cmp(column: &str, op: CompareOp, value: i64) -> Predicate {
        Predicate::Comparison {
            left: Operand::Column(ColumnRef::new(column)),
            op,
            right: Operand::Value(BoundValue::new(SqlValue::Int(value))),
        }
    }

    fn arith(op: ArithmeticOp, left: Operand, right: Operand) -> Operand {
        Operand::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn col(name: &str) -> Operand {
        Operand::Column(ColumnRef::new(name))
    }

    #[test]
    fn test_or_inside_and_gets_one_group() {
        let p = cmp("age", CompareOp::Gte, 25)
            .and(cmp("a", CompareOp::Eq, 1).or(cmp("b", CompareOp::Eq, 2)));
        assert_eq!(sqlite(&p), "age >= ? AND (a = ? OR b = ?)");
    }

    #[test]
    fn test_same_operator_chains_stay_flat() {
        let p = cmp("a", CompareOp::Eq, 1)
            .and(cmp("b", CompareOp::Eq, 2))
            .and(cmp("c", CompareOp::Eq, 3).and(cmp("d", CompareOp::Eq, 4)));
        assert_eq!(sqlite(&p), "a = ? AND b = ? AND c = ? AND d = ?");
    }

    #[test]
    fn test_negation() {
        let p = Predicate::Negation(Box::new(
            cmp("a", CompareOp::Eq, 1).or(cmp("b", CompareOp::Ne, 2)),
        ));
        assert_eq!(sqlite(&p), "NOT (a = ? OR b <> ?)");
        let p = Predicate::Negation(Box::new(Predicate::NullCheck {
            column: ColumnRef::new("a"),
            is_null: true,
        }));
        assert_eq!(sqlite(&p), "NOT a IS NULL");
    }

    #[test]
    fn test_arithmetic_parentheses() {
        let p = Predicate::Comparison {
            left: arith(
                ArithmeticOp::Mul,
                arith(ArithmeticOp::Add, col("a"), col("b")),
                col("c"),
            ),
            op: CompareOp::Gt,
            right: Operand::Value(BoundValue::new(SqlValue::Int(10))),
        };
        assert_eq!(sqlite(&p), "(a + b) * c > ?");

        let p = Predicate::Comparison {
            left: arith(
                ArithmeticOp::Sub,
                col("a"),
                arith(ArithmeticOp::Sub, col("b"), col("c")),
            ),
            op: CompareOp::Eq,
            right: arith(
                ArithmeticOp::Add,
                col("a"),
                arith(ArithmeticOp::Add, col("b"), col("c")),
            ),
        };
        assert_eq!(sqlite(&p), "a - (b - c) = a + b + c");

        let p = Predicate::Comparison {
            left: arith(
                ArithmeticOp::Add,
                arith(ArithmeticOp::Mul, col("a"), col("b")),
                col("c"),
            ),
            op: CompareOp::Lt,
            right: col("d"),
        };
        assert_eq!(sqlite(&p), "a * b + c < d");
    }

    #[test]
    fn test_like_with_escape_clause() {
        let p = Predicate::Like {
            column: ColumnRef::new("name"),
            pattern: String::from("%50\\%%"),
            escaped_wildcards: true,
            negated: false,
        };
        let (sql, params) = render(&p, &Renderer::new(&SQLITE)).unwrap();
        assert_eq!(sql, "name LIKE ? ESCAPE '\\'");
        assert_eq!(params, vec![SqlValue::Text(String::from("%50\\%%"))]);

        let (sql, _) = render(&p, &Renderer::new(&MYSQL).with_mode(ValueMode::Inline)).unwrap();
        assert_eq!(sql, "name LIKE '%50\\\\%%' ESCAPE '\\\\'");
    }

    #[test]
    fn test_not_like_without_escape() {
        let p = Predicate::Like {
            column: ColumnRef::new("name"),
            pattern: String::from("J%"),
            escaped_wildcards: false,
            negated: true,
        };
        assert_eq!(sqlite(&p), "name NOT LIKE ?");
    }

    #[test]
    fn test_membership_lists() {
        let list = |values: &[&str], negated| Predicate::Membership {
            column: ColumnRef::new("department"),
            source: MembershipSource::List(
                values
                    .iter()
                    .map(|v| BoundValue::new(SqlValue::Text((*v).to_string())))
                    .collect(),
            ),
            negated,
        };
        let (sql, params) = render(&list(&["Eng", "Sales", "HR"], false), &Renderer::new(&POSTGRES))
            .unwrap();
        assert_eq!(sql, "department IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);

        assert_eq!(sqlite(&list(&[], false)), "1 = 0");
        assert_eq!(sqlite(&list(&[], true)), "1 = 1");

        let renderer = Renderer::new(&SQLITE.with_inline_list_threshold(2));
        let (sql, params) = render(&list(&["a", "o'b", "c"], true), &renderer).unwrap();
        assert_eq!(sql, "department NOT IN ('a', 'o''b', 'c')");
        assert!(params.is_empty());
    }

    #[test]
    fn test_raw_fragment_markers() {
        let raw = Predicate::Raw {
            sql: String::from("name <> '?' AND age > ?"),
            params: vec![SqlValue::Int(30)],
        };
        let (sql, params) = render(&raw, &Renderer::new(&SQLSERVER)).unwrap();
        assert_eq!(sql, "name <> '?' AND age > @p0");
        assert_eq!(params, vec![SqlValue::Int(30)]);

        let p = cmp("a", CompareOp::Eq, 1).and(raw);
        assert_eq!(sqlite(&p), "a = ? AND (name <> '?' AND age > ?)");
    }

    #[test]
    fn test_raw_fragment_count_mismatch() {
        let too_many = Predicate::Raw {
            sql: String::from("a = ?"),
            params: vec![SqlValue::Int(1), SqlValue::Int(2)],
        };
        assert!(matches!(
            render(&too_many, &Renderer::new(&SQLITE)),
            Err(Error::UnsupportedExpression { .. })
        ));
        let too_few = Predicate::Raw {
            sql: String::from("a = ? OR b = ?"),
            params: vec![SqlValue::Int(1)],
        };
        assert!(matches!(
            render(&too_few, &Renderer::new(&SQLITE)),
            Err(Error::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_exists_and_subquery_membership() {
        let p = Predicate::Exists {
            subquery: Subquery::Raw(String::from("SELECT 1 FROM orders WHERE orders.employee_id = employees.id")),
            negated: true,
        };
        assert_eq!(
            sqlite(&p),
            "NOT EXISTS (SELECT 1 FROM orders WHERE orders.employee_id = employees.id)"
        );
        let p = Predicate::Membership {
            column: ColumnRef::new("id"),
            source: MembershipSource::Subquery(Subquery::Raw(String::from("SELECT employee_id FROM orders"))),
            negated: false,
        };
        assert_eq!(sqlite(&p), "id IN (SELECT employee_id FROM orders)");
    }

    #[test]
    fn test_inline_values() {
        let p = cmp("age", CompareOp::Gte, 25).and(Predicate::Comparison {
            left: col("active"),
            op: CompareOp::Eq,
            right: Operand::Value(BoundValue::new(SqlValue::Bool(true))),
        });
        let (sql, params) =
            render(&p, &Renderer::new(&SQLSERVER).with_mode(ValueMode::Inline)).unwrap();
        assert_eq!(sql, "age >= 25 AND active = 1");
        assert!(params.is_empty());
    }
}
