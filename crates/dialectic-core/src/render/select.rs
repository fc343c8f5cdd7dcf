//! SELECT statements, CTEs and set operations.

use super::Writer;
use crate::error::{Error, Result};
use crate::spec::{
    validate_set_operand, AggregateFunction, AggregateSpec, CteBody, CteSpec, Projection,
    QuerySpec, SetOpKind,
};

impl Writer<'_> {
    /// Writes a complete SELECT, including its CTEs, set operation, ORDER
    /// BY and pagination.
    pub(super) fn query(&mut self, spec: &QuerySpec) -> Result<String> {
        let mut sql = String::new();
        if !spec.ctes.is_empty() {
            sql.push_str(&self.with_clause(&spec.ctes)?);
            sql.push(' ');
        }
        let outer = self.qualifier.take();
        self.qualifier = (!spec.joins.is_empty()).then(|| spec.source.name().to_string());
        let body = self.query_body(spec);
        self.qualifier = outer;
        sql.push_str(&body?);
        Ok(sql)
    }

    fn query_body(&mut self, spec: &QuerySpec) -> Result<String> {
        let mut sql = self.select_core(spec)?;
        if let Some(op) = &spec.set_op {
            validate_set_operand(&op.right)?;
            if matches!(op.kind, SetOpKind::Intersect | SetOpKind::Except)
                && !self.profile().supports_intersect_except
            {
                return Err(Error::UnsupportedFeature {
                    feature: op.kind.as_sql(),
                    dialect: self.profile().name,
                });
            }
            let right = self.set_operand(&op.right)?;
            sql.push(' ');
            sql.push_str(op.kind.as_sql());
            sql.push(' ');
            sql.push_str(&right);
        }
        let ordered = self.order_by(spec, &mut sql);
        self.pagination(spec, ordered, &mut sql);
        Ok(sql)
    }

    /// Writes the right side of a set operation. A compound right side is
    /// wrapped in a derived table so it groups the same way on every
    /// backend; SQLite accepts no parentheses around compound members.
    fn set_operand(&mut self, right: &QuerySpec) -> Result<String> {
        let sql = self.query(right)?;
        if right.set_op.is_none() {
            return Ok(sql);
        }
        self.derived += 1;
        let alias = format!("compound_{}", self.derived);
        Ok(format!("SELECT * FROM ({sql}) AS {}", self.ident(&alias)))
    }

    fn with_clause(&mut self, ctes: &[CteSpec]) -> Result<String> {
        let profile = self.profile();
        if !profile.supports_cte {
            return Err(Error::UnsupportedFeature {
                feature: "common table expressions",
                dialect: profile.name,
            });
        }
        let mut sql = String::from("WITH ");
        if profile.recursive_keyword && ctes.iter().any(CteSpec::is_recursive) {
            sql.push_str("RECURSIVE ");
        }
        for (i, cte) in ctes.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&self.ident(&cte.name));
            if !cte.columns.is_empty() {
                let columns: Vec<_> = cte.columns.iter().map(|c| self.ident(c)).collect();
                sql.push_str(&format!(" ({})", columns.join(", ")));
            }
            sql.push_str(" AS (");
            sql.push_str(&self.cte_body(&cte.body)?);
            if let Some(recursive) = &cte.recursive {
                sql.push_str(" UNION ALL ");
                sql.push_str(&self.cte_body(recursive)?);
            }
            sql.push(')');
        }
        Ok(sql)
    }

    fn cte_body(&mut self, body: &CteBody) -> Result<String> {
        match body {
            CteBody::Raw(sql) => Ok(sql.clone()),
            CteBody::Query(spec) => self.query(spec),
        }
    }

    fn select_core(&mut self, spec: &QuerySpec) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if spec.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select_list(spec)?);
        sql.push_str(" FROM ");
        sql.push_str(&self.ident(spec.source.name()));

        for join in &spec.joins {
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&self.ident(&join.table));
            if join.alias != join.table {
                sql.push_str(" AS ");
                sql.push_str(&self.ident(&join.alias));
            }
            sql.push_str(&format!(
                " ON {} = {}.{}",
                self.column(&join.left_column),
                self.ident(&join.alias),
                self.ident(&join.right_column)
            ));
        }

        if let Some(filter) = &spec.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(filter, None)?);
        }

        if !spec.group_by.is_empty() {
            let columns: Vec<_> = spec.group_by.iter().map(|c| self.column(c)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }
        Ok(sql)
    }

    fn select_list(&mut self, spec: &QuerySpec) -> Result<String> {
        let mut items = vec![];
        match &spec.projection {
            Projection::Star if spec.joins.is_empty() => items.push(String::from("*")),
            Projection::Star => items.push(format!("{}.*", self.ident(spec.source.name()))),
            Projection::Columns(columns) => {
                for c in columns {
                    let mut item = self.column(&c.column);
                    if let Some(alias) = &c.alias {
                        item.push_str(" AS ");
                        item.push_str(&self.ident(alias));
                    }
                    items.push(item);
                }
            }
        }
        for join in &spec.joins {
            for c in &join.columns {
                let mut item = self.column(&c.column);
                if let Some(alias) = &c.alias {
                    item.push_str(" AS ");
                    item.push_str(&self.ident(alias));
                }
                items.push(item);
            }
        }
        for window in &spec.windows {
            items.push(self.window(window)?);
        }
        for aggregate in &spec.aggregates {
            items.push(self.aggregate(aggregate));
        }
        if items.is_empty() {
            items.push(String::from("*"));
        }
        Ok(items.join(", "))
    }

    fn aggregate(&self, aggregate: &AggregateSpec) -> String {
        let argument = match (&aggregate.column, aggregate.function) {
            (None, _) => String::from("*"),
            (Some(c), AggregateFunction::CountDistinct) => format!("DISTINCT {}", self.column(c)),
            (Some(c), _) => self.column(c),
        };
        format!(
            "{}({argument}) AS {}",
            aggregate.function.as_sql(),
            self.ident(&aggregate.alias)
        )
    }

    /// Writes ORDER BY; returns whether anything was written.
    fn order_by(&self, spec: &QuerySpec, sql: &mut String) -> bool {
        if spec.order_by.is_empty() {
            return false;
        }
        let is_alias = |name: &str| {
            spec.aggregates.iter().any(|a| a.alias == name)
                || spec.windows.iter().any(|w| w.alias == name)
        };
        let keys: Vec<_> = spec
            .order_by
            .iter()
            .map(|key| {
                // Compound results only expose output names.
                let column = if spec.set_op.is_some() || is_alias(&key.column.name) {
                    self.ident(&key.column.name)
                } else {
                    self.column(&key.column)
                };
                if key.descending {
                    format!("{column} DESC")
                } else {
                    column
                }
            })
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
        true
    }
}
