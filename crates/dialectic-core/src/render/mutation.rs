//! INSERT, UPDATE and DELETE statements.

use super::{RenderedQuery, Renderer, Writer};
use crate::error::Result;
use crate::spec::{DeleteSpec, InsertSpec, UpdateSpec};

impl Renderer {
    /// Renders `INSERT INTO table (columns) VALUES (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`](crate::Error::UnsupportedType) for
    /// values that cannot be inlined.
    pub fn render_insert(&self, spec: &InsertSpec) -> Result<RenderedQuery> {
        let mut writer = Writer::new(self);
        let columns: Vec<_> = spec.columns.iter().map(|c| writer.ident(c)).collect();
        let mut values = Vec::with_capacity(spec.values.len());
        for value in &spec.values {
            values.push(writer.value(value)?);
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            writer.ident(&spec.table),
            columns.join(", "),
            values.join(", ")
        );
        Ok(writer.finish(sql))
    }

    /// Renders `UPDATE table SET ... [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// See [`Renderer::render`].
    pub fn render_update(&self, spec: &UpdateSpec) -> Result<RenderedQuery> {
        let mut writer = Writer::new(self);
        let mut assignments = Vec::with_capacity(spec.assignments.len());
        for assignment in &spec.assignments {
            let value = writer.value(&assignment.value)?;
            assignments.push(format!("{} = {value}", writer.ident(&assignment.column)));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            writer.ident(&spec.table),
            assignments.join(", ")
        );
        if let Some(filter) = &spec.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&writer.predicate(filter, None)?);
        }
        Ok(writer.finish(sql))
    }

    /// Renders `DELETE FROM table [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// See [`Renderer::render`].
    pub fn render_delete(&self, spec: &DeleteSpec) -> Result<RenderedQuery> {
        let mut writer = Writer::new(self);
        let mut sql = format!("DELETE FROM {}", writer.ident(&spec.table));
        if let Some(filter) = &spec.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&writer.predicate(filter, None)?);
        }
        Ok(writer.finish(sql))
    }
}
