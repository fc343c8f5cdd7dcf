//! SQL rendering.
//!
//! A single [`Renderer`], parameterized by a [`DialectProfile`], walks a
//! specification once, clause by clause, and produces a [`RenderedQuery`].
//! Rendering is pure: the same specification and profile always give the
//! same SQL and parameters.

mod mutation;
mod pagination;
mod predicate;
mod select;
mod window;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::builder::value::SqlValue;
use crate::dialect::{DialectKind, DialectProfile};
use crate::error::Result;
use crate::predicate::{BoundValue, ColumnRef};
use crate::sanitize::{ParameterList, Sanitizer, ValueMode};
use crate::spec::QuerySpec;

/// SQL text with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuery {
    sql: String,
    params: Vec<SqlValue>,
}

impl RenderedQuery {
    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Consumes the query.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

/// Serializable render configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Target dialect.
    pub dialect: DialectKind,
    /// Parameters or inline literals.
    pub mode: ValueMode,
    /// Overrides the dialect's IN-list threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_list_threshold: Option<usize>,
}

impl RenderOptions {
    /// Creates a renderer for these options.
    #[must_use]
    pub fn renderer(&self) -> Renderer {
        let mut profile = *self.dialect.profile();
        if let Some(threshold) = self.inline_list_threshold {
            profile = profile.with_inline_list_threshold(threshold);
        }
        Renderer::new(&profile).with_mode(self.mode)
    }
}

/// Renders specifications for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    profile: DialectProfile,
    mode: ValueMode,
}

impl Renderer {
    /// Creates a parameterizing renderer.
    #[must_use]
    pub const fn new(profile: &DialectProfile) -> Self {
        Self {
            profile: *profile,
            mode: ValueMode::Parameterized,
        }
    }

    /// Sets the value mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the profile.
    #[must_use]
    pub const fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    /// Renders a SELECT specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`](crate::Error::UnsupportedFeature)
    /// when the dialect cannot express the query and
    /// [`Error::UnsupportedType`](crate::Error::UnsupportedType) for values
    /// that cannot be inlined.
    pub fn render(&self, spec: &QuerySpec) -> Result<RenderedQuery> {
        let mut writer = Writer::new(self);
        let sql = writer.query(spec)?;
        Ok(writer.finish(sql))
    }
}

/// Renders a specification with bound parameters.
///
/// # Errors
///
/// See [`Renderer::render`].
pub fn render(spec: &QuerySpec, profile: &DialectProfile) -> Result<RenderedQuery> {
    Renderer::new(profile).render(spec)
}

/// Per-render state: the sanitizer, the shared parameter list and the
/// qualifier applied to bare columns of the statement being written.
struct Writer<'r> {
    sanitizer: Sanitizer<'r>,
    mode: ValueMode,
    params: ParameterList,
    qualifier: Option<String>,
    /// Derived tables written so far; numbers their aliases.
    derived: usize,
}

impl<'r> Writer<'r> {
    fn new(renderer: &'r Renderer) -> Self {
        Self {
            sanitizer: Sanitizer::new(&renderer.profile),
            mode: renderer.mode,
            params: ParameterList::new(renderer.profile.placeholder),
            qualifier: None,
            derived: 0,
        }
    }

    fn profile(&self) -> &'r DialectProfile {
        self.sanitizer.profile()
    }

    fn ident(&self, name: &str) -> String {
        self.sanitizer.sanitize_identifier(name)
    }

    fn column(&self, column: &ColumnRef) -> String {
        let name = self.ident(&column.name);
        match column.table.as_deref().or(self.qualifier.as_deref()) {
            Some(table) => format!("{}.{name}", self.ident(table)),
            None => name,
        }
    }

    fn value(&mut self, bound: &BoundValue) -> Result<String> {
        self.sanitizer.format_value(bound, self.mode, &mut self.params)
    }

    fn finish(self, sql: String) -> RenderedQuery {
        debug!(
            dialect = self.profile().name,
            params = self.params.len(),
            "rendered query"
        );
        trace!(%sql, "sql");
        RenderedQuery {
            sql,
            params: self.params.into_values(),
        }
    }
}
