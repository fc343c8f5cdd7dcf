//! INSERT builder.

use std::fmt;
use std::marker::PhantomData;

use super::bind_column;
use super::value::ToSqlValue;
use crate::error::{Error, Result};
use crate::predicate::BoundValue;
use crate::schema::Entity;
use crate::spec::InsertSpec;

/// Builds a single-row INSERT for the entity `E`.
///
/// Values are checked against the declared column types and carry the
/// column's enum storage, so they are stored exactly as filters compare
/// them.
pub struct Insert<E> {
    columns: Vec<String>,
    values: Vec<BoundValue>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for Insert<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Insert")
            .field("columns", &self.columns)
            .field("values", &self.values)
            .finish()
    }
}

impl<E: Entity> Default for Insert<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Insert<E> {
    /// Starts an empty INSERT.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: vec![],
            values: vec![],
            _entity: PhantomData,
        }
    }

    /// Sets the value of a column.
    ///
    /// # Errors
    ///
    /// Fails for an unknown or repeated column, a value of the wrong type,
    /// or NULL in a non-nullable column.
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Result<Self> {
        let descriptor = E::descriptor().require_column(column)?;
        if self.columns.iter().any(|c| c == column) {
            return Err(Error::unsupported(format!("column `{column}` assigned twice")));
        }
        self.values.push(bind_column(descriptor, value.to_sql_value())?);
        self.columns.push(String::from(column));
        Ok(self)
    }

    /// Finishes the statement.
    ///
    /// # Errors
    ///
    /// Fails when no column was set.
    pub fn build(self) -> Result<InsertSpec> {
        if self.columns.is_empty() {
            return Err(Error::unsupported("INSERT without values"));
        }
        Ok(InsertSpec {
            table: E::descriptor().table().to_string(),
            columns: self.columns,
            values: self.values,
        })
    }
}
