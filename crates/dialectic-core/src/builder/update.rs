//! UPDATE builder.

use std::fmt;
use std::marker::PhantomData;

use super::bind_column;
use super::expr::Condition;
use super::value::ToSqlValue;
use crate::error::{Error, Result};
use crate::predicate::{compile, Predicate};
use crate::schema::Entity;
use crate::spec::{Assignment, UpdateSpec};

/// Builds an UPDATE for the entity `E`.
pub struct Update<E> {
    assignments: Vec<Assignment>,
    filter: Option<Predicate>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for Update<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("assignments", &self.assignments)
            .field("filter", &self.filter)
            .finish()
    }
}

impl<E: Entity> Default for Update<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Update<E> {
    /// Starts an empty UPDATE.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            assignments: vec![],
            filter: None,
            _entity: PhantomData,
        }
    }

    /// Adds `column = value`.
    ///
    /// # Errors
    ///
    /// Fails for an unknown column, a value of the wrong type, or NULL in
    /// a non-nullable column.
    pub fn set<T: ToSqlValue>(mut self, column: &str, value: T) -> Result<Self> {
        let descriptor = E::descriptor().require_column(column)?;
        self.assignments.push(Assignment {
            column: String::from(column),
            value: bind_column(descriptor, value.to_sql_value())?,
        });
        Ok(self)
    }

    /// Adds a WHERE condition, combined with earlier ones by AND.
    ///
    /// # Errors
    ///
    /// Returns the compiler's error if the condition is invalid for `E`.
    pub fn filter(mut self, condition: impl Into<Condition>) -> Result<Self> {
        let predicate = compile(&condition.into(), E::descriptor())?;
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        Ok(self)
    }

    /// Finishes the statement.
    ///
    /// # Errors
    ///
    /// Fails when nothing is assigned.
    pub fn build(self) -> Result<UpdateSpec> {
        if self.assignments.is_empty() {
            return Err(Error::unsupported("UPDATE without assignments"));
        }
        Ok(UpdateSpec {
            table: E::descriptor().table().to_string(),
            assignments: self.assignments,
            filter: self.filter,
        })
    }
}
