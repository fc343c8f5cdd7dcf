//! DELETE builder using the typestate pattern.
//!
//! A DELETE can only be built after a filter was added or every row was
//! explicitly requested with [`Delete::all_rows`], so an accidental
//! table-wide delete does not compile.

use std::fmt;
use std::marker::PhantomData;

use super::expr::Condition;
use crate::error::Result;
use crate::predicate::{compile, Predicate};
use crate::schema::Entity;
use crate::spec::DeleteSpec;

/// Marker: no filter yet.
pub struct Unfiltered;
/// Marker: filtered, or every row requested.
pub struct Filtered;

/// Builds a DELETE for the entity `E`.
pub struct Delete<E, State = Unfiltered> {
    filter: Option<Predicate>,
    _state: PhantomData<(fn() -> E, State)>,
}

impl<E, State> fmt::Debug for Delete<E, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delete")
            .field("filter", &self.filter)
            .finish()
    }
}

impl<E: Entity> Default for Delete<E, Unfiltered> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity, State> Delete<E, State> {
    fn and_filter(self, condition: Condition) -> Result<Delete<E, Filtered>> {
        let predicate = compile(&condition, E::descriptor())?;
        Ok(Delete {
            filter: Some(match self.filter {
                Some(existing) => existing.and(predicate),
                None => predicate,
            }),
            _state: PhantomData,
        })
    }
}

impl<E: Entity> Delete<E, Unfiltered> {
    /// Starts a DELETE.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: None,
            _state: PhantomData,
        }
    }

    /// Adds a WHERE condition.
    ///
    /// # Errors
    ///
    /// Returns the compiler's error if the condition is invalid for `E`.
    pub fn filter(self, condition: impl Into<Condition>) -> Result<Delete<E, Filtered>> {
        self.and_filter(condition.into())
    }

    /// Deletes every row of the table.
    #[must_use]
    pub fn all_rows(self) -> Delete<E, Filtered> {
        Delete {
            filter: None,
            _state: PhantomData,
        }
    }
}

impl<E: Entity> Delete<E, Filtered> {
    /// Adds another WHERE condition, combined by AND.
    ///
    /// # Errors
    ///
    /// Returns the compiler's error if the condition is invalid for `E`.
    pub fn filter(self, condition: impl Into<Condition>) -> Result<Self> {
        self.and_filter(condition.into())
    }

    /// Finishes the statement.
    #[must_use]
    pub fn build(self) -> DeleteSpec {
        DeleteSpec {
            table: E::descriptor().table().to_string(),
            filter: self.filter,
        }
    }
}
