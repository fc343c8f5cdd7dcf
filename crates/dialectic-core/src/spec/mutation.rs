//! Mutation statement specifications.

use serde::{Deserialize, Serialize};

use crate::predicate::{BoundValue, Predicate};

/// `INSERT INTO table (columns) VALUES (...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertSpec {
    /// Target table.
    pub table: String,
    /// Column names, in value order.
    pub columns: Vec<String>,
    /// One value slot per column.
    pub values: Vec<BoundValue>,
}

/// One `column = value` pair of an UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Column name.
    pub column: String,
    /// New value.
    pub value: BoundValue,
}

/// `UPDATE table SET ... [WHERE ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSpec {
    /// Target table.
    pub table: String,
    /// Assignments, in call order.
    pub assignments: Vec<Assignment>,
    /// WHERE predicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Predicate>,
}

/// `DELETE FROM table [WHERE ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSpec {
    /// Target table.
    pub table: String,
    /// WHERE predicate; `None` only when every row was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Predicate>,
}
