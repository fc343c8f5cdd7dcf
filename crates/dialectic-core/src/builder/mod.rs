//! Fluent builders.
//!
//! [`QueryBuilder`] accumulates a [`QuerySpec`](crate::spec::QuerySpec) for
//! an entity; [`Insert`], [`Update`] and [`Delete`] produce mutation
//! statements. Conditions are written with [`col`] and the [`Condition`]
//! combinators.
//!
//! # Example
//!
//! ```rust
//! use dialectic_core::builder::col;
//! use dialectic_core::dialect::SQLITE;
//! use dialectic_core::render::render;
//! use dialectic_core::schema::{ColumnDescriptor, ColumnType, Entity, EntityDescriptor};
//! use std::sync::OnceLock;
//!
//! struct User;
//!
//! impl Entity for User {
//!     fn descriptor() -> &'static EntityDescriptor {
//!         static D: OnceLock<EntityDescriptor> = OnceLock::new();
//!         D.get_or_init(|| {
//!             EntityDescriptor::builder("users")
//!                 .column(ColumnDescriptor::new("id", ColumnType::Integer).primary_key())
//!                 .column(ColumnDescriptor::new("name", ColumnType::Text))
//!                 .build()
//!         })
//!     }
//! }
//!
//! # fn main() -> dialectic_core::Result<()> {
//! let spec = User::query()
//!     .filter(col("name").eq("Alice"))?
//!     .order_by("id")?
//!     .skip(10)?
//!     .build();
//! let query = render(&spec, &SQLITE)?;
//! assert_eq!(
//!     query.sql(),
//!     "SELECT id, name FROM users WHERE name = ? ORDER BY id LIMIT -1 OFFSET 10"
//! );
//! # Ok(())
//! # }
//! ```

mod delete;
pub mod expr;
mod insert;
mod query;
mod update;
pub mod value;
mod window;

pub use delete::{Delete, Filtered, Unfiltered};
pub use expr::{col, exists, lit, not_exists, Condition, Expr, IntoExpr};
pub use insert::Insert;
pub use query::QueryBuilder;
pub use update::Update;
pub use value::{EnumValue, SqlEnum, SqlValue, ToSqlValue};
pub use window::WindowBuilder;

use crate::error::{Error, Result};
use crate::predicate::BoundValue;
use crate::schema::{ColumnDescriptor, ColumnType};

/// Checks a value written to a column and attaches the column's enum
/// storage.
pub(crate) fn bind_column(column: &ColumnDescriptor, value: SqlValue) -> Result<BoundValue> {
    if value.is_null() && !column.nullable {
        return Err(Error::TypeMismatch {
            column: column.name.clone(),
            expected: format!("non-null {}", column.column_type),
            found: String::from(value.kind()),
        });
    }
    if !column.accepts(&value) {
        return Err(Error::TypeMismatch {
            column: column.name.clone(),
            expected: column.expected(),
            found: String::from(value.kind()),
        });
    }
    let storage = if column.column_type == ColumnType::Enum {
        column.enum_storage
    } else {
        None
    };
    Ok(BoundValue::with_storage(value, storage))
}
