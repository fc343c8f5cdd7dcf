//! # dialectic-core
//!
//! A query compilation engine that turns typed conditions over entities into
//! SQL for several relational backends.
//!
//! This crate provides:
//! - A predicate compiler validating every column against the entity
//! - A query specification builder (filters, ordering, pagination, joins,
//!   aggregates, window functions, CTEs and set operations)
//! - Dialect profiles for SQLite, PostgreSQL, MySQL, SQL Server, DuckDB and
//!   generic ANSI SQL
//! - A single renderer emitting parameterized SQL for any profile
//!
//! ## Rendering for several dialects
//!
//! ```rust
//! use dialectic_core::builder::col;
//! use dialectic_core::dialect::{POSTGRES, SQLITE, SQLSERVER};
//! use dialectic_core::render::render;
//! use dialectic_core::schema::{ColumnDescriptor, ColumnType, Entity, EntityDescriptor};
//! use std::sync::OnceLock;
//!
//! struct Employee;
//!
//! impl Entity for Employee {
//!     fn descriptor() -> &'static EntityDescriptor {
//!         static D: OnceLock<EntityDescriptor> = OnceLock::new();
//!         D.get_or_init(|| {
//!             EntityDescriptor::builder("employees")
//!                 .column(ColumnDescriptor::new("id", ColumnType::Integer).primary_key())
//!                 .column(ColumnDescriptor::new("age", ColumnType::Integer))
//!                 .build()
//!         })
//!     }
//! }
//!
//! # fn main() -> dialectic_core::Result<()> {
//! let spec = Employee::query()
//!     .filter(col("age").gt_eq(25))?
//!     .skip(10)?
//!     .build();
//!
//! assert_eq!(
//!     render(&spec, &POSTGRES)?.sql(),
//!     "SELECT id, age FROM employees WHERE age >= $1 LIMIT ALL OFFSET 10"
//! );
//! assert_eq!(
//!     render(&spec, &SQLSERVER)?.sql(),
//!     "SELECT id, age FROM employees WHERE age >= @p0 ORDER BY (SELECT NULL) OFFSET 10 ROWS"
//! );
//! assert_eq!(render(&spec, &SQLITE)?.params().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are bound as parameters by default. Inline rendering escapes
//! every literal for the target dialect, and identifiers are quoted only
//! when they need it.

pub mod builder;
pub mod dialect;
pub mod error;
pub mod execute;
pub mod predicate;
pub mod render;
pub mod sanitize;
pub mod schema;
pub mod spec;

pub use builder::{col, lit, Condition, Expr, QueryBuilder, SqlValue};
pub use dialect::{DialectKind, DialectProfile};
pub use error::{Error, Phase, Result};
pub use render::{render, RenderOptions, RenderedQuery, Renderer};
pub use schema::{Entity, EntityDescriptor};
pub use spec::QuerySpec;

