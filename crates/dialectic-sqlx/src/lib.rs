//! sqlx adapter for dialectic.
//!
//! [`SqliteExecutor`] runs [`RenderedQuery`] values against a SQLite pool,
//! binding parameters in placeholder order. Errors are `sqlx::Error`
//! unchanged.
//!
//! ```rust,no_run
//! use dialectic_core::dialect::SQLITE;
//! use dialectic_core::execute::AsyncExecutor;
//! use dialectic_core::render::render;
//! use dialectic_core::spec::{QuerySpec, Source};
//! use dialectic_sqlx::SqliteExecutor;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//! let executor = SqliteExecutor::new(pool);
//! let mut spec = QuerySpec::new(Source::Table(String::from("users")));
//! spec.skip = Some(10);
//! let rows = executor.query(&render(&spec, &SQLITE)?).await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

use dialectic_core::builder::SqlValue;
use dialectic_core::execute::AsyncExecutor;
use dialectic_core::render::RenderedQuery;
use dialectic_core::sanitize::format_datetime;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

/// Runs rendered queries on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wraps a pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AsyncExecutor for SqliteExecutor {
    type Row = SqliteRow;
    type Error = sqlx::Error;

    async fn query(&self, query: &RenderedQuery) -> Result<Vec<SqliteRow>, sqlx::Error> {
        debug!(sql = query.sql(), params = query.params().len(), "query");
        prepare(query).fetch_all(&self.pool).await
    }

    async fn query_scalar(&self, query: &RenderedQuery) -> Result<Option<SqlValue>, sqlx::Error> {
        debug!(sql = query.sql(), params = query.params().len(), "query_scalar");
        match prepare(query).fetch_optional(&self.pool).await? {
            Some(row) if !row.is_empty() => decode_column(&row, 0).map(Some),
            _ => Ok(None),
        }
    }

    async fn execute(&self, query: &RenderedQuery) -> Result<u64, sqlx::Error> {
        debug!(sql = query.sql(), params = query.params().len(), "execute");
        let result = prepare(query).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn prepare(query: &RenderedQuery) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    query
        .params()
        .iter()
        .fold(sqlx::query(query.sql()), bind_param)
}

/// Binds a value to a query.
fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::DateTime(dt) => query.bind(format_datetime(dt)),
        // Rendered parameters never carry enums.
        SqlValue::Enum(e) => query.bind(e.name.clone()),
    }
}

/// Reads a column using the value's runtime storage class.
///
/// # Errors
///
/// Returns `sqlx::Error` for an out-of-range index or an undecodable value.
pub fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();
    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get(index)?),
        "REAL" => SqlValue::Float(row.try_get(index)?),
        "BLOB" => SqlValue::Blob(row.try_get(index)?),
        _ => SqlValue::Text(row.try_get(index)?),
    })
}
