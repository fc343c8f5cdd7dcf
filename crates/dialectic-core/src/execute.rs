//! Execution adapter contract.
//!
//! The engine stops at [`RenderedQuery`]. Adapters own connections,
//! transactions and row mapping, and report failures in their own error
//! type.

use crate::builder::value::SqlValue;
use crate::render::RenderedQuery;

/// A blocking executor.
pub trait Executor {
    /// A fetched row.
    type Row;
    /// The adapter's error type.
    type Error;

    /// Runs a query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    fn query(&mut self, query: &RenderedQuery) -> Result<Vec<Self::Row>, Self::Error>;

    /// Runs a query and returns the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    fn query_scalar(&mut self, query: &RenderedQuery) -> Result<Option<SqlValue>, Self::Error>;

    /// Runs a statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    fn execute(&mut self, query: &RenderedQuery) -> Result<u64, Self::Error>;
}

/// An async executor.
#[allow(async_fn_in_trait)]
pub trait AsyncExecutor {
    /// A fetched row.
    type Row;
    /// The adapter's error type.
    type Error;

    /// Runs a query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    async fn query(&self, query: &RenderedQuery) -> Result<Vec<Self::Row>, Self::Error>;

    /// Runs a query and returns the first column of the first row, if any.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    async fn query_scalar(&self, query: &RenderedQuery) -> Result<Option<SqlValue>, Self::Error>;

    /// Runs a statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error unchanged.
    async fn execute(&self, query: &RenderedQuery) -> Result<u64, Self::Error>;
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::dialect::SQLITE;
    use crate::render::render;
    use crate::spec::{QuerySpec, Source};

    /// Records statements and replays canned results.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        rows: VecDeque<Vec<SqlValue>>,
    }

    impl Executor for Recorder {
        type Row = Vec<SqlValue>;
        type Error = String;

        fn query(&mut self, query: &RenderedQuery) -> Result<Vec<Self::Row>, Self::Error> {
            self.seen.push(query.sql().to_string());
            Ok(self.rows.drain(..).collect())
        }

        fn query_scalar(&mut self, query: &RenderedQuery) -> Result<Option<SqlValue>, Self::Error> {
            self.seen.push(query.sql().to_string());
            Ok(self.rows.pop_front().and_then(|row| row.into_iter().next()))
        }

        fn execute(&mut self, query: &RenderedQuery) -> Result<u64, Self::Error> {
            if query.sql().is_empty() {
                return Err(String::from("empty statement"));
            }
            self.seen.push(query.sql().to_string());
            Ok(1)
        }
    }

    #[test]
    fn test_executor_receives_rendered_sql() {
        let query = render(&QuerySpec::new(Source::Table(String::from("users"))), &SQLITE).unwrap();
        let mut recorder = Recorder::default();
        recorder.rows.push_back(vec![SqlValue::Int(3)]);

        assert_eq!(recorder.query_scalar(&query).unwrap(), Some(SqlValue::Int(3)));
        assert_eq!(recorder.query(&query).unwrap().len(), 0);
        assert_eq!(recorder.execute(&query).unwrap(), 1);
        assert_eq!(recorder.seen, vec!["SELECT * FROM users"; 3]);
    }
}
