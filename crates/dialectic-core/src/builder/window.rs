//! Window column builder.

use super::query::{check_aggregate_input, QueryBuilder};
use crate::error::{Error, Result};
use crate::predicate::ColumnRef;
use crate::schema::Entity;
use crate::spec::{AggregateFunction, OrderKey, WindowFrame, WindowFunction, WindowSpec};

/// Describes one `FN(...) OVER (...)` column. Columns are validated when
/// the window is closed with [`WindowBuilder::end_window`].
#[derive(Debug)]
pub struct WindowBuilder<E> {
    query: QueryBuilder<E>,
    function: WindowFunction,
    alias: String,
    partition_by: Vec<String>,
    order_by: Vec<(String, bool)>,
    frame: WindowFrame,
}

impl<E: Entity> WindowBuilder<E> {
    pub(super) fn new(query: QueryBuilder<E>, function: WindowFunction, alias: &str) -> Self {
        Self {
            query,
            function,
            alias: String::from(alias),
            partition_by: vec![],
            order_by: vec![],
            frame: WindowFrame::None,
        }
    }

    /// Adds a `PARTITION BY` column.
    #[must_use]
    pub fn partition_by(mut self, column: &str) -> Self {
        self.partition_by.push(String::from(column));
        self
    }

    /// Adds an ascending `ORDER BY` key inside the window.
    #[must_use]
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((String::from(column), false));
        self
    }

    /// Adds a descending `ORDER BY` key inside the window.
    #[must_use]
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((String::from(column), true));
        self
    }

    /// Sets the frame clause.
    #[must_use]
    pub const fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = frame;
        self
    }

    fn column(&self, column: &ColumnRef) -> Result<ColumnRef> {
        Ok(self.query.resolve(&column.to_string())?.column)
    }

    fn function(&self) -> Result<WindowFunction> {
        Ok(match &self.function {
            WindowFunction::Ntile(0) => return Err(Error::unsupported("NTILE(0)")),
            WindowFunction::Lag { column, offset } => WindowFunction::Lag {
                column: self.column(column)?,
                offset: *offset,
            },
            WindowFunction::Lead { column, offset } => WindowFunction::Lead {
                column: self.column(column)?,
                offset: *offset,
            },
            WindowFunction::FirstValue(column) => WindowFunction::FirstValue(self.column(column)?),
            WindowFunction::LastValue(column) => WindowFunction::LastValue(self.column(column)?),
            WindowFunction::Aggregate { function, .. }
                if *function == AggregateFunction::CountDistinct =>
            {
                return Err(Error::unsupported("COUNT(DISTINCT) over a window"));
            }
            WindowFunction::Aggregate {
                function,
                column: Some(column),
            } => {
                let projected = self.query.resolve(&column.to_string())?;
                check_aggregate_input(*function, &projected)?;
                WindowFunction::Aggregate {
                    function: *function,
                    column: Some(projected.column),
                }
            }
            WindowFunction::Aggregate {
                function,
                column: None,
            } if *function != AggregateFunction::Count => {
                return Err(Error::unsupported(format!("{}(*)", function.as_sql())));
            }
            other => other.clone(),
        })
    }

    /// Validates the window and adds it to the query.
    ///
    /// # Errors
    ///
    /// Fails for unknown columns, `NTILE(0)`, `COUNT(DISTINCT)` and
    /// non-numeric SUM or AVG arguments.
    pub fn end_window(self) -> Result<QueryBuilder<E>> {
        let function = self.function()?;
        let partition_by = self
            .partition_by
            .iter()
            .map(|name| Ok(self.query.resolve(name)?.column))
            .collect::<Result<Vec<_>>>()?;
        let order_by = self
            .order_by
            .iter()
            .map(|(name, descending)| {
                Ok(OrderKey {
                    column: self.query.resolve(name)?.column,
                    descending: *descending,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let window = WindowSpec {
            function,
            alias: self.alias,
            partition_by,
            order_by,
            frame: self.frame,
        };
        Ok(self.query.push_window(window))
    }
}
