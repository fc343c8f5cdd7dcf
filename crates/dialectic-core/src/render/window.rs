//! Window function columns.

use super::Writer;
use crate::error::{Error, Result};
use crate::spec::{WindowFrame, WindowFunction, WindowSpec};

impl Writer<'_> {
    /// Writes `FN(args) OVER (...) AS alias`.
    pub(super) fn window(&self, window: &WindowSpec) -> Result<String> {
        let profile = self.profile();
        if !profile.supports_window_functions {
            return Err(Error::UnsupportedFeature {
                feature: "window functions",
                dialect: profile.name,
            });
        }
        let args = match &window.function {
            WindowFunction::RowNumber | WindowFunction::Rank | WindowFunction::DenseRank => {
                String::new()
            }
            WindowFunction::Ntile(buckets) => buckets.to_string(),
            WindowFunction::Lag { column, offset } | WindowFunction::Lead { column, offset } => {
                format!("{}, {offset}", self.column(column))
            }
            WindowFunction::FirstValue(column) | WindowFunction::LastValue(column) => {
                self.column(column)
            }
            WindowFunction::Aggregate { column, .. } => column
                .as_ref()
                .map_or_else(|| String::from("*"), |c| self.column(c)),
        };

        let mut over = vec![];
        if !window.partition_by.is_empty() {
            let columns: Vec<_> = window.partition_by.iter().map(|c| self.column(c)).collect();
            over.push(format!("PARTITION BY {}", columns.join(", ")));
        }
        if !window.order_by.is_empty() {
            let keys: Vec<_> = window
                .order_by
                .iter()
                .map(|key| {
                    let column = self.column(&key.column);
                    if key.descending {
                        format!("{column} DESC")
                    } else {
                        column
                    }
                })
                .collect();
            over.push(format!("ORDER BY {}", keys.join(", ")));
        }
        if let Some(frame) = frame_clause(window.frame) {
            over.push(frame);
        }

        Ok(format!(
            "{}({args}) OVER ({}) AS {}",
            window.function.name(),
            over.join(" "),
            self.ident(&window.alias)
        ))
    }
}

fn frame_clause(frame: WindowFrame) -> Option<String> {
    let (start, end) = match frame {
        WindowFrame::None => return None,
        WindowFrame::UnboundedPreceding => {
            (String::from("UNBOUNDED PRECEDING"), String::from("CURRENT ROW"))
        }
        WindowFrame::UnboundedFollowing => {
            (String::from("CURRENT ROW"), String::from("UNBOUNDED FOLLOWING"))
        }
        WindowFrame::Entire => (
            String::from("UNBOUNDED PRECEDING"),
            String::from("UNBOUNDED FOLLOWING"),
        ),
        WindowFrame::Rows {
            preceding,
            following,
        } => (
            format!("{preceding} PRECEDING"),
            format!("{following} FOLLOWING"),
        ),
    };
    Some(format!("ROWS BETWEEN {start} AND {end}"))
}
