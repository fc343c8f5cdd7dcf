//! Row-limiting clauses.

use super::Writer;
use crate::dialect::PaginationStrategy;
use crate::spec::QuerySpec;

impl Writer<'_> {
    /// Appends the pagination clause. `ordered` tells whether ORDER BY
    /// was written.
    pub(super) fn pagination(&self, spec: &QuerySpec, ordered: bool, sql: &mut String) {
        let (skip, take) = (spec.skip, spec.take);
        if skip.is_none() && take.is_none() {
            return;
        }
        match self.profile().pagination {
            PaginationStrategy::OffsetRequiresFetch => {
                // Compound and DISTINCT results only sort by output columns.
                if !ordered && (spec.set_op.is_some() || spec.distinct) {
                    sql.push_str(" ORDER BY 1");
                } else if !ordered {
                    sql.push_str(" ORDER BY (SELECT NULL)");
                }
                sql.push_str(&format!(" OFFSET {} ROWS", skip.unwrap_or(0)));
                if let Some(take) = take {
                    sql.push_str(&format!(" FETCH NEXT {take} ROWS ONLY"));
                }
            }
            strategy => {
                match (take, strategy) {
                    (Some(take), _) => sql.push_str(&format!(" LIMIT {take}")),
                    (None, PaginationStrategy::SentinelBeforeOffset(sentinel)) => {
                        sql.push_str(" LIMIT ");
                        sql.push_str(sentinel);
                    }
                    (None, PaginationStrategy::AllKeyword) => sql.push_str(" LIMIT ALL"),
                    (None, _) => {}
                }
                if let Some(skip) = skip {
                    sql.push_str(&format!(" OFFSET {skip}"));
                }
            }
        }
    }
}
