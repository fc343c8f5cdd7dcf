//! Microsoft SQL Server dialect.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

/// T-SQL reserved keywords beyond the common set.
const RESERVED: &[&str] = &[
    "BACKUP",
    "BREAK",
    "BROWSE",
    "CLUSTERED",
    "CONTAINS",
    "CONVERT",
    "DENY",
    "FILE",
    "FILLFACTOR",
    "FUNCTION",
    "GOTO",
    "IDENTITY",
    "MERGE",
    "NOCHECK",
    "OPENQUERY",
    "PERCENT",
    "PIVOT",
    "PLAN",
    "PRINT",
    "PROC",
    "PROCEDURE",
    "PUBLIC",
    "RULE",
    "TOP",
    "TRAN",
    "TRANSACTION",
    "TRIGGER",
    "UNPIVOT",
];

/// SQL Server profile.
///
/// Pagination uses `OFFSET n ROWS FETCH NEXT m ROWS ONLY`, which requires an
/// `ORDER BY`; recursive CTEs take no `RECURSIVE` keyword.
pub const SQLSERVER: DialectProfile = DialectProfile {
    name: "sqlserver",
    identifier_quote: IdentifierQuote::Bracket,
    placeholder: PlaceholderStyle::AtP,
    pagination: PaginationStrategy::OffsetRequiresFetch,
    bool_literals: BoolLiterals::Numeric,
    blob_literals: BlobLiterals::ZeroX,
    backslash_escapes: false,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: false,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: RESERVED,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlserver_profile() {
        assert_eq!(SQLSERVER.quote_identifier("order"), "[order]");
        assert_eq!(SQLSERVER.placeholder.placeholder(1), "@p0");
        assert!(!SQLSERVER.recursive_keyword);
    }
}
