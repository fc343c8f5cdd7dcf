//! DuckDB dialect.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

const RESERVED: &[&str] = &[
    "ILIKE",
    "LATERAL",
    "PIVOT",
    "QUALIFY",
    "RETURNING",
    "UNPIVOT",
];

/// DuckDB profile.
pub const DUCKDB: DialectProfile = DialectProfile {
    name: "duckdb",
    identifier_quote: IdentifierQuote::Double,
    placeholder: PlaceholderStyle::Dollar,
    pagination: PaginationStrategy::OffsetOnlyLegal,
    bool_literals: BoolLiterals::Keyword,
    blob_literals: BlobLiterals::DuckDbEscaped,
    backslash_escapes: false,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: true,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: RESERVED,
};
