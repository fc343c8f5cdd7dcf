//! PostgreSQL dialect.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

const RESERVED: &[&str] = &[
    "ANALYSE",
    "ANALYZE",
    "ARRAY",
    "ASYMMETRIC",
    "BOTH",
    "COLLATE",
    "DO",
    "ILIKE",
    "LATERAL",
    "LEADING",
    "ONLY",
    "PLACING",
    "RETURNING",
    "SOME",
    "SYMMETRIC",
    "TRAILING",
    "VARIADIC",
];

/// PostgreSQL profile.
pub const POSTGRES: DialectProfile = DialectProfile {
    name: "postgresql",
    identifier_quote: IdentifierQuote::Double,
    placeholder: PlaceholderStyle::Dollar,
    pagination: PaginationStrategy::AllKeyword,
    bool_literals: BoolLiterals::Keyword,
    blob_literals: BlobLiterals::PostgresHex,
    backslash_escapes: false,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: true,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: RESERVED,
};
