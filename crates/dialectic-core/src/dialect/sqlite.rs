//! SQLite dialect.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

const RESERVED: &[&str] = &[
    "ABORT",
    "AUTOINCREMENT",
    "GLOB",
    "INDEXED",
    "ISNULL",
    "NOTNULL",
    "PRAGMA",
    "RAISE",
    "REGEXP",
    "VACUUM",
];

/// SQLite profile.
///
/// SQLite rejects `OFFSET` without `LIMIT`, and a negative limit means
/// "no limit", so skip-only pagination renders `LIMIT -1 OFFSET n`.
pub const SQLITE: DialectProfile = DialectProfile {
    name: "sqlite",
    identifier_quote: IdentifierQuote::Double,
    placeholder: PlaceholderStyle::Question,
    pagination: PaginationStrategy::SentinelBeforeOffset("-1"),
    bool_literals: BoolLiterals::Numeric,
    blob_literals: BlobLiterals::XQuoted,
    backslash_escapes: false,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: true,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: RESERVED,
};
