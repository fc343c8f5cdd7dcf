//! MySQL dialects.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

/// Keywords MySQL 8 reserves beyond the common set, window function names
/// included.
const RESERVED: &[&str] = &[
    "CUME_DIST",
    "DENSE_RANK",
    "DIV",
    "DUAL",
    "FIRST_VALUE",
    "GROUPS",
    "INTERVAL",
    "KEYS",
    "LAG",
    "LAST_VALUE",
    "LATERAL",
    "LEAD",
    "MOD",
    "NTH_VALUE",
    "NTILE",
    "OF",
    "PERCENT_RANK",
    "RANK",
    "READ",
    "REGEXP",
    "RLIKE",
    "ROW",
    "ROW_NUMBER",
    "SHOW",
    "SYSTEM",
    "XOR",
];

/// MySQL 8 profile.
///
/// MySQL has no "no limit" keyword; the documented idiom is the largest
/// unsigned 64-bit value.
pub const MYSQL: DialectProfile = DialectProfile {
    name: "mysql",
    identifier_quote: IdentifierQuote::Backtick,
    placeholder: PlaceholderStyle::Question,
    pagination: PaginationStrategy::SentinelBeforeOffset("18446744073709551615"),
    bool_literals: BoolLiterals::Keyword,
    blob_literals: BlobLiterals::XQuoted,
    backslash_escapes: true,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: true,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: RESERVED,
};

/// MySQL 5.7 profile: no window functions, CTEs, INTERSECT or EXCEPT.
pub const MYSQL57: DialectProfile = DialectProfile {
    name: "mysql57",
    supports_window_functions: false,
    supports_cte: false,
    supports_intersect_except: false,
    ..MYSQL
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_profile() {
        assert_eq!(MYSQL.identifier_quote.open(), '`');
        assert!(MYSQL.backslash_escapes);
        assert!(MYSQL.supports_window_functions);
    }

    #[test]
    fn test_mysql57_inherits_syntax() {
        assert_eq!(MYSQL57.name, "mysql57");
        assert_eq!(MYSQL57.pagination, MYSQL.pagination);
        assert!(!MYSQL57.supports_window_functions);
        assert!(!MYSQL57.supports_cte);
    }
}
