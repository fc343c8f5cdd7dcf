//! Generic SQL dialect.

use super::{
    BlobLiterals, BoolLiterals, DialectProfile, IdentifierQuote, PaginationStrategy, PlaceholderStyle,
    DEFAULT_INLINE_LIST_THRESHOLD,
};

/// A generic profile using ANSI SQL conventions.
pub const GENERIC: DialectProfile = DialectProfile {
    name: "generic",
    identifier_quote: IdentifierQuote::Double,
    placeholder: PlaceholderStyle::Question,
    pagination: PaginationStrategy::OffsetOnlyLegal,
    bool_literals: BoolLiterals::Keyword,
    blob_literals: BlobLiterals::XQuoted,
    backslash_escapes: false,
    enum_defaults_to_string: true,
    supports_window_functions: true,
    supports_cte: true,
    supports_intersect_except: true,
    recursive_keyword: true,
    inline_list_threshold: DEFAULT_INLINE_LIST_THRESHOLD,
    reserved_words: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_dialect() {
        assert_eq!(GENERIC.name, "generic");
        assert_eq!(GENERIC.identifier_quote.open(), '"');
        assert_eq!(GENERIC.placeholder.placeholder(1), "?");
        assert_eq!(GENERIC.bool_literal(true), "TRUE");
    }
}
