//! SQL dialect profiles.
//!
//! Different databases disagree on identifier quoting, parameter
//! placeholders, pagination syntax and literal formats. A
//! [`DialectProfile`] captures those differences as plain data so a single
//! renderer can serve every backend.

mod duckdb;
mod generic;
mod mysql;
mod postgres;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use duckdb::DUCKDB;
pub use generic::GENERIC;
pub use mysql::{MYSQL, MYSQL57};
pub use postgres::POSTGRES;
pub use sqlite::SQLITE;
pub use sqlserver::SQLSERVER;

/// Default number of IN-list elements bound as individual parameters.
///
/// Longer lists are rendered as sanitized literals.
pub const DEFAULT_INLINE_LIST_THRESHOLD: usize = 100;

/// Identifier quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuote {
    /// `"name"` (ANSI).
    Double,
    /// `` `name` `` (MySQL).
    Backtick,
    /// `[name]` (SQL Server).
    Bracket,
}

impl IdentifierQuote {
    /// Opening quote character.
    #[must_use]
    pub const fn open(self) -> char {
        match self {
            Self::Double => '"',
            Self::Backtick => '`',
            Self::Bracket => '[',
        }
    }

    /// Closing quote character.
    #[must_use]
    pub const fn close(self) -> char {
        match self {
            Self::Double => '"',
            Self::Backtick => '`',
            Self::Bracket => ']',
        }
    }
}

/// Parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` for every parameter.
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p0`, `@p1`, ...
    AtP,
}

impl PlaceholderStyle {
    /// Returns the placeholder for the parameter at 1-based `position`.
    #[must_use]
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Self::Question => String::from("?"),
            Self::Dollar => format!("${position}"),
            Self::AtP => format!("@p{}", position - 1),
        }
    }
}

/// How a dialect expresses "skip N rows" when no row limit is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// `LIMIT <sentinel> OFFSET n`; LIMIT is mandatory before OFFSET.
    SentinelBeforeOffset(&'static str),
    /// `LIMIT ALL OFFSET n`.
    AllKeyword,
    /// `OFFSET n` alone is legal.
    OffsetOnlyLegal,
    /// `OFFSET n ROWS [FETCH NEXT m ROWS ONLY]`; no limit clause needed.
    OffsetRequiresFetch,
}

/// Boolean literal style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolLiterals {
    /// `TRUE` / `FALSE`.
    Keyword,
    /// `1` / `0`.
    Numeric,
}

/// Binary literal style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobLiterals {
    /// `X'4845'`.
    XQuoted,
    /// `'\x4845'::bytea`.
    PostgresHex,
    /// `0x4845`.
    ZeroX,
    /// `'\x48\x45'::BLOB`.
    DuckDbEscaped,
}

/// The formatting and syntax rules of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    /// Dialect name used in errors and logs.
    pub name: &'static str,
    /// Identifier quoting style.
    pub identifier_quote: IdentifierQuote,
    /// Parameter placeholder style.
    pub placeholder: PlaceholderStyle,
    /// Pagination syntax.
    pub pagination: PaginationStrategy,
    /// Boolean literal style.
    pub bool_literals: BoolLiterals,
    /// Binary literal style.
    pub blob_literals: BlobLiterals,
    /// Whether backslash is an escape character inside string literals.
    pub backslash_escapes: bool,
    /// Whether enum columns without an explicit flag store variant names.
    pub enum_defaults_to_string: bool,
    /// Whether `OVER (...)` is available.
    pub supports_window_functions: bool,
    /// Whether `WITH` is available.
    pub supports_cte: bool,
    /// Whether `INTERSECT` and `EXCEPT` are available.
    pub supports_intersect_except: bool,
    /// Whether recursive CTEs need the `RECURSIVE` keyword.
    pub recursive_keyword: bool,
    /// IN lists longer than this are rendered as literals.
    pub inline_list_threshold: usize,
    /// Dialect keywords quoted on top of the common reserved set. Sorted,
    /// uppercase.
    pub reserved_words: &'static [&'static str],
}

impl DialectProfile {
    /// Returns the literal for a boolean.
    #[must_use]
    pub const fn bool_literal(&self, value: bool) -> &'static str {
        match (self.bool_literals, value) {
            (BoolLiterals::Keyword, true) => "TRUE",
            (BoolLiterals::Keyword, false) => "FALSE",
            (BoolLiterals::Numeric, true) => "1",
            (BoolLiterals::Numeric, false) => "0",
        }
    }

    /// Quotes an identifier unconditionally, doubling embedded closing quotes.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        let open = self.identifier_quote.open();
        let close = self.identifier_quote.close();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(open);
        for c in name.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }

    /// Returns true if `word` must be quoted on this dialect, ignoring case.
    #[must_use]
    pub fn is_reserved(&self, word: &str) -> bool {
        crate::sanitize::is_reserved_in(word, self.reserved_words)
    }

    /// Returns a copy with a different IN-list threshold.
    #[must_use]
    pub const fn with_inline_list_threshold(mut self, threshold: usize) -> Self {
        self.inline_list_threshold = threshold;
        self
    }

    /// Returns a copy with a different enum default.
    #[must_use]
    pub const fn with_enum_defaults_to_string(mut self, defaults_to_string: bool) -> Self {
        self.enum_defaults_to_string = defaults_to_string;
        self
    }
}

/// The built-in dialects, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// SQLite.
    #[default]
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL 8.
    Mysql,
    /// MySQL 5.7, without window functions, CTEs or INTERSECT/EXCEPT.
    Mysql57,
    /// Microsoft SQL Server.
    Sqlserver,
    /// DuckDB.
    Duckdb,
    /// Generic ANSI SQL.
    Generic,
}

impl DialectKind {
    /// Every built-in dialect.
    pub const ALL: [Self; 7] = [
        Self::Sqlite,
        Self::Postgres,
        Self::Mysql,
        Self::Mysql57,
        Self::Sqlserver,
        Self::Duckdb,
        Self::Generic,
    ];

    /// Returns the shared profile of this dialect.
    #[must_use]
    pub const fn profile(self) -> &'static DialectProfile {
        match self {
            Self::Sqlite => &SQLITE,
            Self::Postgres => &POSTGRES,
            Self::Mysql => &MYSQL,
            Self::Mysql57 => &MYSQL57,
            Self::Sqlserver => &SQLSERVER,
            Self::Duckdb => &DUCKDB,
            Self::Generic => &GENERIC,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "mysql57" => Ok(Self::Mysql57),
            "sqlserver" | "mssql" | "tsql" => Ok(Self::Sqlserver),
            "duckdb" => Ok(Self::Duckdb),
            "generic" | "ansi" => Ok(Self::Generic),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(PlaceholderStyle::Question.placeholder(3), "?");
        assert_eq!(PlaceholderStyle::Dollar.placeholder(3), "$3");
        assert_eq!(PlaceholderStyle::AtP.placeholder(1), "@p0");
    }

    #[test]
    fn test_quote_identifier_doubles_closing_quote() {
        assert_eq!(SQLITE.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(MYSQL.quote_identifier("a`b"), "`a``b`");
        assert_eq!(SQLSERVER.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_dialect_kind_from_str() {
        assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("mssql".parse::<DialectKind>().unwrap(), DialectKind::Sqlserver);
        assert!("oracle".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_every_kind_has_distinct_profile_name() {
        let mut names: Vec<&str> = DialectKind::ALL.iter().map(|k| k.profile().name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DialectKind::ALL.len());
    }

    #[test]
    fn test_profile_overrides() {
        let p = SQLITE.with_inline_list_threshold(3);
        assert_eq!(p.inline_list_threshold, 3);
        assert_eq!(SQLITE.inline_list_threshold, DEFAULT_INLINE_LIST_THRESHOLD);
    }

    #[test]
    fn test_reserved_words_sorted_and_uppercase() {
        for kind in DialectKind::ALL {
            let words = kind.profile().reserved_words;
            assert!(words.windows(2).all(|w| w[0] < w[1]), "{kind}");
            assert!(words.iter().all(|w| w.to_ascii_uppercase() == *w), "{kind}");
        }
    }

    #[test]
    fn test_reserved_words_per_dialect() {
        assert!(MYSQL.is_reserved("rank"));
        assert!(MYSQL.is_reserved("Row_Number"));
        assert!(!POSTGRES.is_reserved("rank"));
        assert!(SQLSERVER.is_reserved("top"));
        assert!(!SQLITE.is_reserved("top"));
        assert!(GENERIC.is_reserved("order"));
    }
}
