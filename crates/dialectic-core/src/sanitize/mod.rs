//! Value and identifier sanitization.
//!
//! Every literal and identifier that reaches SQL text passes through a
//! [`Sanitizer`]. Bound parameters are normalized by the same code that
//! formats literals, so a value compares the same way it is stored.

mod reserved;

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::builder::value::SqlValue;
use crate::dialect::{BlobLiterals, DialectProfile, PlaceholderStyle};
use crate::error::{Error, Result};
use crate::predicate::BoundValue;
use crate::schema::EnumStorage;

pub use reserved::{is_reserved, is_reserved_in};

/// Whether values become bound parameters or inline literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueMode {
    /// Values are bound; NULL and booleans stay inline.
    #[default]
    Parameterized,
    /// Values are rendered as escaped literals.
    Inline,
}

/// Parameters collected while rendering, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterList {
    style: PlaceholderStyle,
    values: Vec<SqlValue>,
}

impl ParameterList {
    /// Creates an empty list for a placeholder style.
    #[must_use]
    pub const fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            values: vec![],
        }
    }

    /// Appends a value and returns its placeholder.
    pub fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        self.style.placeholder(self.values.len())
    }

    /// Number of collected parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the list.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

/// Formats the fractional part of a timestamp with seven digits.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use dialectic_core::sanitize::format_datetime;
///
/// let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
///     .unwrap()
///     .and_hms_nano_opt(9, 30, 0, 123_456_700)
///     .unwrap();
/// assert_eq!(format_datetime(&dt), "2024-03-01 09:30:00.1234567");
/// ```
#[must_use]
pub fn format_datetime(value: &NaiveDateTime) -> String {
    // Leap seconds are carried as nanos >= 1e9.
    let ticks = (value.nanosecond() % 1_000_000_000) / 100;
    format!("{}.{ticks:07}", value.format("%Y-%m-%d %H:%M:%S"))
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Dialect-aware formatter for identifiers and values.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer<'a> {
    profile: &'a DialectProfile,
}

impl<'a> Sanitizer<'a> {
    /// Creates a sanitizer for a profile.
    #[must_use]
    pub const fn new(profile: &'a DialectProfile) -> Self {
        Self { profile }
    }

    /// Returns the profile.
    #[must_use]
    pub const fn profile(&self) -> &'a DialectProfile {
        self.profile
    }

    /// Quotes an identifier only when it needs it.
    ///
    /// Dotted names are handled per segment and `*` passes through.
    #[must_use]
    pub fn sanitize_identifier(&self, name: &str) -> String {
        if name == "*" {
            return String::from(name);
        }
        if name.contains('.') {
            return name
                .split('.')
                .map(|segment| self.sanitize_segment(segment))
                .collect::<Vec<_>>()
                .join(".");
        }
        self.sanitize_segment(name)
    }

    fn sanitize_segment(&self, segment: &str) -> String {
        if segment == "*" {
            return String::from(segment);
        }
        let needs_quoting = segment.is_empty()
            || segment.starts_with(|c: char| c.is_ascii_digit())
            || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.profile.is_reserved(segment);
        if needs_quoting {
            self.profile.quote_identifier(segment)
        } else {
            String::from(segment)
        }
    }

    /// Quotes a string literal; `None` is `NULL`.
    #[must_use]
    pub fn sanitize_string(&self, value: Option<&str>) -> String {
        let Some(value) = value else {
            return String::from("NULL");
        };
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' if self.profile.backslash_escapes => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    /// Converts a value to the form it is stored and compared in.
    ///
    /// Timestamps become seven-digit text and enumerations become their
    /// name or ordinal according to the slot's storage flag.
    #[must_use]
    pub fn normalize(&self, bound: &BoundValue) -> SqlValue {
        match &bound.value {
            SqlValue::DateTime(dt) => SqlValue::Text(format_datetime(dt)),
            SqlValue::Enum(e) => {
                EnumStorage::resolve(bound.storage, self.profile.enum_defaults_to_string).store(e)
            }
            other => other.clone(),
        }
    }

    /// Formats a value as an inline literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for NaN and infinite floats.
    pub fn literal(&self, value: &SqlValue) -> Result<String> {
        Ok(match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => String::from(self.profile.bool_literal(*b)),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::UnsupportedType {
                        type_name: String::from("f64 (non-finite)"),
                    });
                }
                // `{:?}` keeps `.0` or an exponent so the literal stays REAL.
                format!("{f:?}")
            }
            SqlValue::Text(s) => self.sanitize_string(Some(s)),
            SqlValue::Blob(bytes) => self.blob_literal(bytes),
            SqlValue::Date(d) => self.sanitize_string(Some(&format_date(d))),
            SqlValue::DateTime(dt) => self.sanitize_string(Some(&format_datetime(dt))),
            SqlValue::Enum(e) => {
                let stored = EnumStorage::resolve(None, self.profile.enum_defaults_to_string).store(e);
                return self.literal(&stored);
            }
        })
    }

    /// Formats a binary literal in the profile's style.
    #[must_use]
    pub fn blob_literal(&self, bytes: &[u8]) -> String {
        let mut hex = String::with_capacity(bytes.len() * 4);
        match self.profile.blob_literals {
            BlobLiterals::XQuoted => {
                hex.push_str("X'");
                for b in bytes {
                    let _ = write!(hex, "{b:02X}");
                }
                hex.push('\'');
            }
            BlobLiterals::PostgresHex => {
                hex.push_str("'\\x");
                for b in bytes {
                    let _ = write!(hex, "{b:02x}");
                }
                hex.push_str("'::bytea");
            }
            BlobLiterals::ZeroX => {
                hex.push_str("0x");
                for b in bytes {
                    let _ = write!(hex, "{b:02X}");
                }
            }
            BlobLiterals::DuckDbEscaped => {
                hex.push('\'');
                for b in bytes {
                    let _ = write!(hex, "\\x{b:02X}");
                }
                hex.push_str("'::BLOB");
            }
        }
        hex
    }

    /// Formats a value slot as SQL: `NULL` and booleans inline, anything
    /// else as a placeholder (collected into `params`) or as a literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when an inline value cannot be
    /// formatted.
    pub fn format_value(
        &self,
        bound: &BoundValue,
        mode: ValueMode,
        params: &mut ParameterList,
    ) -> Result<String> {
        let value = self.normalize(bound);
        match (value, mode) {
            (SqlValue::Null, _) => Ok(String::from("NULL")),
            (SqlValue::Bool(b), _) => Ok(String::from(self.profile.bool_literal(b))),
            (value, ValueMode::Inline) => self.literal(&value),
            (value, ValueMode::Parameterized) => Ok(params.push(value)),
        }
    }
}
