//! SQL values and parameter handling.
//!
//! Values are never spliced into SQL text by the caller. The sanitizer
//! decides whether a value becomes a bound parameter or an escaped literal.

use std::any::Any;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A value of an enumeration, carried with both of its storage forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Variant name, used when the column stores text.
    pub name: String,
    /// Underlying integer, used when the column stores integers.
    pub ordinal: i64,
}

impl EnumValue {
    /// Creates an enumeration value.
    #[must_use]
    pub fn new(name: impl Into<String>, ordinal: i64) -> Self {
        Self {
            name: name.into(),
            ordinal,
        }
    }
}

/// A SQL value that can be used as a parameter or literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time, always interpreted as UTC.
    DateTime(NaiveDateTime),
    /// Enumeration value.
    Enum(EnumValue),
}

impl SqlValue {
    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the name of the value's type family, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Enum(_) => "enum",
        }
    }

    /// Converts a value whose concrete type is only known at run time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when `T` is not one of the
    /// supported primitive, temporal or text types.
    pub fn from_any<T: Any>(value: &T) -> Result<Self> {
        let any = value as &dyn Any;
        macro_rules! try_downcast {
            ($($ty:ty),+) => {
                $(
                    if let Some(v) = any.downcast_ref::<$ty>() {
                        return Ok(v.clone().to_sql_value());
                    }
                    if let Some(v) = any.downcast_ref::<Option<$ty>>() {
                        return Ok(v.clone().to_sql_value());
                    }
                )+
            };
        }
        try_downcast!(
            bool,
            i8,
            i16,
            i32,
            i64,
            u8,
            u16,
            u32,
            f32,
            f64,
            String,
            &'static str,
            Vec<u8>,
            NaiveDate,
            NaiveDateTime,
            DateTime<Utc>,
            EnumValue,
            SqlValue
        );
        Err(Error::UnsupportedType {
            type_name: std::any::type_name::<T>().to_string(),
        })
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_int_value {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_int_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self.naive_utc())
    }
}

impl ToSqlValue for EnumValue {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Enum(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// Trait for fieldless enums stored either by name or by ordinal.
///
/// Usually implemented through `#[derive(SqlEnum)]`.
pub trait SqlEnum {
    /// Returns the variant name.
    fn variant_name(&self) -> &'static str;

    /// Returns the variant's underlying integer.
    fn ordinal(&self) -> i64;

    /// Returns both storage forms of the variant.
    fn to_enum_value(&self) -> EnumValue {
        EnumValue::new(self.variant_name(), self.ordinal())
    }
}
