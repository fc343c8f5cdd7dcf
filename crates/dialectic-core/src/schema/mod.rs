//! Entity descriptors.
//!
//! An [`EntityDescriptor`] maps a Rust type to its table, columns, declared
//! column types, primary key, storage flags and navigation relations. It is
//! built once per type, normally by `#[derive(Entity)]`, and read by the
//! predicate compiler and the query builder.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::value::{EnumValue, SqlValue};
use crate::builder::{Delete, Insert, QueryBuilder, Update};
use crate::error::{Error, Result};

/// Declared type family of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Integer column.
    Integer,
    /// Floating point or decimal column.
    Real,
    /// Text column.
    Text,
    /// Boolean column.
    Boolean,
    /// Date column.
    Date,
    /// Date and time column.
    DateTime,
    /// Binary column.
    Blob,
    /// Enumeration column, stored by name or ordinal.
    Enum,
}

impl ColumnType {
    /// Returns true for integer and real columns.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    /// Returns the lowercase type family name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Blob => "blob",
            Self::Enum => "enum",
        }
    }

    /// Returns whether a value of this column can be compared with a value
    /// of `other`.
    #[must_use]
    pub const fn is_compatible_with(self, other: Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return true;
        }
        matches!(
            (self, other),
            (Self::Integer, Self::Integer)
                | (Self::Text, Self::Text)
                | (Self::Boolean, Self::Boolean)
                | (Self::Date | Self::DateTime, Self::Date | Self::DateTime)
                | (Self::Blob, Self::Blob)
                | (Self::Enum, Self::Enum)
        )
    }

    /// Returns whether `value` may be compared with a column of this type.
    #[must_use]
    pub const fn accepts(self, value: &SqlValue) -> bool {
        match value {
            SqlValue::Null => true,
            SqlValue::Bool(_) => matches!(self, Self::Boolean),
            SqlValue::Int(_) => matches!(self, Self::Integer | Self::Real | Self::Enum),
            SqlValue::Float(_) => matches!(self, Self::Integer | Self::Real),
            SqlValue::Text(_) => matches!(self, Self::Text | Self::Enum),
            SqlValue::Blob(_) => matches!(self, Self::Blob),
            SqlValue::Date(_) | SqlValue::DateTime(_) => matches!(self, Self::Date | Self::DateTime),
            SqlValue::Enum(_) => matches!(self, Self::Enum),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an enumeration column stores its values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumStorage {
    /// Variant name as text.
    #[default]
    Text,
    /// Variant ordinal as integer.
    Integer,
}

impl EnumStorage {
    /// Picks the storage for a value: the column's explicit flag if it has
    /// one, otherwise the dialect default.
    ///
    /// This is the only place enum storage is decided; both the storage
    /// and the comparison paths go through it.
    #[must_use]
    pub const fn resolve(explicit: Option<Self>, defaults_to_string: bool) -> Self {
        match explicit {
            Some(storage) => storage,
            None if defaults_to_string => Self::Text,
            None => Self::Integer,
        }
    }

    /// Converts an enumeration value to its stored form.
    #[must_use]
    pub fn store(self, value: &EnumValue) -> SqlValue {
        match self {
            Self::Text => SqlValue::Text(value.name.clone()),
            Self::Integer => SqlValue::Int(value.ordinal),
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// SQL column name.
    pub name: String,
    /// Declared type family.
    pub column_type: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,
    /// Explicit enum storage, if the property overrides the default.
    pub enum_storage: Option<EnumStorage>,
}

impl ColumnDescriptor {
    /// Creates a non-nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
            enum_storage: None,
        }
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Overrides the enum storage of the column.
    #[must_use]
    pub const fn enum_storage(mut self, storage: EnumStorage) -> Self {
        self.enum_storage = Some(storage);
        self
    }

    /// Returns whether `value` may be written to or compared with this
    /// column.
    ///
    /// On an enumeration column a raw text or integer must match the
    /// column's explicit storage; without one the stored form depends on
    /// the dialect, so only enum values are accepted.
    #[must_use]
    pub fn accepts(&self, value: &SqlValue) -> bool {
        if self.column_type != ColumnType::Enum {
            return self.column_type.accepts(value);
        }
        match value {
            SqlValue::Null | SqlValue::Enum(_) => true,
            SqlValue::Text(_) => self.enum_storage == Some(EnumStorage::Text),
            SqlValue::Int(_) => self.enum_storage == Some(EnumStorage::Integer),
            _ => false,
        }
    }

    /// Describes the values [`ColumnDescriptor::accepts`] takes.
    #[must_use]
    pub fn expected(&self) -> String {
        match (self.column_type, self.enum_storage) {
            (ColumnType::Enum, Some(EnumStorage::Text)) => String::from("enum stored as text"),
            (ColumnType::Enum, Some(EnumStorage::Integer)) => {
                String::from("enum stored as integer")
            }
            (ty, _) => String::from(ty.as_str()),
        }
    }
}

/// A navigation from one entity to another.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Navigation name used by `include`.
    pub name: String,
    /// Descriptor of the related entity.
    pub target: fn() -> &'static EntityDescriptor,
    /// Column on this entity.
    pub local_key: String,
    /// Column on the related entity.
    pub foreign_key: String,
}

impl Relation {
    /// Creates a relation.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target: fn() -> &'static EntityDescriptor,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// Table-level metadata for an entity.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    table: String,
    columns: Vec<ColumnDescriptor>,
    relations: Vec<Relation>,
}

impl EntityDescriptor {
    /// Starts building a descriptor for `table`.
    #[must_use]
    pub fn builder(table: impl Into<String>) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder {
            table: table.into(),
            columns: vec![],
            relations: vec![],
        }
    }

    /// Returns the SQL table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns all columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns all column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the primary key column name, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by name, failing with [`Error::UnknownMember`].
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn require_column(&self, name: &str) -> Result<&ColumnDescriptor> {
        self.column(name)
            .ok_or_else(|| Error::unknown_member(&self.table, name))
    }

    /// Looks up a relation by navigation name.
    ///
    /// # Errors
    ///
    /// Returns an error if the relation does not exist.
    pub fn require_relation(&self, name: &str) -> Result<&Relation> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::unknown_member(&self.table, name))
    }

    /// Returns all relations.
    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}

/// Builder for [`EntityDescriptor`].
#[derive(Debug)]
pub struct EntityDescriptorBuilder {
    table: String,
    columns: Vec<ColumnDescriptor>,
    relations: Vec<Relation>,
}

impl EntityDescriptorBuilder {
    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds a relation.
    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Finishes the descriptor.
    #[must_use]
    pub fn build(self) -> EntityDescriptor {
        EntityDescriptor {
            table: self.table,
            columns: self.columns,
            relations: self.relations,
        }
    }
}

/// A type mapped to a table.
///
/// Implemented by `#[derive(Entity)]`, which caches the descriptor in a
/// `OnceLock` so it is built exactly once.
pub trait Entity {
    /// Returns the entity's descriptor.
    fn descriptor() -> &'static EntityDescriptor;

    /// Starts a query against this entity.
    #[must_use]
    fn query() -> QueryBuilder<Self>
    where
        Self: Sized,
    {
        QueryBuilder::new()
    }

    /// Starts an INSERT into this entity's table.
    #[must_use]
    fn insert() -> Insert<Self>
    where
        Self: Sized,
    {
        Insert::new()
    }

    /// Starts an UPDATE of this entity's table.
    #[must_use]
    fn update() -> Update<Self>
    where
        Self: Sized,
    {
        Update::new()
    }

    /// Starts a DELETE from this entity's table.
    #[must_use]
    fn delete() -> Delete<Self>
    where
        Self: Sized,
    {
        Delete::new()
    }
}

/// Maps a Rust field type to its declared column type.
pub trait SqlType {
    /// Declared type family.
    const COLUMN_TYPE: ColumnType;
    /// Whether the type admits NULL.
    const NULLABLE: bool = false;
}

macro_rules! impl_sql_type {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl SqlType for $ty {
                const COLUMN_TYPE: ColumnType = ColumnType::$kind;
            }
        )+
    };
}

impl_sql_type!(Integer: i8, i16, i32, i64, u8, u16, u32);
impl_sql_type!(Real: f32, f64);
impl_sql_type!(Text: String);
impl_sql_type!(Boolean: bool);
impl_sql_type!(Blob: Vec<u8>);
impl_sql_type!(Date: NaiveDate);
impl_sql_type!(DateTime: NaiveDateTime, DateTime<Utc>);

impl<T: SqlType> SqlType for Option<T> {
    const COLUMN_TYPE: ColumnType = T::COLUMN_TYPE;
    const NULLABLE: bool = true;
}
