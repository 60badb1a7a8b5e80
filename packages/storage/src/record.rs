// ABOUTME: Static record descriptions consumed by the generic repository
// ABOUTME: Table, field and key metadata plus the bindable column value type

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::error::{StorageError, StorageResult};

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
}

/// A single column of a record table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub unique: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            unique: false,
        }
    }

    /// Mark the field as holding a unique value per row
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Table description for a record type
#[derive(Debug)]
pub struct RecordSpec {
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    /// Primary key columns, in the order `Record::key_values` returns them
    pub key: &'static [&'static str],
}

impl RecordSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up a field by name, rejecting names the table does not have
    pub fn require_field(&self, name: &str) -> StorageResult<&FieldSpec> {
        self.field(name).ok_or_else(|| {
            StorageError::InvalidArgument(format!("Invalid field for {}: {}", self.table, name))
        })
    }
}

/// A value bound into a generated statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Null,
}

impl Value {
    pub(crate) fn push_bind(self, builder: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Value::Integer(v) => builder.push_bind(v),
            Value::Text(v) => builder.push_bind(v),
            Value::Null => builder.push_bind(None::<String>),
        };
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A row type the repository can read
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    type Key: Send + Sync;

    fn spec() -> &'static RecordSpec;

    /// Key column values, ordered as `RecordSpec::key`
    fn key_values(key: &Self::Key) -> Vec<Value>;
}

/// Writable column values for inserts and updates
pub trait Columns {
    fn columns(&self) -> Vec<(&'static str, Value)>;
}
