use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use super::schema::DataType;
use crate::error::StoreError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Bool(bool),
    Integer(i64),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value can be written into a column of `data_type`.
    /// Null is accepted here; nullability is checked separately.
    pub fn fits(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (Value::Null, _)
                | (Value::Text(_), DataType::String)
                | (Value::Bool(_), DataType::Boolean)
                | (Value::Integer(_), DataType::Integer)
                | (Value::DateTime(_), DataType::DateTime)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Fixed-width UTC form, so text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_datetime(column: &str, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode {
            column: column.to_string(),
            reason: format!("invalid datetime '{s}': {e}"),
        })
}

/// One row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn text(&self, column: &str) -> Result<String, StoreError> {
        match self.get(column) {
            Some(Value::Text(s)) => Ok(s.clone()),
            other => Err(mismatch(column, "text", other)),
        }
    }

    /// Text column that may hold null.
    pub fn optional_text(&self, column: &str) -> Result<Option<String>, StoreError> {
        match self.get(column) {
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Null) | None => Ok(None),
            other => Err(mismatch(column, "text or null", other)),
        }
    }

    pub fn boolean(&self, column: &str) -> Result<bool, StoreError> {
        match self.get(column) {
            Some(Value::Bool(b)) => Ok(*b),
            other => Err(mismatch(column, "boolean", other)),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64, StoreError> {
        match self.get(column) {
            Some(Value::Integer(i)) => Ok(*i),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    pub fn datetime(&self, column: &str) -> Result<DateTime<Utc>, StoreError> {
        match self.get(column) {
            Some(Value::DateTime(dt)) => Ok(*dt),
            other => Err(mismatch(column, "datetime", other)),
        }
    }
}

fn mismatch(column: &str, expected: &str, found: Option<&Value>) -> StoreError {
    StoreError::Decode {
        column: column.to_string(),
        reason: format!(
            "expected {expected}, found {}",
            found.map(Value::kind).unwrap_or("nothing")
        ),
    }
}
