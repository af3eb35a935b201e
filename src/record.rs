//! Typed records and the mapping from raw source rows.
//!
//! This module provides:
//! - `Record`: The customer record flowing through the pipeline
//! - `Value` / `Row` / `RawRow`: Named field access over one source row
//! - `RowMapper`: Conversion of a row into a `Record`

use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

/// One customer row, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    id: i64,
    first_name: String,
    last_name: String,
    birthdate: String,
}

impl Record {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthdate: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthdate: birthdate.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Birthdate as stored in the source; never parsed.
    pub fn birthdate(&self) -> &str {
        &self.birthdate
    }
}

/// A single column value as returned by a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl Value {
    /// Integer view of the value, accepting integer-valued text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null | Value::Real(_) => None,
        }
    }

    /// Text view of the value; `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

/// Named field accessor over one source row.
pub trait Row {
    /// Look up a column by name. Column names compare ASCII case-insensitively.
    fn get(&self, column: &str) -> Option<&Value>;
}

/// A row materialized as ordered `(column, value)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    columns: Vec<(String, Value)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Build the row shape of the `customer` table.
    pub fn customer(id: i64, first_name: &str, last_name: &str, birthdate: &str) -> Self {
        RawRow::new()
            .with("id", id)
            .with("firstName", first_name)
            .with("lastName", last_name)
            .with("birthdate", birthdate)
    }
}

impl Row for RawRow {
    fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }
}

/// Converts one raw row into a `Record`.
pub trait RowMapper: Send + Sync + std::fmt::Debug {
    /// `row_num` is the zero-based position of the row in the whole read,
    /// used for error messages.
    fn map_row(&self, row: &dyn Row, row_num: usize) -> Result<Record>;
}

/// Maps rows of the `customer(id, firstName, lastName, birthdate)` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerRowMapper;

impl RowMapper for CustomerRowMapper {
    fn map_row(&self, row: &dyn Row, row_num: usize) -> Result<Record> {
        let id = match row.get("id") {
            None | Some(Value::Null) => {
                return Err(BatchError::Mapping {
                    row: row_num,
                    reason: "column 'id' is missing".into(),
                });
            }
            Some(value) => value.as_i64().ok_or_else(|| BatchError::Mapping {
                row: row_num,
                reason: format!("column 'id' is not an integer: {value:?}"),
            })?,
        };

        let text = |column: &str| {
            row.get(column)
                .and_then(Value::to_text)
                .unwrap_or_default()
        };

        Ok(Record::new(
            id,
            text("firstName"),
            text("lastName"),
            text("birthdate"),
        ))
    }
}
