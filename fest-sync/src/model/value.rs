//! Backend-neutral column values
//!
//! Local models flatten to a [`Row`] in the order of their column list. Both
//! store backends work on rows: SQLite binds and reads them, the in-memory
//! store keeps them as-is. Timestamps are unix milliseconds, UUIDs and enums
//! are text.

use crate::status::EntityKind;
use chrono::{DateTime, SubsecRound, Utc};
use fest_common::{Error, Result};
use uuid::Uuid;

/// One stored column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
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

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Text(value.to_string())
    }
}

/// `at` as it reads back from a store: whole milliseconds
pub fn stored_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Integer(value.timestamp_millis())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Bool,
}

/// Column descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// A flattened record, aligned with its model's column list
pub type Row = Vec<Value>;

/// Sequential typed reader used by `LocalModel::from_row`
pub struct RowReader {
    kind: EntityKind,
    columns: &'static [Column],
    values: std::vec::IntoIter<Value>,
    index: usize,
}

impl RowReader {
    pub fn new(kind: EntityKind, columns: &'static [Column], row: Row) -> Result<Self> {
        if row.len() != columns.len() {
            return Err(Error::Decode(format!(
                "{} row has {} values, expected {}",
                kind,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            kind,
            columns,
            values: row.into_iter(),
            index: 0,
        })
    }

    fn next(&mut self) -> Result<(&'static str, Value)> {
        let column = self.columns.get(self.index).ok_or_else(|| {
            Error::Decode(format!("{} row read past last column", self.kind))
        })?;
        let value = self.values.next().unwrap_or(Value::Null);
        self.index += 1;
        Ok((column.name, value))
    }

    fn mismatch(&self, column: &str, expected: &str, found: &Value) -> Error {
        Error::Decode(format!(
            "{}.{}: expected {}, found {:?}",
            self.kind, column, expected, found
        ))
    }

    pub fn opt_text(&mut self) -> Result<Option<String>> {
        match self.next()? {
            (_, Value::Null) => Ok(None),
            (_, Value::Text(text)) => Ok(Some(text)),
            (column, other) => Err(self.mismatch(column, "text", &other)),
        }
    }

    pub fn text(&mut self) -> Result<String> {
        let column = self.current_name();
        self.opt_text()?
            .ok_or_else(|| Error::Decode(format!("{}.{}: unexpected NULL", self.kind, column)))
    }

    pub fn opt_integer(&mut self) -> Result<Option<i64>> {
        match self.next()? {
            (_, Value::Null) => Ok(None),
            (_, Value::Integer(value)) => Ok(Some(value)),
            (column, other) => Err(self.mismatch(column, "integer", &other)),
        }
    }

    pub fn opt_real(&mut self) -> Result<Option<f64>> {
        match self.next()? {
            (_, Value::Null) => Ok(None),
            (_, Value::Real(value)) => Ok(Some(value)),
            // SQLite hands back whole REAL values as integers in some paths
            (_, Value::Integer(value)) => Ok(Some(value as f64)),
            (column, other) => Err(self.mismatch(column, "real", &other)),
        }
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.next()? {
            (_, Value::Bool(value)) => Ok(value),
            (_, Value::Integer(value)) => Ok(value != 0),
            (column, other) => Err(self.mismatch(column, "bool", &other)),
        }
    }

    pub fn uuid(&mut self) -> Result<Uuid> {
        let column = self.current_name();
        let text = self.text()?;
        Uuid::parse_str(&text)
            .map_err(|e| Error::Decode(format!("{}.{}: {}", self.kind, column, e)))
    }

    pub fn opt_timestamp(&mut self) -> Result<Option<DateTime<Utc>>> {
        let column = self.current_name();
        match self.opt_integer()? {
            None => Ok(None),
            Some(millis) => DateTime::<Utc>::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| {
                    Error::Decode(format!(
                        "{}.{}: timestamp {} out of range",
                        self.kind, column, millis
                    ))
                }),
        }
    }

    pub fn timestamp(&mut self) -> Result<DateTime<Utc>> {
        let column = self.current_name();
        self.opt_timestamp()?
            .ok_or_else(|| Error::Decode(format!("{}.{}: unexpected NULL", self.kind, column)))
    }

    fn current_name(&self) -> &'static str {
        self.columns
            .get(self.index)
            .map(|column| column.name)
            .unwrap_or("?")
    }
}
