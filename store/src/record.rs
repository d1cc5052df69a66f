//! Row values, records and the row cursor.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

use crate::{StoreError, StoreResult};

/// A single column value.
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

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
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

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Real(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                Value::Text(String::from_utf8_lossy(t).into_owned())
            }
        }
    }
}

/// An ordered set of named column values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column, replacing its value if already present.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter().position(|c| *c == column) {
            Some(i) => self.values[i] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn require(&self, column: &str) -> StoreResult<&Value> {
        self.get(column)
            .ok_or_else(|| StoreError::MissingColumn(column.to_string()))
    }

    pub fn text(&self, column: &str) -> StoreResult<&str> {
        match self.require(column)? {
            Value::Text(s) => Ok(s),
            _ => Err(mismatch(column, "text")),
        }
    }

    /// Text column that may be NULL.
    pub fn opt_text(&self, column: &str) -> StoreResult<Option<&str>> {
        match self.require(column)? {
            Value::Text(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            _ => Err(mismatch(column, "text or null")),
        }
    }

    pub fn integer(&self, column: &str) -> StoreResult<i64> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v),
            _ => Err(mismatch(column, "an integer")),
        }
    }

    /// Real column; integers are widened.
    pub fn real(&self, column: &str) -> StoreResult<f64> {
        match self.require(column)? {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            _ => Err(mismatch(column, "a real")),
        }
    }
}

fn mismatch(column: &str, expected: &'static str) -> StoreError {
    StoreError::TypeMismatch {
        column: column.to_string(),
        expected,
    }
}

/// Cursor over the rows of a query.
#[derive(Debug)]
pub struct Rows {
    inner: std::vec::IntoIter<Record>,
}

impl Rows {
    pub(crate) fn new(rows: Vec<Record>) -> Self {
        Self {
            inner: rows.into_iter(),
        }
    }

    /// Next row, or `None` once the cursor is exhausted.
    pub fn next_row(&mut self) -> Option<Record> {
        self.inner.next()
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }
}

impl Iterator for Rows {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.next_row()
    }
}
