//! Relational storage interface and implementations.
//!
//! Provides a small statement-level database trait (execute, query with a
//! row cursor, insert, insert-or-replace, bulk table replacement) and a
//! SQLite implementation that runs either in memory or on a file.

pub mod record;
pub mod sqlite;

use std::fmt;
use thiserror::Error;

pub use record::{Record, Rows, Value};
pub use sqlite::SqliteDatabase;

/// Errors that can occur in storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store: invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("store: missing column: {0}")]
    MissingColumn(String),

    #[error("store: column {column} is not {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    #[error("store: batch records do not share the same columns")]
    ColumnMismatch,

    #[error("store: empty record")]
    EmptyRecord,
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Statement-level database interface.
///
/// Values always travel as bound parameters; table and column names are
/// checked with [`check_identifier`] before being placed in SQL text.
pub trait Database: Send + Sync {
    /// Run one statement and return the number of rows changed.
    fn execute(&self, sql: &str, params: &[Value]) -> StoreResult<usize>;

    /// Run several `;`-separated statements without parameters.
    fn execute_batch(&self, sql: &str) -> StoreResult<()>;

    /// Run a query and return a cursor over its rows.
    fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Rows>;

    /// Insert one record into `table`.
    fn insert(&self, table: &str, record: &Record) -> StoreResult<()>;

    /// Insert one record, replacing any row that collides on a unique key.
    fn insert_or_replace(&self, table: &str, record: &Record) -> StoreResult<()>;

    /// Insert many records with identical columns in one transaction.
    /// Either every record is written or none is.
    fn insert_many(&self, table: &str, records: &[Record]) -> StoreResult<()>;

    /// Empty every table in `tables` and refill each with its records, all
    /// in one transaction. Tables are cleared last to first and filled
    /// first to last, so list parents before children.
    fn replace_tables(&self, tables: &[(&str, &[Record])]) -> StoreResult<()>;

    /// Return the first row of a query, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> StoreResult<Option<Record>> {
        Ok(self.query(sql, params)?.next_row())
    }
}

impl fmt::Debug for dyn Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database {{ ... }}")
    }
}

/// Validates a table or column name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn check_identifier(name: &str) -> StoreResult<&str> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
