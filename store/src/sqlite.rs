//! SQLite-backed [`Database`] implementation.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::trace;

use crate::{check_identifier, Database, Record, Rows, StoreError, StoreResult, Value};

/// A SQLite database behind a single serialized connection.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Open or create a database file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open(path)?),
        })
    }
}

fn insert_sql(verb: &str, table: &str, record: &Record) -> StoreResult<String> {
    if record.is_empty() {
        return Err(StoreError::EmptyRecord);
    }
    check_identifier(table)?;
    for column in record.columns() {
        check_identifier(column)?;
    }
    let placeholders: Vec<String> = (1..=record.len()).map(|i| format!("?{i}")).collect();
    Ok(format!(
        "{verb} INTO {table} ({}) VALUES ({})",
        record.columns().join(", "),
        placeholders.join(", ")
    ))
}

impl Database for SqliteDatabase {
    fn execute(&self, sql: &str, params: &[Value]) -> StoreResult<usize> {
        trace!("execute: {}", sql);
        let conn = self.conn.lock();
        Ok(conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn execute_batch(&self, sql: &str) -> StoreResult<()> {
        trace!("execute_batch: {}", sql);
        let conn = self.conn.lock();
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Rows> {
        trace!("query: {}", sql);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                record.set(name.as_str(), Value::from(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(Rows::new(out))
    }

    fn insert(&self, table: &str, record: &Record) -> StoreResult<()> {
        let sql = insert_sql("INSERT", table, record)?;
        self.execute(&sql, record.values())?;
        Ok(())
    }

    fn insert_or_replace(&self, table: &str, record: &Record) -> StoreResult<()> {
        let sql = insert_sql("INSERT OR REPLACE", table, record)?;
        self.execute(&sql, record.values())?;
        Ok(())
    }

    fn insert_many(&self, table: &str, records: &[Record]) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        insert_batch(&tx, table, records)?;
        tx.commit()?;
        trace!("insert_many: {} rows into {}", records.len(), table);
        Ok(())
    }

    fn replace_tables(&self, tables: &[(&str, &[Record])]) -> StoreResult<()> {
        for (table, _) in tables {
            check_identifier(table)?;
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (table, _) in tables.iter().rev() {
            let n = tx.execute(&format!("DELETE FROM {table}"), [])?;
            trace!("replace_tables: cleared {} rows from {}", n, table);
        }
        for (table, records) in tables {
            insert_batch(&tx, table, records)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Inserts `records` through one prepared statement. The caller owns the
/// transaction; an error leaves it to be rolled back on drop.
fn insert_batch(tx: &Transaction<'_>, table: &str, records: &[Record]) -> StoreResult<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let sql = insert_sql("INSERT", table, first)?;
    let mut stmt = tx.prepare(&sql)?;
    for record in records {
        if record.columns() != first.columns() {
            return Err(StoreError::ColumnMismatch);
        }
        stmt.execute(params_from_iter(record.values().iter()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn db() -> SqliteDatabase {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE item (name TEXT PRIMARY KEY, note TEXT, score REAL, n INTEGER);",
        )
        .unwrap();
        db
    }

    #[test]
    fn insert_and_query() {
        let db = db();
        db.insert(
            "item",
            &Record::new()
                .with("name", "a")
                .with("note", None::<String>)
                .with("score", 0.25f64)
                .with("n", 7i64),
        )
        .unwrap();

        let mut rows = db
            .query("SELECT * FROM item WHERE name = ?1", &["a".into()])
            .unwrap();
        let row = rows.next_row().unwrap();
        assert_eq!(row.text("name").unwrap(), "a");
        assert_eq!(row.opt_text("note").unwrap(), None);
        assert_eq!(row.real("score").unwrap(), 0.25);
        assert_eq!(row.integer("n").unwrap(), 7);
        assert!(rows.next_row().is_none());
    }

    #[test]
    fn insert_duplicate_key_fails_but_replace_succeeds() {
        let db = db();
        let rec = Record::new().with("name", "a").with("note", "first");
        db.insert("item", &rec).unwrap();
        assert!(db.insert("item", &rec).is_err());

        db.insert_or_replace("item", &Record::new().with("name", "a").with("note", "second"))
            .unwrap();
        let row = db
            .query_one("SELECT note FROM item WHERE name = 'a'", &[])
            .unwrap()
            .unwrap();
        assert_eq!(row.text("note").unwrap(), "second");
    }

    #[test]
    fn execute_reports_changed_rows() {
        let db = db();
        for name in ["a", "b", "c"] {
            db.insert("item", &Record::new().with("name", name)).unwrap();
        }
        let n = db
            .execute("DELETE FROM item WHERE name <> ?1", &["b".into()])
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn insert_many_is_all_or_nothing() {
        let db = db();
        let good: Vec<Record> = (0..5)
            .map(|i| Record::new().with("name", format!("n{i}")).with("n", i as i64))
            .collect();
        db.insert_many("item", &good).unwrap();
        assert_eq!(db.query("SELECT name FROM item", &[]).unwrap().count(), 5);

        // Second batch collides on its last row; nothing from it may land.
        let bad = vec![
            Record::new().with("name", "x1"),
            Record::new().with("name", "x2"),
            Record::new().with("name", "n0"),
        ];
        assert!(db.insert_many("item", &bad).is_err());
        assert_eq!(db.query("SELECT name FROM item", &[]).unwrap().count(), 5);

        let mixed = vec![
            Record::new().with("name", "y1"),
            Record::new().with("note", "no name"),
        ];
        assert!(matches!(
            db.insert_many("item", &mixed),
            Err(StoreError::ColumnMismatch)
        ));
        assert_eq!(db.query("SELECT name FROM item", &[]).unwrap().count(), 5);
    }

    #[test]
    fn replace_tables_is_all_or_nothing() {
        let db = db();
        db.execute_batch("CREATE TABLE tag (item TEXT, label TEXT);").unwrap();
        db.insert("item", &Record::new().with("name", "old")).unwrap();
        db.insert("tag", &Record::new().with("item", "old").with("label", "x")).unwrap();

        let items = vec![Record::new().with("name", "a"), Record::new().with("name", "b")];
        let tags = vec![Record::new().with("item", "a").with("label", "y")];
        db.replace_tables(&[("item", items.as_slice()), ("tag", tags.as_slice())])
            .unwrap();
        let names: Vec<String> = db
            .query("SELECT name FROM item ORDER BY name", &[])
            .unwrap()
            .map(|r| r.text("name").unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(db.query("SELECT * FROM tag", &[]).unwrap().count(), 1);

        // The duplicate key fails the whole replacement, clears included.
        let clash = vec![Record::new().with("name", "c"), Record::new().with("name", "c")];
        assert!(db
            .replace_tables(&[("item", clash.as_slice()), ("tag", tags.as_slice())])
            .is_err());
        assert_eq!(db.query("SELECT * FROM item", &[]).unwrap().count(), 2);
        assert_eq!(db.query("SELECT * FROM tag", &[]).unwrap().count(), 1);

        assert!(matches!(
            db.replace_tables(&[("item; DROP TABLE tag", items.as_slice())]),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn rejects_bad_identifiers() {
        let db = db();
        let rec = Record::new().with("name; DROP TABLE item", "a");
        assert!(matches!(
            db.insert("item", &rec),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(db.insert("item", &Record::new()).is_err());
    }

    #[test]
    fn file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let db = SqliteDatabase::open(&path).unwrap();
            db.execute_batch("CREATE TABLE t (v INTEGER);").unwrap();
            db.insert("t", &Record::new().with("v", 42i64)).unwrap();
        }
        let db = SqliteDatabase::open(&path).unwrap();
        let row = db.query_one("SELECT v FROM t", &[]).unwrap().unwrap();
        assert_eq!(row.integer("v").unwrap(), 42);
    }
}
