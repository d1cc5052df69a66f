//! Table layout of the catalog.

use echomark_store::Database;

use crate::config::COEF_COUNT;
use crate::error::Result;

pub const CONTEXT_TABLE: &str = "context_list";
pub const AUDIO_TABLE: &str = "audio_list";
pub const FINGERPRINT_TABLE: &str = "audio_fingerprint";

/// Column name of the `i`-th (0-based) coefficient: `coef1` .. `coef13`.
pub fn coef_column(i: usize) -> String {
    format!("coef{}", i + 1)
}

fn ddl() -> String {
    let coef_defs: String = (0..COEF_COUNT)
        .map(|i| format!(",\n    {} REAL NOT NULL", coef_column(i)))
        .collect();
    let coef_indexes: String = (0..COEF_COUNT)
        .map(|i| {
            let col = coef_column(i);
            format!(
                "CREATE INDEX IF NOT EXISTS idx_fingerprint_{col} ON {FINGERPRINT_TABLE} ({col});\n"
            )
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {CONTEXT_TABLE} (
    name TEXT PRIMARY KEY,
    directory TEXT
);
CREATE TABLE IF NOT EXISTS {AUDIO_TABLE} (
    uuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    context TEXT NOT NULL,
    hash TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_audio_context_hash ON {AUDIO_TABLE} (context, hash);
CREATE TABLE IF NOT EXISTS {FINGERPRINT_TABLE} (
    context TEXT NOT NULL,
    audio_uuid TEXT NOT NULL,
    frame_idx INTEGER NOT NULL{coef_defs}
);
CREATE INDEX IF NOT EXISTS idx_fingerprint_context ON {FINGERPRINT_TABLE} (context);
CREATE INDEX IF NOT EXISTS idx_fingerprint_audio ON {FINGERPRINT_TABLE} (audio_uuid);
{coef_indexes}"
    )
}

/// Creates missing tables and indexes. Safe to call on every start.
pub fn init(db: &dyn Database) -> Result<()> {
    db.execute_batch(&ddl())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use echomark_store::SqliteDatabase;

    #[test]
    fn init_is_idempotent() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        init(&db).unwrap();
        init(&db).unwrap();

        let rows = db
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_fingerprint_coef%'",
                &[],
            )
            .unwrap();
        assert_eq!(rows.count(), COEF_COUNT);
    }

    #[test]
    fn coef_columns_are_one_based() {
        assert_eq!(coef_column(0), "coef1");
        assert_eq!(coef_column(12), "coef13");
    }
}
