//! Shared command plumbing: config, catalog session, output.

use std::path::PathBuf;
use std::sync::Arc;

use echomark_cli::{load_config, Output, OutputFormat, Paths};
use echomark_fingerprint::{Recognizer, Snapshot};
use echomark_store::{Database, SqliteDatabase};
use tracing::debug;

use crate::Cli;

/// An in-memory catalog restored from, and saved back to, the snapshot
/// file.
pub struct Session {
    pub recognizer: Recognizer,
    snapshot: PathBuf,
}

impl Session {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let paths = Paths::new()?;
        let cfg = load_config(&paths, cli.config.as_deref())?;
        let snapshot = cfg.snapshot_path(&paths);
        debug!("Using config {} and snapshot {}", cfg.path().display(), snapshot.display());

        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::open_in_memory()?);
        Snapshot::load(db.as_ref(), &Snapshot::load_file(&snapshot)?)?;
        let recognizer = Recognizer::new(db, cfg.global.fingerprint)?;
        Ok(Self {
            recognizer,
            snapshot,
        })
    }

    /// Persists the catalog after a mutation.
    pub fn save(&self) -> anyhow::Result<()> {
        let db = self.recognizer.catalog().database();
        Snapshot::export(db.as_ref())?.save_file(&self.snapshot)?;
        Ok(())
    }
}

pub fn output(cli: &Cli) -> Output {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format, cli.output.clone())
}
