//! Whole-catalog export and restore.
//!
//! The working catalog usually lives in an in-memory database. A
//! [`Snapshot`] carries every row out of it as one JSON document so the
//! host process can restore it on the next start.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use echomark_store::Database;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FingerprintError, Result};
use crate::schema::{self, AUDIO_TABLE, CONTEXT_TABLE, FINGERPRINT_TABLE};
use crate::types::{AudioRecord, Context, FrameRow};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub audio: Vec<AudioRecord>,
    #[serde(default)]
    pub frames: Vec<FrameRow>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            contexts: Vec::new(),
            audio: Vec::new(),
            frames: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Reads every catalog row out of `db`.
    pub fn export(db: &dyn Database) -> Result<Self> {
        let contexts = db
            .query(&format!("SELECT name, directory FROM {CONTEXT_TABLE} ORDER BY name"), &[])?
            .map(|r| Context::from_record(&r))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let audio = db
            .query(
                &format!("SELECT uuid, name, context, hash FROM {AUDIO_TABLE} ORDER BY context, uuid"),
                &[],
            )?
            .map(|r| AudioRecord::from_record(&r))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let frames = db
            .query(
                &format!("SELECT * FROM {FINGERPRINT_TABLE} ORDER BY audio_uuid, frame_idx"),
                &[],
            )?
            .map(|r| FrameRow::from_record(&r))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            version: SNAPSHOT_VERSION,
            contexts,
            audio,
            frames,
        })
    }

    /// Replaces every catalog row in `db` with the contents of `snapshot`,
    /// atomically.
    pub fn load(db: &dyn Database, snapshot: &Snapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(FingerprintError::Snapshot(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        schema::init(db)?;

        let contexts: Vec<_> = snapshot.contexts.iter().map(Context::to_record).collect();
        let audio: Vec<_> = snapshot.audio.iter().map(AudioRecord::to_record).collect();
        let frames: Vec<_> = snapshot.frames.iter().map(FrameRow::to_record).collect();
        // One transaction: a snapshot that fails to load leaves the
        // previous catalog untouched.
        db.replace_tables(&[
            (CONTEXT_TABLE, contexts.as_slice()),
            (AUDIO_TABLE, audio.as_slice()),
            (FINGERPRINT_TABLE, frames.as_slice()),
        ])?;

        info!(
            "Loaded snapshot: {} contexts, {} audio, {} frames",
            contexts.len(),
            audio.len(),
            frames.len()
        );
        Ok(())
    }

    /// Writes the snapshot as JSON, replacing `path` atomically.
    pub fn save_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let mut w = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut w, self)?;
            w.flush()?;
        }
        fs::rename(&tmp, path)?;
        info!("Saved snapshot to {}", path.display());
        Ok(())
    }

    /// Reads a snapshot file. A missing file is an empty catalog.
    pub fn load_file(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
