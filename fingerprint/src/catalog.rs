//! Contexts and audio records.

use std::path::Path;
use std::sync::Arc;

use echomark_store::Database;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FingerprintError, Result};
use crate::extract::extract_frames;
use crate::frames;
use crate::hash::file_hash;
use crate::schema::{self, AUDIO_TABLE, CONTEXT_TABLE};
use crate::types::{AddAudio, AudioRecord, Context, Frame};

/// The audio catalog over a shared database handle.
///
/// Mutations are not serialized here; callers that ingest concurrently
/// should go through [`crate::Recognizer`]. The `(context, hash)` unique
/// index still keeps concurrent inserts of the same content from
/// producing two records.
#[derive(Clone, Debug)]
pub struct Catalog {
    db: Arc<dyn Database>,
}

impl Catalog {
    /// Wraps `db`, creating the schema if it is missing.
    pub fn new(db: Arc<dyn Database>) -> Result<Self> {
        schema::init(db.as_ref())?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    // --- contexts ---

    pub fn add_context(&self, name: &str, directory: Option<&str>, replace: bool) -> Result<Context> {
        if name.is_empty() {
            return Err(FingerprintError::InvalidArgument(
                "context name is empty".to_string(),
            ));
        }
        let ctx = Context {
            name: name.to_string(),
            directory: directory.map(str::to_string),
        };

        if replace {
            self.db.insert_or_replace(CONTEXT_TABLE, &ctx.to_record())?;
        } else {
            let n = self.db.execute(
                &format!("INSERT OR IGNORE INTO {CONTEXT_TABLE} (name, directory) VALUES (?1, ?2)"),
                &[name.into(), directory.into()],
            )?;
            if n == 0 {
                return Err(FingerprintError::DuplicateContext(name.to_string()));
            }
        }
        info!("Context {} saved (replace={})", name, replace);
        Ok(ctx)
    }

    pub fn get_context(&self, name: &str) -> Result<Context> {
        let row = self.db.query_one(
            &format!("SELECT name, directory FROM {CONTEXT_TABLE} WHERE name = ?1"),
            &[name.into()],
        )?;
        match row {
            Some(r) => Ok(Context::from_record(&r)?),
            None => Err(FingerprintError::not_found("context", name)),
        }
    }

    pub fn list_contexts(&self) -> Result<Vec<Context>> {
        self.db
            .query(
                &format!("SELECT name, directory FROM {CONTEXT_TABLE} ORDER BY name"),
                &[],
            )?
            .map(|r| -> Result<Context> { Ok(Context::from_record(&r)?) })
            .collect()
    }

    /// Removes a context and, best effort, everything catalogued in it.
    ///
    /// A record that fails to delete is logged and skipped; the context
    /// row is removed regardless.
    pub fn remove_context(&self, name: &str) -> Result<()> {
        self.get_context(name)?;

        let records = self.list_audio(Some(name))?;
        let mut failed = 0;
        for record in &records {
            if let Err(e) = self.remove_audio(&record.uuid) {
                warn!("Failed to remove audio {} from context {}: {}", record.uuid, name, e);
                failed += 1;
            }
        }
        match frames::delete_by_context(self.db.as_ref(), name) {
            Ok(0) => {}
            Ok(n) => debug!("Removed {} orphaned frames of context {}", n, name),
            Err(e) => warn!("Failed to sweep frames of context {}: {}", name, e),
        }

        self.db.execute(
            &format!("DELETE FROM {CONTEXT_TABLE} WHERE name = ?1"),
            &[name.into()],
        )?;
        info!(
            "Context {} removed ({} records, {} failed)",
            name,
            records.len(),
            failed
        );
        Ok(())
    }

    // --- audio ---

    /// Fingerprints a file into a context.
    ///
    /// Content already present in the context (same file digest) is not
    /// analysed again; the existing record is returned as
    /// [`AddAudio::Duplicate`].
    pub fn add_audio(&self, context: &str, path: &Path) -> Result<AddAudio> {
        self.get_context(context)?;
        let hash = file_hash(path)?;
        if let Some(existing) = self.find_by_hash(context, &hash)? {
            info!(
                "{} already catalogued in {} as {}",
                path.display(),
                context,
                existing.uuid
            );
            return Ok(AddAudio::Duplicate(existing));
        }

        let frames = extract_frames(path)?;
        self.insert_fingerprinted(context, &display_name(path), &hash, &frames)
    }

    /// Stores a record and its already extracted frames.
    ///
    /// If the frames cannot be written the new record is deleted again by
    /// uuid, so no record is left without its fingerprint.
    pub fn insert_fingerprinted(
        &self,
        context: &str,
        name: &str,
        hash: &str,
        frames: &[Frame],
    ) -> Result<AddAudio> {
        let record = AudioRecord {
            uuid: Uuid::new_v4().to_string(),
            name: name.to_string(),
            context: context.to_string(),
            hash: hash.to_string(),
        };

        let n = self.db.execute(
            &format!(
                "INSERT INTO {AUDIO_TABLE} (uuid, name, context, hash) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT (context, hash) DO NOTHING"
            ),
            &[
                record.uuid.as_str().into(),
                name.into(),
                context.into(),
                hash.into(),
            ],
        )?;
        if n == 0 {
            let existing = self
                .find_by_hash(context, hash)?
                .ok_or_else(|| FingerprintError::not_found("audio with hash", hash))?;
            info!("{} already catalogued in {} as {}", name, context, existing.uuid);
            return Ok(AddAudio::Duplicate(existing));
        }

        if let Err(e) = frames::insert_frames(self.db.as_ref(), context, &record.uuid, frames) {
            warn!("Storing frames for {} failed, rolling back: {}", record.uuid, e);
            self.rollback(&record.uuid);
            return Err(e);
        }

        info!(
            "Catalogued {} in {} as {} ({} frames)",
            name,
            context,
            record.uuid,
            frames.len()
        );
        Ok(AddAudio::Created(record))
    }

    fn rollback(&self, uuid: &str) {
        if let Err(e) = self.delete_record_row(uuid) {
            warn!("Rollback of audio {} failed: {}", uuid, e);
        }
        if let Err(e) = frames::delete_by_audio(self.db.as_ref(), uuid) {
            warn!("Rollback of frames for {} failed: {}", uuid, e);
        }
    }

    pub fn get_audio(&self, uuid: &str) -> Result<AudioRecord> {
        let row = self.db.query_one(
            &format!("SELECT uuid, name, context, hash FROM {AUDIO_TABLE} WHERE uuid = ?1"),
            &[uuid.into()],
        )?;
        match row {
            Some(r) => Ok(AudioRecord::from_record(&r)?),
            None => Err(FingerprintError::not_found("audio", uuid)),
        }
    }

    pub fn find_by_hash(&self, context: &str, hash: &str) -> Result<Option<AudioRecord>> {
        let row = self.db.query_one(
            &format!(
                "SELECT uuid, name, context, hash FROM {AUDIO_TABLE} WHERE context = ?1 AND hash = ?2"
            ),
            &[context.into(), hash.into()],
        )?;
        Ok(match row {
            Some(r) => Some(AudioRecord::from_record(&r)?),
            None => None,
        })
    }

    /// Records of one context, or of every context when `None`.
    pub fn list_audio(&self, context: Option<&str>) -> Result<Vec<AudioRecord>> {
        let rows = match context {
            Some(ctx) => self.db.query(
                &format!(
                    "SELECT uuid, name, context, hash FROM {AUDIO_TABLE} WHERE context = ?1 ORDER BY name, uuid"
                ),
                &[ctx.into()],
            )?,
            None => self.db.query(
                &format!(
                    "SELECT uuid, name, context, hash FROM {AUDIO_TABLE} ORDER BY context, name, uuid"
                ),
                &[],
            )?,
        };
        rows.map(|r| -> Result<AudioRecord> { Ok(AudioRecord::from_record(&r)?) })
            .collect()
    }

    /// Deletes a record and its frames.
    ///
    /// Both deletes are always attempted; the first failure is returned.
    pub fn remove_audio(&self, uuid: &str) -> Result<()> {
        self.get_audio(uuid)?;

        let row = self.delete_record_row(uuid);
        if let Err(e) = &row {
            warn!("Failed to delete audio row {}: {}", uuid, e);
        }
        let removed = frames::delete_by_audio(self.db.as_ref(), uuid);
        if let Err(e) = &removed {
            warn!("Failed to delete frames of {}: {}", uuid, e);
        }

        row?;
        let n = removed?;
        debug!("Removed audio {} ({} frames)", uuid, n);
        Ok(())
    }

    fn delete_record_row(&self, uuid: &str) -> Result<usize> {
        Ok(self.db.execute(
            &format!("DELETE FROM {AUDIO_TABLE} WHERE uuid = ?1"),
            &[uuid.into()],
        )?)
    }
}

/// Display name of a source file: its final path component.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
