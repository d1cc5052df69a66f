//! Fingerprint frame persistence.

use echomark_store::Database;

use crate::error::Result;
use crate::schema::FINGERPRINT_TABLE;
use crate::types::{Frame, FrameRow};

/// Bulk-inserts the frames of one audio record. All or nothing.
pub fn insert_frames(
    db: &dyn Database,
    context: &str,
    audio_uuid: &str,
    frames: &[Frame],
) -> Result<()> {
    let records: Vec<_> = frames
        .iter()
        .map(|f| FrameRow::new(context, audio_uuid, f).to_record())
        .collect();
    db.insert_many(FINGERPRINT_TABLE, &records)?;
    Ok(())
}

pub fn delete_by_audio(db: &dyn Database, audio_uuid: &str) -> Result<usize> {
    Ok(db.execute(
        &format!("DELETE FROM {FINGERPRINT_TABLE} WHERE audio_uuid = ?1"),
        &[audio_uuid.into()],
    )?)
}

pub fn delete_by_context(db: &dyn Database, context: &str) -> Result<usize> {
    Ok(db.execute(
        &format!("DELETE FROM {FINGERPRINT_TABLE} WHERE context = ?1"),
        &[context.into()],
    )?)
}

pub fn count_by_audio(db: &dyn Database, audio_uuid: &str) -> Result<usize> {
    let row = db.query_one(
        &format!("SELECT COUNT(*) AS n FROM {FINGERPRINT_TABLE} WHERE audio_uuid = ?1"),
        &[audio_uuid.into()],
    )?;
    Ok(match row {
        Some(r) => r.integer("n")? as usize,
        None => 0,
    })
}
