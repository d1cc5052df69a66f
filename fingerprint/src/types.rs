//! Catalog entities and match results.

use echomark_store::{Record, StoreResult};
use serde::{Deserialize, Serialize};

use crate::config::COEF_COUNT;
use crate::schema::coef_column;

/// A named partition of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    /// Informational directory hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl Context {
    pub(crate) fn from_record(r: &Record) -> StoreResult<Self> {
        Ok(Self {
            name: r.text("name")?.to_string(),
            directory: r.opt_text("directory")?.map(str::to_string),
        })
    }

    pub(crate) fn to_record(&self) -> Record {
        Record::new()
            .with("name", self.name.as_str())
            .with("directory", self.directory.clone())
    }
}

/// One fingerprinted reference clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRecord {
    pub uuid: String,
    pub name: String,
    pub context: String,
    pub hash: String,
}

impl AudioRecord {
    pub(crate) fn from_record(r: &Record) -> StoreResult<Self> {
        Ok(Self {
            uuid: r.text("uuid")?.to_string(),
            name: r.text("name")?.to_string(),
            context: r.text("context")?.to_string(),
            hash: r.text("hash")?.to_string(),
        })
    }

    pub(crate) fn to_record(&self) -> Record {
        Record::new()
            .with("uuid", self.uuid.as_str())
            .with("name", self.name.as_str())
            .with("context", self.context.as_str())
            .with("hash", self.hash.as_str())
    }
}

/// Coefficient vector of one analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 0-based position within the clip.
    pub index: u32,
    pub coefs: [f64; COEF_COUNT],
}

/// A stored frame together with its owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    pub context: String,
    pub audio_uuid: String,
    pub frame_idx: u32,
    pub coefs: [f64; COEF_COUNT],
}

impl FrameRow {
    pub(crate) fn new(context: &str, audio_uuid: &str, frame: &Frame) -> Self {
        Self {
            context: context.to_string(),
            audio_uuid: audio_uuid.to_string(),
            frame_idx: frame.index,
            coefs: frame.coefs,
        }
    }

    pub(crate) fn from_record(r: &Record) -> StoreResult<Self> {
        let mut coefs = [0.0; COEF_COUNT];
        for (i, c) in coefs.iter_mut().enumerate() {
            *c = r.real(&coef_column(i))?;
        }
        Ok(Self {
            context: r.text("context")?.to_string(),
            audio_uuid: r.text("audio_uuid")?.to_string(),
            frame_idx: r.integer("frame_idx")? as u32,
            coefs,
        })
    }

    pub(crate) fn to_record(&self) -> Record {
        let mut record = Record::new()
            .with("context", self.context.as_str())
            .with("audio_uuid", self.audio_uuid.as_str())
            .with("frame_idx", self.frame_idx);
        for (i, &c) in self.coefs.iter().enumerate() {
            record.set(coef_column(i), c);
        }
        record
    }
}

/// Outcome of a successful `add_audio`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddAudio {
    /// A new record was created and its frames stored.
    Created(AudioRecord),
    /// The same content was already catalogued in the context.
    Duplicate(AudioRecord),
}

impl AddAudio {
    pub fn record(&self) -> &AudioRecord {
        match self {
            AddAudio::Created(r) | AddAudio::Duplicate(r) => r,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, AddAudio::Created(_))
    }
}

/// The winning candidate of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    #[serde(flatten)]
    pub record: AudioRecord,
    pub frame_count: usize,
    pub match_count: usize,
}

/// Result of matching a probe against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Found(MatchResult),
    NotFound { frame_count: usize },
}

impl MatchOutcome {
    pub fn frame_count(&self) -> usize {
        match self {
            MatchOutcome::Found(m) => m.frame_count,
            MatchOutcome::NotFound { frame_count } => *frame_count,
        }
    }

    pub fn found(&self) -> Option<&MatchResult> {
        match self {
            MatchOutcome::Found(m) => Some(m),
            MatchOutcome::NotFound { .. } => None,
        }
    }

    /// `"found"` or `"not_found"`.
    pub fn status(&self) -> &'static str {
        match self {
            MatchOutcome::Found(_) => "found",
            MatchOutcome::NotFound { .. } => "not_found",
        }
    }
}
