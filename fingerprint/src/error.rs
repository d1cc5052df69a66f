use std::time::Duration;

use echomark_audio::AudioError;
use echomark_store::StoreError;
use thiserror::Error;

/// Errors returned by catalog, matching and snapshot operations.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("fingerprint: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fingerprint: {0}")]
    Decode(#[from] AudioError),

    #[error("fingerprint: {kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("fingerprint: {0}")]
    Storage(#[from] StoreError),

    #[error("fingerprint: context already exists: {0}")]
    DuplicateContext(String),

    #[error("fingerprint: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("fingerprint: {0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("fingerprint: snapshot: {0}")]
    Snapshot(String),

    #[error("fingerprint: background task failed: {0}")]
    Task(String),
}

impl FingerprintError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for FingerprintError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}

/// Result type for fingerprint operations.
pub type Result<T> = std::result::Result<T, FingerprintError>;
