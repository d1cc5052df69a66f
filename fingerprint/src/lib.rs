//! Audio fingerprint catalog and matcher.
//!
//! # Architecture
//!
//! Ingestion and lookup share one pipeline:
//!
//! 1. [`extract_frames`]: audio file -> MFCC frames, each coefficient
//!    rescaled to `10 * log10(|c|)`
//! 2. [`Catalog::add_audio`]: MD5 of the file bytes -> dedup per context ->
//!    record row plus one fingerprint row per frame
//! 3. [`Matcher::match_frames`]: per probe frame, a box query over the first
//!    `C` coefficients; one vote per candidate per frame; most votes wins
//!
//! ```text
//! probe frame p           stored frames of context
//!   coef1 = -31.20   -->   coef1 BETWEEN -31.201 AND -31.199
//!   coef2 =  -8.75   -->   coef2 BETWEEN  -8.751 AND  -8.749   (C >= 2)
//!                          ... GROUP BY audio_uuid  -> +1 vote each
//! ```
//!
//! All storage goes through [`echomark_store::Database`]. The catalog is
//! typically kept in memory and carried across restarts with a
//! [`Snapshot`]. [`Recognizer`] wraps it all for async callers, with
//! timeouts and per-context write serialization.

mod catalog;
pub mod config;
mod error;
mod extract;
pub mod frames;
mod hash;
mod matcher;
pub mod schema;
mod service;
mod snapshot;
mod types;

pub use catalog::Catalog;
pub use config::{FingerprintConfig, COEF_COUNT, DEFAULT_TOLERANCE};
pub use error::{FingerprintError, Result};
pub use extract::{extract_frames, to_decibels, FrameStream};
pub use hash::file_hash;
pub use matcher::Matcher;
pub use service::{IngestReport, Recognizer};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use types::{AddAudio, AudioRecord, Context, Frame, FrameRow, MatchOutcome, MatchResult};
