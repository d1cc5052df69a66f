//! Audio analysis for fingerprinting.
//!
//! This crate provides:
//!
//! - `source`: file decoding to mono PCM at the native sample rate
//! - `mfcc`: phase vocoder, mel filter bank and cepstral transform
//!
//! # Example
//!
//! ```no_run
//! use echomark_audio::mfcc::{MfccConfig, MfccStream};
//!
//! let stream = MfccStream::open("clip.wav", MfccConfig::default())?;
//! for frame in stream {
//!     let coefs = frame?;
//!     assert_eq!(coefs.len(), 13);
//! }
//! # Ok::<(), echomark_audio::AudioError>(())
//! ```

mod error;
pub mod mfcc;
pub mod source;

pub use error::AudioError;
pub use mfcc::{Mfcc, MfccConfig, MfccStream};
pub use source::PcmSource;
