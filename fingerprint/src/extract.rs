//! Fingerprint extraction: MFCC frames rescaled to decibels.

use std::path::Path;

use echomark_audio::{MfccConfig, MfccStream};
use tracing::debug;

use crate::config::{COEF_COUNT, FILTER_COUNT, HOP_SIZE, WINDOW_SIZE};
use crate::error::Result;
use crate::types::Frame;

/// Smallest magnitude fed to `log10`; keeps silent frames finite.
const MAGNITUDE_FLOOR: f64 = 1e-10;

pub fn analysis_config() -> MfccConfig {
    MfccConfig {
        window_size: WINDOW_SIZE,
        hop_size: HOP_SIZE,
        num_filters: FILTER_COUNT,
        num_coefs: COEF_COUNT,
    }
}

/// `10 * log10(|v|)`, floored at -100.
pub fn to_decibels(v: f64) -> f64 {
    10.0 * v.abs().max(MAGNITUDE_FLOOR).log10()
}

/// Lazy sequence of fingerprint frames from one file.
pub struct FrameStream {
    inner: MfccStream,
}

impl FrameStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            inner: MfccStream::open(path, analysis_config())?,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    /// Frames produced so far.
    pub fn frame_count(&self) -> usize {
        self.inner.frames_read()
    }
}

impl Iterator for FrameStream {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.inner.next()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e.into())),
        };
        let mut coefs = [0.0; COEF_COUNT];
        for (dst, src) in coefs.iter_mut().zip(&raw) {
            *dst = to_decibels(*src);
        }
        Some(Ok(Frame {
            index: (self.inner.frames_read() - 1) as u32,
            coefs,
        }))
    }
}

/// Extracts every frame of a file. Any decode error discards the whole
/// sequence.
pub fn extract_frames(path: &Path) -> Result<Vec<Frame>> {
    let stream = FrameStream::open(path)?;
    let rate = stream.sample_rate();
    let frames = stream.collect::<Result<Vec<_>>>()?;
    debug!(
        "Extracted {} frames from {} ({} Hz)",
        frames.len(),
        path.display(),
        rate
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FingerprintError;
    use std::f64::consts::PI;

    fn write_tone(path: &Path, freq: f64, sample_rate: u32, n: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..n {
            let s = 0.5 * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin();
            w.write_sample((s * 32767.0) as i16).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn decibels() {
        assert!((to_decibels(100.0) - 20.0).abs() < 1e-12);
        assert!((to_decibels(-0.1) + 10.0).abs() < 1e-12);
        assert_eq!(to_decibels(0.0), -100.0);
    }

    #[test]
    fn frames_are_indexed_and_finite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_tone(&path, 440.0, 8000, 2560);

        let frames = extract_frames(&path).unwrap();
        assert_eq!(frames.len(), 10);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.index as usize, i);
            assert!(f.coefs.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(matches!(
            extract_frames(&path),
            Err(FingerprintError::Decode(_))
        ));
    }
}
