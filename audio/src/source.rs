//! Streaming PCM source backed by symphonia.
//!
//! Decodes any container/codec symphonia understands, downmixes to mono and
//! hands out fixed-size blocks of samples at the file's native sample rate.

use std::fs::File;
use std::io;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::AudioError;

/// Mono PCM reader over a decoded audio file.
pub struct PcmSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    pending: Vec<f32>,
    pos: usize,
    finished: bool,
}

impl PcmSource {
    /// Opens and probes the file at `path`.
    ///
    /// Fails with [`AudioError::Open`] when the file cannot be read and with
    /// [`AudioError::Decode`] when no decodable audio track is found.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Decode(format!("probe: {e}")))?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioError::Decode("no audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| AudioError::Decode("unknown sample rate".to_string()))?;
        let channels = params.channels.map(|c| c.count()).unwrap_or(1).max(1);

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| AudioError::Decode(format!("codec: {e}")))?;

        debug!(
            "Opened {} (sample_rate={}, channels={})",
            path.display(),
            sample_rate,
            channels
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            pending: Vec::new(),
            pos: 0,
            finished: false,
        })
    }

    /// Native sample rate of the file in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count of the file before downmixing.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Fills `out` with the next mono samples.
    ///
    /// Returns the number of real samples written; the tail of `out` past
    /// that count is zeroed. A return of `0` marks the end of the stream.
    pub fn read(&mut self, out: &mut [f32]) -> Result<usize, AudioError> {
        let mut written = 0;
        while written < out.len() {
            if self.pos >= self.pending.len() {
                if self.finished || !self.refill()? {
                    self.finished = true;
                    break;
                }
                continue;
            }
            let n = (out.len() - written).min(self.pending.len() - self.pos);
            out[written..written + n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
            self.pos += n;
            written += n;
        }
        out[written..].fill(0.0);
        Ok(written)
    }

    /// Decodes the next packet of the selected track into `pending`.
    /// Returns false at end of stream.
    fn refill(&mut self) -> Result<bool, AudioError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => return Err(AudioError::Decode(format!("packet: {e}"))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            // A corrupt packet fails the whole stream so callers never keep
            // a truncated frame sequence.
            let decoded = self.decoder.decode(&packet).map_err(|e| {
                warn!("Corrupt audio packet at ts {}: {}", packet.ts(), e);
                AudioError::Decode(format!("decode: {e}"))
            })?;

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);

            let channels = spec.channels.count().max(1);
            self.pending.clear();
            self.pos = 0;
            for frame in buf.samples().chunks(channels) {
                self.pending.push(frame.iter().sum::<f32>() / channels as f32);
            }
            return Ok(true);
        }
    }
}
