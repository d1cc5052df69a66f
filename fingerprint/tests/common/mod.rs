#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use echomark_fingerprint::Catalog;
use echomark_store::{Database, SqliteDatabase};

pub const SAMPLE_RATE: u32 = 8000;

pub fn memory_db() -> Arc<dyn Database> {
    Arc::new(SqliteDatabase::open_in_memory().unwrap())
}

pub fn catalog() -> Catalog {
    Catalog::new(memory_db()).unwrap()
}

/// Writes a mono 16-bit WAV holding a sum of sines, `samples` long.
pub fn write_wav(path: &Path, freqs: &[f64], samples: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    let scale = 0.8 / freqs.len() as f64;
    for i in 0..samples {
        let t = i as f64 / SAMPLE_RATE as f64;
        let s: f64 = freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f64>() * scale;
        w.write_sample((s * 32767.0) as i16).unwrap();
    }
    w.finalize().unwrap();
}

/// Writes a mono IMA ADPCM WAV of `blocks` 505-sample blocks. The block at
/// index `bad` has an out-of-range step index and fails to decode.
pub fn write_ima_adpcm(path: &Path, blocks: usize, bad: Option<usize>) {
    const BLOCK_ALIGN: u16 = 256;
    const FRAMES_PER_BLOCK: u16 = 505;

    let mut data: Vec<u8> = Vec::with_capacity(blocks * BLOCK_ALIGN as usize);
    for i in 0..blocks {
        let step_index = if bad == Some(i) { 200 } else { 0 };
        data.extend_from_slice(&[0, 0, step_index, 0]);
        data.extend((0..BLOCK_ALIGN - 4).map(|j| (j as u8).wrapping_mul(37)));
    }

    let mut fmt = Vec::new();
    fmt.extend_from_slice(&0x0011u16.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes());
    fmt.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    fmt.extend_from_slice(&(SAMPLE_RATE * BLOCK_ALIGN as u32 / FRAMES_PER_BLOCK as u32).to_le_bytes());
    fmt.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    fmt.extend_from_slice(&4u16.to_le_bytes());
    fmt.extend_from_slice(&2u16.to_le_bytes());
    fmt.extend_from_slice(&FRAMES_PER_BLOCK.to_le_bytes());

    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&((4 + 8 + fmt.len() + 8 + data.len()) as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&(fmt.len() as u32).to_le_bytes());
    wav.extend_from_slice(&fmt);
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data.len() as u32).to_le_bytes());
    wav.extend_from_slice(&data);
    std::fs::write(path, wav).unwrap();
}

/// A half-second clip in `dir`.
pub fn clip(dir: &Path, name: &str, freqs: &[f64]) -> PathBuf {
    let path = dir.join(name);
    write_wav(&path, freqs, 4000);
    path
}

/// Frames produced for a clip of `samples` samples.
pub fn expected_frames(samples: usize) -> usize {
    samples.div_ceil(256)
}
