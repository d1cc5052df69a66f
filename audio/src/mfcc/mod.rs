//! Mel-frequency cepstral coefficients.
//!
//! Pipeline per hop of input:
//!
//! 1. Phase vocoder: shift the hop into a `window_size` buffer, Hann window,
//!    FFT, magnitude spectrum
//! 2. Slaney mel filter bank over the magnitudes
//! 3. `log10` of the band energies (floored at 1e-10)
//! 4. Orthonormal DCT-II, keeping the first `num_coefs` outputs
//!
//! Default parameters:
//! - WindowSize: 512
//! - HopSize: 256
//! - NumFilters: 40
//! - NumCoefs: 13

mod dct;
mod mel;
mod pvoc;

use std::path::Path;

use crate::error::AudioError;
use crate::source::PcmSource;

pub use mel::{mel_filter_bank, slaney_edges};
pub use pvoc::{hann_window, PhaseVocoder, Spectrum};

const ENERGY_FLOOR: f64 = 1e-10;

/// Configuration for MFCC extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfccConfig {
    pub window_size: usize,
    pub hop_size: usize,
    pub num_filters: usize,
    pub num_coefs: usize,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            hop_size: 256,
            num_filters: 40,
            num_coefs: 13,
        }
    }
}

impl MfccConfig {
    fn validate(&self) -> Result<(), AudioError> {
        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(AudioError::InvalidConfig(format!(
                "hop size {} must be in 1..={}",
                self.hop_size, self.window_size
            )));
        }
        if self.num_filters == 0 || self.num_coefs == 0 || self.num_coefs > self.num_filters {
            return Err(AudioError::InvalidConfig(format!(
                "need 1 <= coefs ({}) <= filters ({})",
                self.num_coefs, self.num_filters
            )));
        }
        Ok(())
    }
}

/// Per-hop MFCC analyzer.
pub struct Mfcc {
    cfg: MfccConfig,
    pvoc: PhaseVocoder,
    bank: Vec<Vec<f64>>,
    dct: dct::Dct,
    spectrum: Spectrum,
    energies: Vec<f64>,
}

impl Mfcc {
    /// Creates an analyzer for audio at `sample_rate` Hz.
    pub fn new(cfg: MfccConfig, sample_rate: u32) -> Result<Self, AudioError> {
        cfg.validate()?;
        if sample_rate == 0 {
            return Err(AudioError::InvalidConfig("sample rate is zero".to_string()));
        }
        let pvoc = PhaseVocoder::new(cfg.window_size, cfg.hop_size);
        let spectrum = Spectrum::new(pvoc.bins());
        Ok(Self {
            bank: mel::mel_filter_bank(cfg.num_filters, cfg.window_size, sample_rate),
            dct: dct::Dct::new(cfg.num_filters, cfg.num_coefs),
            energies: vec![0.0; cfg.num_filters],
            pvoc,
            spectrum,
            cfg,
        })
    }

    pub fn config(&self) -> &MfccConfig {
        &self.cfg
    }

    /// Analyzes one hop of samples (`hop_size` long) and writes
    /// `num_coefs` coefficients into `out`.
    pub fn process(&mut self, hop: &[f32], out: &mut [f64]) {
        self.pvoc.process(hop, &mut self.spectrum);

        for (e, filter) in self.energies.iter_mut().zip(&self.bank) {
            let sum: f64 = filter
                .iter()
                .zip(&self.spectrum.norm)
                .map(|(w, m)| w * m)
                .sum();
            *e = sum.max(ENERGY_FLOOR).log10();
        }

        self.dct.process(&self.energies, out);
    }
}

/// Lazy MFCC frames read from an audio file, one per hop.
///
/// The stream ends when the source yields no more samples; a final partial
/// hop is zero padded. It cannot be restarted.
pub struct MfccStream {
    source: PcmSource,
    mfcc: Mfcc,
    hop: Vec<f32>,
    frames: usize,
    done: bool,
}

impl MfccStream {
    pub fn open(path: impl AsRef<Path>, cfg: MfccConfig) -> Result<Self, AudioError> {
        let source = PcmSource::open(path)?;
        let mfcc = Mfcc::new(cfg, source.sample_rate())?;
        let hop = vec![0.0; mfcc.config().hop_size];
        Ok(Self {
            source,
            mfcc,
            hop,
            frames: 0,
            done: false,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    /// Frames produced so far.
    pub fn frames_read(&self) -> usize {
        self.frames
    }
}

impl Iterator for MfccStream {
    type Item = Result<Vec<f64>, AudioError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.read(&mut self.hop) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                let mut coefs = vec![0.0; self.mfcc.config().num_coefs];
                self.mfcc.process(&self.hop, &mut coefs);
                self.frames += 1;
                Some(Ok(coefs))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
