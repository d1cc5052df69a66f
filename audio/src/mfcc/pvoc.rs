//! Phase vocoder front-end: overlapping windowed short-time spectra.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Magnitude and phase of one analysis window, `window_size / 2 + 1` bins each.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub norm: Vec<f64>,
    pub phase: Vec<f64>,
}

impl Spectrum {
    pub fn new(bins: usize) -> Self {
        Self {
            norm: vec![0.0; bins],
            phase: vec![0.0; bins],
        }
    }
}

/// Generates a periodic Hann window of the given length.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Sliding-window short-time Fourier transform.
///
/// Each call to [`PhaseVocoder::process`] shifts `hop_size` new samples into
/// a `window_size` history buffer, so consecutive windows overlap by
/// `window_size - hop_size` samples. The buffer starts zeroed.
pub struct PhaseVocoder {
    window_size: usize,
    hop_size: usize,
    window: Vec<f64>,
    history: Vec<f64>,
    buffer: Vec<Complex<f64>>,
    fft: Arc<dyn Fft<f64>>,
}

impl PhaseVocoder {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(window_size);
        Self {
            window_size,
            hop_size,
            window: hann_window(window_size),
            history: vec![0.0; window_size],
            buffer: vec![Complex::new(0.0, 0.0); window_size],
            fft,
        }
    }

    /// Number of spectrum bins produced per window.
    pub fn bins(&self) -> usize {
        self.window_size / 2 + 1
    }

    /// Pushes one hop of samples and writes the resulting spectrum.
    pub fn process(&mut self, hop: &[f32], out: &mut Spectrum) {
        debug_assert_eq!(hop.len(), self.hop_size);

        let keep = self.window_size - self.hop_size;
        self.history.copy_within(self.hop_size.., 0);
        for (dst, &s) in self.history[keep..].iter_mut().zip(hop) {
            *dst = s as f64;
        }

        for ((c, &s), &w) in self.buffer.iter_mut().zip(&self.history).zip(&self.window) {
            *c = Complex::new(s * w, 0.0);
        }
        // Zero-phase: centre of the window moves to index 0.
        self.buffer.rotate_left(self.window_size / 2);
        self.fft.process(&mut self.buffer);

        for (k, c) in self.buffer.iter().take(self.bins()).enumerate() {
            out.norm[k] = c.norm();
            out.phase[k] = c.arg();
        }
    }
}
