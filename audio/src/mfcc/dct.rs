//! Orthonormal DCT-II, truncated to the leading coefficients.

use std::f64::consts::PI;

pub struct Dct {
    input_len: usize,
    rows: Vec<Vec<f64>>,
}

impl Dct {
    /// Builds the first `output_len` rows of an `input_len`-point DCT-II.
    pub fn new(input_len: usize, output_len: usize) -> Self {
        let n = input_len as f64;
        let rows = (0..output_len)
            .map(|k| {
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..input_len)
                    .map(|i| scale * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n)).cos())
                    .collect()
            })
            .collect();
        Self { input_len, rows }
    }

    pub fn process(&self, input: &[f64], out: &mut [f64]) {
        debug_assert_eq!(input.len(), self.input_len);
        for (o, row) in out.iter_mut().zip(&self.rows) {
            *o = row.iter().zip(input).map(|(c, x)| c * x).sum();
        }
    }
}
