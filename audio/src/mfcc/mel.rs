//! Slaney-style mel filter bank.
//!
//! Band edges follow Malcolm Slaney's Auditory Toolbox layout: a run of
//! linearly spaced filters starting at 133.33 Hz, then log-spaced filters.
//! Each triangle has unit area.

const LOWEST_FREQUENCY: f64 = 133.333_3;
const LINEAR_SPACING: f64 = 66.666_666_66;
const LOG_SPACING: f64 = 1.071_170_3;
const LINEAR_FILTERS: usize = 13;

/// Returns the `num_filters + 2` band edge frequencies in Hz.
pub fn slaney_edges(num_filters: usize) -> Vec<f64> {
    let linear = LINEAR_FILTERS.min(num_filters);
    let mut edges = Vec::with_capacity(num_filters + 2);
    for i in 0..linear {
        edges.push(LOWEST_FREQUENCY + i as f64 * LINEAR_SPACING);
    }
    let last_linear = edges.last().copied().unwrap_or(LOWEST_FREQUENCY);
    let mut step = 1;
    while edges.len() < num_filters + 2 {
        edges.push(last_linear * LOG_SPACING.powi(step));
        step += 1;
    }
    edges
}

/// Creates the filter bank matrix.
///
/// Returns `[num_filters][window_size / 2 + 1]`. Filters reaching past the
/// Nyquist frequency are truncated.
pub fn mel_filter_bank(num_filters: usize, window_size: usize, sample_rate: u32) -> Vec<Vec<f64>> {
    let bins = window_size / 2 + 1;
    let bin_hz = sample_rate as f64 / window_size as f64;
    let edges = slaney_edges(num_filters);

    let mut bank = Vec::with_capacity(num_filters);
    for m in 0..num_filters {
        let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
        let height = 2.0 / (upper - lower);

        let mut filter = vec![0.0f64; bins];
        for (k, w) in filter.iter_mut().enumerate() {
            let f = k as f64 * bin_hz;
            *w = if f > lower && f < center {
                height * (f - lower) / (center - lower)
            } else if f >= center && f < upper {
                height * (upper - f) / (upper - center)
            } else {
                0.0
            };
        }
        bank.push(filter);
    }
    bank
}
