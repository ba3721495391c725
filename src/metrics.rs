// src/metrics.rs
//! Signal quality metrics shared by the pipeline diagnostics and tests.

use rustfft::{num_complex::Complex, FftPlanner};

/// Summary statistics for a sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMetrics {
    /// Arithmetic mean.
    pub mean: f32,
    /// Standard deviation.
    pub std: f32,
    /// Root mean square.
    pub rms: f32,
    /// Peak-to-peak amplitude.
    pub peak_to_peak: f32,
    /// Estimated signal-to-noise ratio in dB.
    pub snr_db: f32,
}

impl SignalMetrics {
    /// Compute metrics over a sample slice.
    pub fn from_samples(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                std: 0.0,
                rms: 0.0,
                peak_to_peak: 0.0,
                snr_db: 0.0,
            };
        }
        let n = samples.len() as f32;
        let mean = samples.iter().sum::<f32>() / n;
        let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / n;
        let rms = (samples.iter().map(|s| s * s).sum::<f32>() / n).sqrt();
        let max = samples.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = samples.iter().cloned().fold(f32::INFINITY, f32::min);

        Self {
            mean,
            std: variance.sqrt(),
            rms,
            peak_to_peak: max - min,
            snr_db: estimate_snr_db(samples),
        }
    }
}

/// Estimate SNR from the first difference: adjacent-sample differences of a
/// band-limited signal are dominated by wideband noise, so half their mean
/// square approximates the noise power.
pub fn estimate_snr_db(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = samples.len() as f32;
    let signal_power = samples.iter().map(|s| s * s).sum::<f32>() / n;
    let noise_power = samples
        .windows(2)
        .map(|w| (w[1] - w[0]) * (w[1] - w[0]))
        .sum::<f32>()
        / (2.0 * (n - 1.0));

    if noise_power <= f32::EPSILON * signal_power || noise_power == 0.0 {
        return f32::INFINITY;
    }
    10.0 * (signal_power / noise_power).log10()
}

/// Spectral power within `[low_hz, high_hz]` (positive frequencies only).
pub fn band_power(samples: &[f32], sample_rate_hz: f32, low_hz: f32, high_hz: f32) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut spectrum: Vec<Complex<f32>> =
        samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut spectrum);

    let bin_hz = sample_rate_hz / n as f32;
    spectrum
        .iter()
        .take(n / 2 + 1)
        .enumerate()
        .filter(|(k, _)| {
            let freq = *k as f32 * bin_hz;
            freq >= low_hz && freq <= high_hz
        })
        .map(|(_, c)| c.norm_sqr())
        .sum::<f32>()
        / (n as f32 * n as f32)
}

/// Energy of the component removed between two equal-length sequences.
pub fn residual_energy(before: &[f32], after: &[f32]) -> f32 {
    before
        .iter()
        .zip(after)
        .map(|(b, a)| (b - a) * (b - a))
        .sum()
}

/// High-frequency energy norm: sum of squared first differences. Used to
/// verify smoothing contraction.
pub fn diff_energy(samples: &[f32]) -> f32 {
    samples.windows(2).map(|w| (w[1] - w[0]) * (w[1] - w[0])).sum()
}
