// src/filters/fft_bandpass.rs
//! FFT-domain bandpass: zero every spectral bin outside the configured
//! band, then invert.
//!
//! The signal is extended on both ends with tapered even reflections
//! before transforming. The extension absorbs circular-wraparound
//! artifacts and its raised-cosine taper limits spectral leakage; the
//! kept region itself is never windowed, so a full-band configuration
//! reproduces the input.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Apply the bandpass to a sample sequence. `low_hz == 0.0` keeps the DC
/// component; callers validate `low_hz < high_hz < Nyquist`.
pub fn filter(samples: &[f32], sample_rate_hz: f32, low_hz: f32, high_hz: f32) -> Vec<f32> {
    let n = samples.len();
    if n < 2 {
        return samples.to_vec();
    }

    let pad = (n / 4).clamp(8, 512).min(n - 1);
    let fft_len = (n + 2 * pad).next_power_of_two();

    let mut spectrum = vec![Complex::new(0.0f32, 0.0); fft_len];
    for (i, &s) in samples.iter().enumerate() {
        spectrum[pad + i] = Complex::new(s, 0.0);
    }
    // Tapered even reflections; fade to zero away from the signal.
    for d in 1..=pad {
        let taper = 0.5 * (1.0 + (PI * d as f32 / (pad as f32 + 1.0)).cos());
        spectrum[pad - d] = Complex::new(samples[d.min(n - 1)] * taper, 0.0);
        spectrum[pad + n - 1 + d] = Complex::new(samples[n - 1 - d.min(n - 1)] * taper, 0.0);
    }

    let mut planner = FftPlanner::<f32>::new();
    planner.plan_fft_forward(fft_len).process(&mut spectrum);

    let bin_hz = sample_rate_hz / fft_len as f32;
    for (k, bin) in spectrum.iter_mut().enumerate() {
        // Positive and negative frequencies treated symmetrically.
        let idx = if k <= fft_len / 2 { k } else { fft_len - k };
        let freq = idx as f32 * bin_hz;
        if freq < low_hz || freq > high_hz {
            *bin = Complex::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(fft_len).process(&mut spectrum);

    let scale = 1.0 / fft_len as f32;
    spectrum[pad..pad + n].iter().map(|c| c.re * scale).collect()
}
