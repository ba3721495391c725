// src/filters/butterworth.rs
//! Butterworth IIR filtering with zero-phase (forward-backward) passes.
//!
//! Coefficients come from the analog Butterworth pole layout: each
//! conjugate pole pair maps to one digital biquad via the bilinear
//! transform with cutoff pre-warping; odd orders add a first-order
//! section. The cascade runs forward and backward over an odd-reflection
//! padded copy of the signal, cancelling phase distortion.

use crate::config::{Band, MAX_BUTTERWORTH_ORDER};
use crate::error::{CoreError, CoreResult};
use std::f64::consts::PI;

/// One cascade section in Direct Form II transposed. First-order sections
/// leave `b2` and `a2` at zero.
#[derive(Debug, Clone, Copy)]
struct Section {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Section {
    fn run(&self, samples: &mut [f64]) {
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for value in samples.iter_mut() {
            let x = *value;
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            *value = y;
        }
    }
}

fn biquad(k: f64, q: f64, highpass: bool) -> Section {
    let k2 = k * k;
    let norm = 1.0 / (1.0 + k / q + k2);
    let a1 = 2.0 * (k2 - 1.0) * norm;
    let a2 = (1.0 - k / q + k2) * norm;
    if highpass {
        Section {
            b0: norm,
            b1: -2.0 * norm,
            b2: norm,
            a1,
            a2,
        }
    } else {
        Section {
            b0: k2 * norm,
            b1: 2.0 * k2 * norm,
            b2: k2 * norm,
            a1,
            a2,
        }
    }
}

fn first_order(k: f64, highpass: bool) -> Section {
    let norm = 1.0 / (k + 1.0);
    let a1 = (k - 1.0) * norm;
    if highpass {
        Section {
            b0: norm,
            b1: -norm,
            b2: 0.0,
            a1,
            a2: 0.0,
        }
    } else {
        Section {
            b0: k * norm,
            b1: k * norm,
            b2: 0.0,
            a1,
            a2: 0.0,
        }
    }
}

/// Cascade for a single cutoff. Pole-pair angles: π(2i+1)/(2N) for even N,
/// π(i+1)/N for odd N, plus the real pole as a first-order section.
fn design_edge(cutoff_hz: f32, order: usize, sample_rate_hz: f32, highpass: bool) -> Vec<Section> {
    // Pre-warp the cutoff for the bilinear transform.
    let k = (PI * f64::from(cutoff_hz) / f64::from(sample_rate_hz)).tan();
    let n = order as f64;

    let mut sections = Vec::with_capacity(order / 2 + 1);
    for i in 0..order / 2 {
        let alpha = if order % 2 == 0 {
            PI * (2.0 * i as f64 + 1.0) / (2.0 * n)
        } else {
            PI * (i as f64 + 1.0) / n
        };
        let q = 1.0 / (2.0 * alpha.cos());
        sections.push(biquad(k, q, highpass));
    }
    if order % 2 == 1 {
        sections.push(first_order(k, highpass));
    }
    sections
}

fn design(band: &Band, order: usize, sample_rate_hz: f32) -> CoreResult<Vec<Section>> {
    let nyquist = sample_rate_hz / 2.0;
    if order == 0 || order > MAX_BUTTERWORTH_ORDER {
        return Err(CoreError::config(
            "butterworth",
            format!("order must be 1-{}, got {}", MAX_BUTTERWORTH_ORDER, order),
        ));
    }
    let check = |cutoff: f32| -> CoreResult<()> {
        if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
            return Err(CoreError::config(
                "butterworth",
                format!("cutoff {} outside (0, Nyquist {})", cutoff, nyquist),
            ));
        }
        Ok(())
    };
    match band {
        Band::Lowpass { cutoff_hz } => {
            check(*cutoff_hz)?;
            Ok(design_edge(*cutoff_hz, order, sample_rate_hz, false))
        }
        Band::Highpass { cutoff_hz } => {
            check(*cutoff_hz)?;
            Ok(design_edge(*cutoff_hz, order, sample_rate_hz, true))
        }
        Band::Bandpass { low_hz, high_hz } => {
            check(*low_hz)?;
            check(*high_hz)?;
            if low_hz >= high_hz {
                return Err(CoreError::config(
                    "butterworth",
                    format!("band edges must satisfy low {} < high {}", low_hz, high_hz),
                ));
            }
            // Highpass at the low edge cascaded with lowpass at the high
            // edge, each of the requested order.
            let mut sections = design_edge(*low_hz, order, sample_rate_hz, true);
            sections.extend(design_edge(*high_hz, order, sample_rate_hz, false));
            Ok(sections)
        }
    }
}

/// Bidirectional Butterworth pass. Output length always equals input
/// length; the odd-reflection padding only shapes the transient region.
pub fn filtfilt(
    samples: &[f32],
    sample_rate_hz: f32,
    band: &Band,
    order: usize,
) -> CoreResult<Vec<f32>> {
    let sections = design(band, order, sample_rate_hz)?;
    let n = samples.len();
    if n < 2 {
        return Ok(samples.to_vec());
    }

    let padlen = (3 * (2 * order + 1)).min(n - 1);
    let mut extended: Vec<f64> = Vec::with_capacity(n + 2 * padlen);
    let first = f64::from(samples[0]);
    let last = f64::from(samples[n - 1]);
    for i in 0..padlen {
        extended.push(2.0 * first - f64::from(samples[padlen - i]));
    }
    extended.extend(samples.iter().map(|&s| f64::from(s)));
    for i in 0..padlen {
        extended.push(2.0 * last - f64::from(samples[n - 2 - i]));
    }

    for section in &sections {
        section.run(&mut extended);
    }
    extended.reverse();
    for section in &sections {
        section.run(&mut extended);
    }
    extended.reverse();

    Ok(extended[padlen..padlen + n].iter().map(|&v| v as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::band_power;
    use std::f32::consts::PI as PI32;

    fn sine(freq: f32, rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI32 * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn test_dc_gain_of_lowpass_is_unity() {
        let input = vec![1.0f32; 500];
        let band = Band::Lowpass { cutoff_hz: 20.0 };
        let output = filtfilt(&input, 1000.0, &band, 4).unwrap();
        for &v in &output[50..450] {
            assert!((v - 1.0).abs() < 1e-3, "dc gain drift: {}", v);
        }
    }

    #[test]
    fn test_lowpass_attenuates_hum() {
        let rate = 1000.0;
        let mut input = sine(10.0, rate, 1000);
        for (s, h) in input.iter_mut().zip(sine(50.0, rate, 1000)) {
            *s += h;
        }
        let band = Band::Lowpass { cutoff_hz: 20.0 };
        let output = filtfilt(&input, rate, &band, 4).unwrap();

        let high_before = band_power(&input, rate, 20.0, 500.0);
        let high_after = band_power(&output, rate, 20.0, 500.0);
        assert!(high_after < 0.1 * high_before);
    }

    #[test]
    fn test_length_preserved_across_valid_orders() {
        let input = sine(5.0, 250.0, 333);
        for order in 1..=MAX_BUTTERWORTH_ORDER {
            for band in [
                Band::Lowpass { cutoff_hz: 30.0 },
                Band::Highpass { cutoff_hz: 30.0 },
                Band::Bandpass {
                    low_hz: 10.0,
                    high_hz: 60.0,
                },
            ] {
                let output = filtfilt(&input, 250.0, &band, order).unwrap();
                assert_eq!(output.len(), input.len());
            }
        }
    }

    #[test]
    fn test_bandpass_keeps_center_tone() {
        let rate = 1000.0;
        let input = sine(40.0, rate, 2000);
        let band = Band::Bandpass {
            low_hz: 20.0,
            high_hz: 80.0,
        };
        let output = filtfilt(&input, rate, &band, 2).unwrap();
        let kept = band_power(&output, rate, 35.0, 45.0);
        let original = band_power(&input, rate, 35.0, 45.0);
        assert!(kept > 0.5 * original);
    }

    #[test]
    fn test_rejects_order_beyond_ceiling() {
        let input = sine(5.0, 1000.0, 100);
        let band = Band::Lowpass { cutoff_hz: 20.0 };
        assert!(filtfilt(&input, 1000.0, &band, 50).is_err());
        assert!(filtfilt(&input, 1000.0, &band, 0).is_err());
    }

    #[test]
    fn test_zero_phase_keeps_peak_position() {
        let rate = 1000.0;
        let n = 1000;
        // Gaussian bump centered at 500.
        let input: Vec<f32> = (0..n)
            .map(|i| (-((i as f32 - 500.0) / 40.0).powi(2)).exp())
            .collect();
        let band = Band::Lowpass { cutoff_hz: 30.0 };
        let output = filtfilt(&input, rate, &band, 4).unwrap();
        let peak = output
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - 500).abs() <= 2, "peak shifted to {}", peak);
    }
}
