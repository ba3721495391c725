// tests/filter_tests.rs
// Kernel-level behavior of the traditional filters.

use chamo_core::filters::apply_kernel;
use chamo_core::metrics::{band_power, diff_energy, residual_energy};
use chamo_core::{Band, CoreError, FilterConfig, SignalBuffer};
use std::f32::consts::PI;

fn noisy_sine(n: usize, rate: f32, noise_freq: f32, noise_amp: f32) -> SignalBuffer {
    let samples: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / rate;
            (2.0 * PI * 10.0 * t).sin() + noise_amp * (2.0 * PI * noise_freq * t).sin()
        })
        .collect();
    SignalBuffer::from_raw(samples, rate).unwrap()
}

#[test]
fn savitzky_golay_smoothing_contracts() {
    let buffer = noisy_sine(1000, 1000.0, 200.0, 0.5);
    let config = FilterConfig::SavitzkyGolay {
        window_length: 21,
        poly_order: 3,
    };

    let (once, _) = apply_kernel(&config, &buffer, 0).unwrap();
    let (twice, _) = apply_kernel(&config, &once, 1).unwrap();

    // High-frequency energy decreases monotonically, and the second
    // application changes the signal less than the first.
    assert!(diff_energy(once.samples()) < diff_energy(buffer.samples()));
    assert!(diff_energy(twice.samples()) <= diff_energy(once.samples()));
    let first_change = residual_energy(buffer.samples(), once.samples());
    let second_change = residual_energy(once.samples(), twice.samples());
    assert!(second_change < first_change);
}

#[test]
fn savitzky_golay_window_at_signal_boundary() {
    let buffer = SignalBuffer::from_raw(vec![1.0; 52], 1000.0).unwrap();

    // Window of length n - 1 (odd) is valid.
    let at_limit = FilterConfig::SavitzkyGolay {
        window_length: 51,
        poly_order: 3,
    };
    assert!(apply_kernel(&at_limit, &buffer, 0).is_ok());

    // Window exceeding the signal fails before computation.
    let too_long = FilterConfig::SavitzkyGolay {
        window_length: 53,
        poly_order: 3,
    };
    let err = apply_kernel(&too_long, &buffer, 0);
    assert!(matches!(err, Err(CoreError::Config { .. })));
}

#[test]
fn fft_bandpass_full_range_round_trips() {
    let buffer = noisy_sine(1000, 1000.0, 50.0, 0.4);
    let config = FilterConfig::FftBandpass {
        low_hz: 0.0,
        high_hz: 499.9,
    };
    let (out, _) = apply_kernel(&config, &buffer, 0).unwrap();
    for (a, b) in buffer.samples().iter().zip(out.samples()) {
        assert!((a - b).abs() < 1e-3, "round trip drift: {} vs {}", a, b);
    }
}

#[test]
fn butterworth_preserves_sample_count_for_all_valid_configs() {
    let buffer = noisy_sine(733, 1000.0, 50.0, 0.4);
    for order in 1..=8 {
        for band in [
            Band::Lowpass { cutoff_hz: 20.0 },
            Band::Highpass { cutoff_hz: 100.0 },
            Band::Bandpass {
                low_hz: 5.0,
                high_hz: 100.0,
            },
        ] {
            let config = FilterConfig::Butterworth { band, order };
            let (out, _) = apply_kernel(&config, &buffer, 0).unwrap();
            assert_eq!(out.len(), buffer.len());
        }
    }
}

#[test]
fn butterworth_lowpass_removes_mains_hum() {
    // 10 Hz tone with additive 50 Hz noise at 1000 Hz sampling; lowpass at
    // 20 Hz order 4 must cut power above 20 Hz by at least 90 percent.
    let buffer = noisy_sine(1000, 1000.0, 50.0, 1.0);
    let config = FilterConfig::Butterworth {
        band: Band::Lowpass { cutoff_hz: 20.0 },
        order: 4,
    };
    let (out, diag) = apply_kernel(&config, &buffer, 0).unwrap();

    let high_before = band_power(buffer.samples(), 1000.0, 20.0, 500.0);
    let high_after = band_power(out.samples(), 1000.0, 20.0, 500.0);
    assert!(
        high_after < 0.1 * high_before,
        "only reduced {} -> {}",
        high_before,
        high_after
    );
    assert!(diag.energy_removed > 0.0);
}

#[test]
fn kernels_repair_isolated_invalid_samples() {
    let mut samples: Vec<f32> = (0..500)
        .map(|i| (2.0 * PI * 10.0 * i as f32 / 1000.0).sin())
        .collect();
    samples[250] = f32::NAN;
    let buffer = SignalBuffer::from_raw(samples, 1000.0).unwrap();
    let config = FilterConfig::SavitzkyGolay {
        window_length: 11,
        poly_order: 2,
    };
    let (out, _) = apply_kernel(&config, &buffer, 0).unwrap();
    assert!(out.samples().iter().all(|s| s.is_finite()));
}
