// src/synth.rs
//! Synthetic trace generation for tests, benchmarks, and demos.

use crate::buffer::SignalBuffer;
use crate::error::CoreResult;
use crate::trace::{TraceMetadata, TraceSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Deterministic generator of synthetic recordings: tones, mains hum,
/// white noise, and repeating noise bursts.
pub struct TraceSynthesizer {
    sample_rate_hz: f32,
    rng: StdRng,
}

impl TraceSynthesizer {
    /// Create a generator with a fixed seed for reproducible traces.
    pub fn new(sample_rate_hz: f32, seed: u64) -> Self {
        Self {
            sample_rate_hz,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sampling rate of generated traces.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    /// A pure sine tone.
    pub fn sine(&self, freq_hz: f32, amplitude: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / self.sample_rate_hz).sin())
            .collect()
    }

    /// Uniform white noise in `[-amplitude, amplitude]`.
    pub fn white_noise(&mut self, amplitude: f32, samples: usize) -> Vec<f32> {
        (0..samples)
            .map(|_| self.rng.gen_range(-amplitude..amplitude))
            .collect()
    }

    /// A single-cycle zero-mean burst, the shape used as a recurring
    /// noise artifact.
    pub fn burst(&self, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * i as f32 / len as f32).sin())
            .collect()
    }

    /// Copy `burst` into `samples` at each position.
    pub fn inject(samples: &mut [f32], burst: &[f32], positions: &[usize]) {
        for &pos in positions {
            for (i, b) in burst.iter().enumerate() {
                if pos + i < samples.len() {
                    samples[pos + i] += b;
                }
            }
        }
    }

    /// Add `src` into `dst` element-wise.
    pub fn mix(dst: &mut [f32], src: &[f32]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d += s;
        }
    }

    /// Wrap samples in a raw buffer with this generator's sampling rate.
    pub fn buffer(&self, samples: Vec<f32>) -> CoreResult<SignalBuffer> {
        SignalBuffer::from_raw(samples, self.sample_rate_hz)
    }
}

impl TraceSource for TraceSynthesizer {
    /// One second of a 10 Hz tone with 50 Hz mains hum and white noise,
    /// the standard denoising test trace.
    fn read_trace(&mut self) -> CoreResult<(SignalBuffer, TraceMetadata)> {
        let n = self.sample_rate_hz as usize;
        let mut samples = self.sine(10.0, 1.0, n);
        Self::mix(&mut samples, &self.sine(50.0, 0.4, n));
        Self::mix(&mut samples, &self.white_noise(0.1, n));
        let buffer = self.buffer(samples)?;
        Ok((
            buffer,
            TraceMetadata {
                channel: "synthetic-0".to_string(),
                units: "pA".to_string(),
                acquired_at: None,
            },
        ))
    }
}
