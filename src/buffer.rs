// src/buffer.rs
//! Signal buffer: the core data container handed between pipeline stages.
//!
//! A buffer holds a fixed-rate sample sequence with a per-sample validity
//! mask and a provenance tag. Buffers are immutable once produced; a stage
//! always builds a new buffer from its output samples, which keeps replay
//! and stage reordering safe.

use crate::error::{CoreError, CoreResult};

/// Where a buffer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Samples as delivered by the trace reader.
    Raw,
    /// Output of pipeline stage N (zero-based).
    Stage(usize),
}

/// Fixed-rate sample sequence with validity mask and provenance.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    samples: Vec<f32>,
    sample_rate_hz: f32,
    validity: Vec<bool>,
    provenance: Provenance,
}

impl SignalBuffer {
    /// Create a buffer from raw input samples.
    ///
    /// Non-finite samples are retained but marked invalid in the mask;
    /// callers decide how much invalidity they tolerate (the pipeline
    /// rejects buffers above its tolerance at run entry).
    pub fn from_raw(samples: Vec<f32>, sample_rate_hz: f32) -> CoreResult<Self> {
        let validity: Vec<bool> = samples.iter().map(|s| s.is_finite()).collect();
        Self::build(samples, sample_rate_hz, validity, Provenance::Raw)
    }

    /// Create a buffer with an explicit validity mask (e.g. clipped or
    /// gap samples flagged by the trace reader).
    pub fn with_mask(
        samples: Vec<f32>,
        sample_rate_hz: f32,
        mask: Vec<bool>,
    ) -> CoreResult<Self> {
        if mask.len() != samples.len() {
            return Err(CoreError::data(format!(
                "validity mask length {} does not match sample count {}",
                mask.len(),
                samples.len()
            )));
        }
        let validity: Vec<bool> = samples
            .iter()
            .zip(mask)
            .map(|(s, m)| m && s.is_finite())
            .collect();
        Self::build(samples, sample_rate_hz, validity, Provenance::Raw)
    }

    /// Build a successor buffer from a stage's output samples. Sampling
    /// rate is carried forward; validity is re-derived from the output.
    pub fn stage_output(&self, samples: Vec<f32>, stage: usize) -> CoreResult<Self> {
        let validity: Vec<bool> = samples.iter().map(|s| s.is_finite()).collect();
        Self::build(samples, self.sample_rate_hz, validity, Provenance::Stage(stage))
    }

    fn build(
        samples: Vec<f32>,
        sample_rate_hz: f32,
        validity: Vec<bool>,
        provenance: Provenance,
    ) -> CoreResult<Self> {
        if samples.is_empty() {
            return Err(CoreError::data("buffer must contain at least one sample"));
        }
        if !(sample_rate_hz > 0.0) || !sample_rate_hz.is_finite() {
            return Err(CoreError::data(format!(
                "sampling rate must be positive and finite, got {}",
                sample_rate_hz
            )));
        }
        Ok(Self {
            samples,
            sample_rate_hz,
            validity,
            provenance,
        })
    }

    /// Sample values.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; construction rejects empty buffers.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sampling rate in Hz.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    /// Nyquist frequency: half the sampling rate.
    pub fn nyquist_hz(&self) -> f32 {
        self.sample_rate_hz / 2.0
    }

    /// Buffer duration in seconds.
    pub fn duration_s(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate_hz
    }

    /// Per-sample validity mask (same length as the samples).
    pub fn validity(&self) -> &[bool] {
        &self.validity
    }

    /// Provenance tag.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Fraction of samples flagged invalid.
    pub fn invalid_fraction(&self) -> f32 {
        let invalid = self.validity.iter().filter(|v| !**v).count();
        invalid as f32 / self.samples.len() as f32
    }

    /// Working copy with invalid samples repaired by last-valid hold
    /// (leading invalid samples take the first valid value). Returns an
    /// error if no valid sample exists.
    pub fn repaired(&self) -> CoreResult<Vec<f32>> {
        let first_valid = self
            .validity
            .iter()
            .position(|v| *v)
            .ok_or_else(|| CoreError::data("buffer contains no valid samples"))?;

        let mut out = self.samples.clone();
        let mut hold = self.samples[first_valid];
        for (i, sample) in out.iter_mut().enumerate() {
            if self.validity[i] {
                hold = *sample;
            } else {
                *sample = hold;
            }
        }
        Ok(out)
    }

    /// Rolling window view for streaming application: yields
    /// `(offset, window)` pairs of length `len`, advancing by `hop`.
    /// Empty when the buffer is shorter than one window.
    pub fn windows(&self, len: usize, hop: usize) -> impl Iterator<Item = (usize, &[f32])> {
        let hop = hop.max(1);
        let total = self.samples.len();
        let samples = &self.samples;
        (0usize..)
            .map(move |i| i * hop)
            .take_while(move |off| off + len <= total && len > 0)
            .map(move |off| (off, &samples[off..off + len]))
    }
}
