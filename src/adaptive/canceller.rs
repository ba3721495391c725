// src/adaptive/canceller.rs
//! Adaptive noise cancellation: subtract best-fit copies of learned noise
//! templates where they recur, learning new templates from quiet segments
//! in the same pass.

use crate::adaptive::pattern_library::{NoisePatternLibrary, Observation};
use crate::buffer::SignalBuffer;
use crate::config::AdaptiveConfig;
use crate::error::CoreResult;
use tracing::{debug, trace};

/// Diagnostics of one cancellation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveDiagnostics {
    /// Sliding windows examined.
    pub windows_scanned: usize,
    /// Windows with an established pattern above the similarity threshold.
    pub matches: usize,
    /// Windows where a scaled template was actually subtracted.
    pub cancellations: usize,
    /// New candidate patterns inserted during this pass.
    pub patterns_learned: usize,
    /// Patterns decayed out during this pass.
    pub patterns_evicted: usize,
    /// Patterns held after the pass.
    pub pattern_count: usize,
    /// Cumulative inserts dropped at capacity (library lifetime total).
    pub dropped_inserts: u64,
    /// Energy of all subtracted template copies.
    pub energy_removed: f32,
    /// False when no window anywhere passed match and gate; the buffer then
    /// passed through unchanged. Reported, not an error.
    pub applied: bool,
}

/// Run one cancellation pass over the buffer.
///
/// `stream_offset` is the stream sample clock at the start of this chunk;
/// it stamps pattern reinforcement times so decay works across chunks.
pub fn apply(
    buffer: &SignalBuffer,
    library: &mut NoisePatternLibrary,
    config: &AdaptiveConfig,
    stage: usize,
    stream_offset: u64,
) -> CoreResult<(SignalBuffer, AdaptiveDiagnostics)> {
    let mut out = buffer.repaired()?;
    let patterns_evicted = library.decay(buffer.duration_s());

    let template_len = config.template_len;
    let hop = (template_len / 2).max(1);
    let gate = config.similarity_threshold * config.similarity_threshold;
    let baseline = QuietBaseline::from_samples(&out, config.quiet_mean_tolerance);

    let mut diagnostics = AdaptiveDiagnostics {
        windows_scanned: 0,
        matches: 0,
        cancellations: 0,
        patterns_learned: 0,
        patterns_evicted,
        pattern_count: 0,
        dropped_inserts: 0,
        energy_removed: 0.0,
        applied: false,
    };

    if template_len == 0 || template_len > out.len() {
        diagnostics.pattern_count = library.len();
        diagnostics.dropped_inserts = library.dropped_inserts();
        return Ok((buffer.stage_output(out, stage)?, diagnostics));
    }

    let mut offset = 0;
    while offset + template_len <= out.len() {
        diagnostics.windows_scanned += 1;
        let window: Vec<f32> = out[offset..offset + template_len].to_vec();
        let now = stream_offset + (offset + template_len) as u64;

        let mut cancelled = false;
        if let Some(matched) = library.best_match(&window) {
            diagnostics.matches += 1;
            let mean = window.iter().sum::<f32>() / template_len as f32;
            let total: f32 = window.iter().map(|s| (s - mean) * (s - mean)).sum();
            // Least-squares scale of the unit template against the
            // mean-removed window.
            let scale: f32 = library
                .pattern(matched.id)
                .map(|p| {
                    window
                        .iter()
                        .zip(p.template())
                        .map(|(s, t)| (s - mean) * t)
                        .sum()
                })
                .unwrap_or(0.0);
            let explained = scale * scale;

            // Energy-ratio gate: only subtract when the template accounts
            // for the window, protecting genuine fast transients.
            if total > 0.0 && explained >= gate * total {
                if let Some(pattern) = library.pattern(matched.id) {
                    let template: Vec<f32> = pattern.template().to_vec();
                    for (i, t) in template.iter().enumerate() {
                        out[offset + i] -= scale * t;
                    }
                }
                diagnostics.cancellations += 1;
                diagnostics.energy_removed += explained;
                cancelled = true;
                trace!(
                    offset,
                    id = matched.id,
                    similarity = matched.similarity,
                    scale,
                    "template subtracted"
                );
                // The pre-subtraction window reinforces the pattern.
                library.observe(&window, now);
            }
        }

        if !cancelled && baseline.is_quiet(&window) {
            if let Observation::Inserted(_) = library.observe(&window, now) {
                diagnostics.patterns_learned += 1;
            }
        }

        offset += hop;
    }

    diagnostics.applied = diagnostics.cancellations > 0;
    diagnostics.pattern_count = library.len();
    diagnostics.dropped_inserts = library.dropped_inserts();
    if !diagnostics.applied {
        debug!(
            windows = diagnostics.windows_scanned,
            patterns = diagnostics.pattern_count,
            "no cancellation applied"
        );
    }

    Ok((buffer.stage_output(out, stage)?, diagnostics))
}

/// Quiet-segment classifier: a window is quiet when its mean stays near
/// the buffer baseline. Zero-mean noise transients qualify; gating events
/// (sustained level shifts) push the window mean away and do not.
struct QuietBaseline {
    median: f32,
    tolerance: f32,
}

impl QuietBaseline {
    fn from_samples(samples: &[f32], mean_tolerance: f32) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = sorted[sorted.len() / 2];

        let mut deviations: Vec<f32> = samples.iter().map(|s| (s - median).abs()).collect();
        deviations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mad_sigma = deviations[deviations.len() / 2] * 1.4826;

        let max = samples.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min = samples.iter().cloned().fold(f32::INFINITY, f32::min);
        // MAD collapses on mostly-flat traces; floor the scale at a small
        // fraction of the peak-to-peak range.
        let sigma = mad_sigma.max(0.05 * (max - min)).max(1e-6);

        Self {
            median,
            tolerance: mean_tolerance * sigma,
        }
    }

    fn is_quiet(&self, window: &[f32]) -> bool {
        let mean = window.iter().sum::<f32>() / window.len() as f32;
        (mean - self.median).abs() <= self.tolerance
    }
}
