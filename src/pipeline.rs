// src/pipeline.rs
//! Pipeline orchestration: an ordered stage sequence applied over signal
//! buffers, with explicit per-stage state carried across streaming chunks.

use crate::adaptive::{self, AdaptiveDiagnostics, NoisePatternLibrary, PatternSnapshot};
use crate::buffer::SignalBuffer;
use crate::config::FilterConfig;
use crate::error::{CoreError, CoreResult};
use crate::filters::{self, KernelDiagnostics};
use crate::metrics;
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Largest tolerated fraction of invalid (non-finite or masked) samples.
pub const MAX_INVALID_FRACTION: f32 = 0.01;

/// Stage-kind specific diagnostic detail.
#[derive(Debug, Clone, PartialEq)]
pub enum StageDetail {
    /// A traditional filter kernel ran.
    Kernel(KernelDiagnostics),
    /// The adaptive canceller ran.
    Adaptive(AdaptiveDiagnostics),
}

/// Diagnostics for one executed stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDiagnostics {
    /// Stage index in declaration order.
    pub stage: usize,
    /// Filter kind label.
    pub label: &'static str,
    /// Estimated SNR entering the stage, in dB.
    pub snr_before_db: f32,
    /// Estimated SNR leaving the stage, in dB.
    pub snr_after_db: f32,
    /// Energy of the component this stage removed.
    pub energy_removed: f32,
    /// Kind-specific detail.
    pub detail: StageDetail,
}

/// Aggregated diagnostics for one `run` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Per-stage diagnostics in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Estimated SNR of the input chunk, in dB.
    pub snr_in_db: f32,
    /// Estimated SNR of the final output, in dB.
    pub snr_out_db: f32,
    /// Sum of energy removed across stages.
    pub total_energy_removed: f32,
}

/// Per-stage state carried across successive chunks of one stream.
#[derive(Debug, Clone)]
pub enum StageState {
    /// Pure kernels keep no state between chunks.
    Stateless,
    /// The adaptive canceller accumulates its pattern library.
    Adaptive(NoisePatternLibrary),
}

/// One configured stage plus its carried state.
#[derive(Debug, Clone)]
pub struct PipelineStage {
    config: FilterConfig,
    state: StageState,
}

impl PipelineStage {
    fn new(config: FilterConfig) -> Self {
        let state = match &config {
            FilterConfig::AdaptiveCancel(cfg) => {
                StageState::Adaptive(NoisePatternLibrary::new(cfg))
            }
            _ => StageState::Stateless,
        };
        Self { config, state }
    }

    /// Stage configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

/// Ordered filter pipeline over signal buffers.
///
/// Stage order is fixed at construction. One pipeline instance owns its
/// adaptive state exclusively; concurrency happens across independent
/// instances (see [`run_independent`]), never inside one.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    stages: Vec<PipelineStage>,
    samples_seen: u64,
}

impl FilterPipeline {
    /// Build a pipeline from stage configurations in application order.
    pub fn new(configs: Vec<FilterConfig>) -> Self {
        Self {
            stages: configs.into_iter().map(PipelineStage::new).collect(),
            samples_seen: 0,
        }
    }

    /// Number of configured stages.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stream sample clock: total samples processed so far.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Validate every stage configuration against the buffer, plus the
    /// buffer's own data quality, without executing anything. A failure
    /// anywhere surfaces before any stage runs.
    pub fn validate(&self, buffer: &SignalBuffer) -> CoreResult<()> {
        let invalid = buffer.invalid_fraction();
        if invalid > MAX_INVALID_FRACTION {
            return Err(CoreError::data(format!(
                "{:.1}% of samples are invalid, tolerance is {:.1}%",
                invalid * 100.0,
                MAX_INVALID_FRACTION * 100.0
            )));
        }
        for stage in &self.stages {
            stage
                .config
                .validate(buffer.sample_rate_hz(), buffer.len())?;
        }
        Ok(())
    }

    /// Apply all stages in order to one chunk.
    ///
    /// All-or-nothing: configuration or data errors abort before the first
    /// stage executes, so callers never observe a half-filtered chunk and
    /// state accumulated from prior chunks stays untouched.
    pub fn run(&mut self, buffer: &SignalBuffer) -> CoreResult<(SignalBuffer, PipelineReport)> {
        self.validate(buffer)?;

        let snr_in_db = metrics::estimate_snr_db(buffer.samples());
        let mut current = buffer.clone();
        let mut stages = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter_mut().enumerate() {
            let started = Instant::now();
            let snr_before_db = metrics::estimate_snr_db(current.samples());

            let (next, energy_removed, detail) = match (&stage.config, &mut stage.state) {
                (FilterConfig::AdaptiveCancel(cfg), StageState::Adaptive(library)) => {
                    let (next, diag) =
                        adaptive::apply(&current, library, cfg, index, self.samples_seen)?;
                    (next, diag.energy_removed, StageDetail::Adaptive(diag))
                }
                (config, _) => {
                    let (next, diag) = filters::apply_kernel(config, &current, index)?;
                    (next, diag.energy_removed, StageDetail::Kernel(diag))
                }
            };

            let snr_after_db = metrics::estimate_snr_db(next.samples());
            debug!(
                stage = index,
                label = stage.config.label(),
                elapsed_us = started.elapsed().as_micros() as u64,
                energy_removed,
                "stage complete"
            );
            stages.push(StageDiagnostics {
                stage: index,
                label: stage.config.label(),
                snr_before_db,
                snr_after_db,
                energy_removed,
                detail,
            });
            current = next;
        }

        self.samples_seen += buffer.len() as u64;

        let report = PipelineReport {
            snr_in_db,
            snr_out_db: metrics::estimate_snr_db(current.samples()),
            total_energy_removed: stages.iter().map(|s| s.energy_removed).sum(),
            stages,
        };
        Ok((current, report))
    }

    /// Read-only snapshot of the pattern library held by the given stage,
    /// if that stage is an adaptive canceller.
    pub fn library_snapshot(&self, stage: usize) -> Option<Vec<PatternSnapshot>> {
        match self.stages.get(stage).map(|s| &s.state) {
            Some(StageState::Adaptive(library)) => Some(library.snapshot()),
            _ => None,
        }
    }
}

/// Run independent pipeline instances over their own buffers in parallel.
///
/// Each pipeline owns its state exclusively, so instances never contend;
/// pairs beyond the shorter slice are ignored.
pub fn run_independent(
    pipelines: &mut [FilterPipeline],
    buffers: &[SignalBuffer],
) -> Vec<CoreResult<(SignalBuffer, PipelineReport)>> {
    pipelines
        .par_iter_mut()
        .zip(buffers.par_iter())
        .map(|(pipeline, buffer)| pipeline.run(buffer))
        .collect()
}
