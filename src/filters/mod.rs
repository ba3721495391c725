// src/filters/mod.rs
//! Traditional filter kernels: Savitzky-Golay, FFT bandpass, Butterworth.
//!
//! Kernels are pure functions over sample slices; [`apply_kernel`] wraps
//! them with config validation, invalid-sample repair, and diagnostics.

pub mod butterworth;
pub mod fft_bandpass;
pub mod savitzky_golay;

use crate::buffer::SignalBuffer;
use crate::config::FilterConfig;
use crate::error::{CoreError, CoreResult};
use crate::metrics;

/// Diagnostics produced by a kernel application.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelDiagnostics {
    /// Energy of the removed component: sum of squared differences between
    /// input and output samples.
    pub energy_removed: f32,
}

/// Apply one of the traditional filter kernels to a buffer, producing a new
/// buffer tagged with the given stage index.
///
/// Validates the configuration against the buffer first; adaptive
/// cancellation is stateful and dispatched by the pipeline, not here.
pub fn apply_kernel(
    config: &FilterConfig,
    buffer: &SignalBuffer,
    stage: usize,
) -> CoreResult<(SignalBuffer, KernelDiagnostics)> {
    config.validate(buffer.sample_rate_hz(), buffer.len())?;
    let input = buffer.repaired()?;

    let output = match config {
        FilterConfig::SavitzkyGolay {
            window_length,
            poly_order,
        } => savitzky_golay::smooth(&input, *window_length, *poly_order)?,
        FilterConfig::FftBandpass { low_hz, high_hz } => {
            fft_bandpass::filter(&input, buffer.sample_rate_hz(), *low_hz, *high_hz)
        }
        FilterConfig::Butterworth { band, order } => {
            butterworth::filtfilt(&input, buffer.sample_rate_hz(), band, *order)?
        }
        FilterConfig::AdaptiveCancel(_) => {
            return Err(CoreError::config(
                "adaptive-cancel",
                "adaptive cancellation carries library state and runs through the pipeline",
            ))
        }
    };

    let diagnostics = KernelDiagnostics {
        energy_removed: metrics::residual_energy(&input, &output),
    };
    let out_buffer = buffer.stage_output(output, stage)?;
    Ok((out_buffer, diagnostics))
}
