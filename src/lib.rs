//! ChaMo-Core: denoising core for ion-channel electrophysiology recordings
//!
//! This library removes instrumentation and biological noise from
//! voltage/current trace recordings while preserving channel-gating
//! transitions. It provides:
//!
//! - Traditional filter kernels: Savitzky-Golay smoothing, FFT-domain
//!   bandpass, and zero-phase Butterworth IIR filtering
//! - An adaptive canceller that learns recurring noise patterns from quiet
//!   signal segments and subtracts best-fit copies where they recur
//! - A streaming pipeline that composes stages, carries adaptive state
//!   across chunks, and aggregates quality diagnostics
//!
//! # Quick Start
//!
//! ```rust
//! use chamo_core::{Band, FilterConfig, FilterPipeline, SignalBuffer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let samples: Vec<f32> = (0..1000)
//!         .map(|i| (2.0 * std::f32::consts::PI * 10.0 * i as f32 / 1000.0).sin())
//!         .collect();
//!     let buffer = SignalBuffer::from_raw(samples, 1000.0)?;
//!
//!     let mut pipeline = FilterPipeline::new(vec![
//!         FilterConfig::SavitzkyGolay { window_length: 11, poly_order: 3 },
//!         FilterConfig::Butterworth {
//!             band: Band::Lowpass { cutoff_hz: 20.0 },
//!             order: 4,
//!         },
//!     ]);
//!
//!     let (clean, report) = pipeline.run(&buffer)?;
//!     println!("removed {} energy units", report.total_energy_removed);
//!     assert_eq!(clean.len(), buffer.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adaptive;
pub mod buffer;
pub mod config;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod pipeline;
pub mod synth;
pub mod trace;

// Re-export commonly used types for convenience
pub use adaptive::{AdaptiveDiagnostics, NoisePattern, NoisePatternLibrary, PatternSnapshot};
pub use buffer::{Provenance, SignalBuffer};
pub use config::{AdaptiveConfig, Band, FilterConfig, PipelineSettings};
pub use error::{CoreError, CoreResult};
pub use filters::KernelDiagnostics;
pub use metrics::SignalMetrics;
pub use pipeline::{
    run_independent, FilterPipeline, PipelineReport, StageDetail, StageDiagnostics,
};
pub use trace::{TraceMetadata, TraceSink, TraceSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
