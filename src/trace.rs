// src/trace.rs
//! Collaborator interfaces for trace input and output.
//!
//! The core makes no assumption about file encodings (ATF or otherwise);
//! readers normalize to a [`SignalBuffer`] plus metadata, and writers
//! accept the final buffer with the accumulated diagnostics.

use crate::buffer::SignalBuffer;
use crate::error::CoreResult;
use crate::pipeline::PipelineReport;
use serde::{Deserialize, Serialize};

/// Channel metadata accompanying a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Channel name as recorded by the acquisition system.
    pub channel: String,
    /// Physical units of the samples (e.g. "pA", "mV").
    pub units: String,
    /// Acquisition timestamp, if the source provides one (RFC 3339).
    pub acquired_at: Option<String>,
}

/// Supplies trace chunks to the pipeline.
pub trait TraceSource {
    /// Read the next chunk. Implementations normalize whatever they parse
    /// into a buffer with samples, sampling rate, and validity mask.
    fn read_trace(&mut self) -> CoreResult<(SignalBuffer, TraceMetadata)>;
}

/// Accepts processed traces for export or rendering.
pub trait TraceSink {
    /// Write one processed buffer together with its pipeline report.
    fn write_trace(
        &mut self,
        buffer: &SignalBuffer,
        metadata: &TraceMetadata,
        report: &PipelineReport,
    ) -> CoreResult<()>;
}
