// src/error.rs
//! Unified error handling for the denoising core.
//!
//! Two fatal categories exist: infeasible filter configurations (rejected
//! before any computation) and bad input data (rejected at stage entry).
//! A full pattern library is not an error; dropped inserts are surfaced
//! through stage diagnostics instead.

use thiserror::Error;

/// Unified error type for the denoising core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A filter configuration is mathematically infeasible.
    #[error("invalid {kind} configuration: {reason}")]
    Config {
        /// Filter kind label (e.g. "savitzky-golay").
        kind: &'static str,
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// Input buffer is unusable: empty, inconsistent mask, or too many
    /// non-finite samples.
    #[error("invalid input data: {0}")]
    Data(String),

    /// Filesystem failure while loading settings or persisting the library.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Pattern library (de)serialization failure.
    #[error("pattern library serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pipeline settings file could not be parsed.
    #[error("pipeline settings parse: {0}")]
    Settings(#[from] toml::de::Error),
}

impl CoreError {
    pub(crate) fn config(kind: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Config {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        CoreError::Data(reason.into())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
