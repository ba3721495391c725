// src/adaptive/mod.rs
//! Adaptive noise cancellation: a learned pattern library plus the
//! canceller that consumes it.
//!
//! Learning (`observe`) and cancellation (`apply`) stay separately
//! callable operations; the canceller composes them so the learning loop
//! runs concurrently with cancellation rather than as an offline pass.

pub mod canceller;
pub mod pattern_library;

pub use canceller::{apply, AdaptiveDiagnostics};
pub use pattern_library::{
    Match, NoisePattern, NoisePatternLibrary, Observation, PatternSnapshot,
};
