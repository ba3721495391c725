// src/config.rs
//! Filter and pipeline configuration.
//!
//! Filter kinds form a closed set dispatched through one `apply` entry
//! point; every kind validates its parameters against the buffer it is
//! about to process, before any computation runs. Violations are never
//! silently clamped.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Highest accepted Butterworth order. Higher orders make the bilinear
/// coefficient formulas numerically unstable in cascade form.
pub const MAX_BUTTERWORTH_ORDER: usize = 8;

/// Frequency band selection for the Butterworth filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Band {
    /// Pass frequencies below the cutoff.
    Lowpass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f32,
    },
    /// Pass frequencies above the cutoff.
    Highpass {
        /// Cutoff frequency in Hz.
        cutoff_hz: f32,
    },
    /// Pass frequencies between the two cutoffs.
    Bandpass {
        /// Lower band edge in Hz.
        low_hz: f32,
        /// Upper band edge in Hz.
        high_hz: f32,
    },
}

/// Parameters of the adaptive noise canceller and its pattern library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Length of noise templates in samples.
    pub template_len: usize,
    /// Running-average blend factor for template reinforcement, in (0, 1].
    pub learning_rate: f32,
    /// Normalized cross-correlation threshold for a pattern match; also
    /// sets the energy-ratio gate for cancellation.
    pub similarity_threshold: f32,
    /// Maximum number of patterns retained by the library.
    pub library_capacity: usize,
    /// Reinforcements required before a pattern is used for cancellation.
    pub min_observations: u32,
    /// Confidence below which a pattern is evicted during decay.
    pub confidence_floor: f32,
    /// Confidence added on each reinforcement (capped at 1.0).
    pub confidence_gain: f32,
    /// Confidence assigned to a freshly inserted candidate.
    pub initial_confidence: f32,
    /// Exponential confidence decay rate, per second without reinforcement.
    pub decay_rate_per_s: f32,
    /// Quiet-segment tolerance: allowed deviation of a window mean from the
    /// buffer baseline, in robust-sigma units.
    pub quiet_mean_tolerance: f32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            template_len: 1000,
            learning_rate: 0.1,
            similarity_threshold: 0.85,
            library_capacity: 50,
            min_observations: 3,
            confidence_floor: 0.1,
            confidence_gain: 0.1,
            initial_confidence: 0.5,
            decay_rate_per_s: 0.05,
            quiet_mean_tolerance: 1.0,
        }
    }
}

/// Configuration of a single filter stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Local least-squares polynomial smoothing.
    SavitzkyGolay {
        /// Sliding window length in samples; must be odd.
        window_length: usize,
        /// Polynomial order; must be less than the window length.
        poly_order: usize,
    },
    /// Frequency-domain bandpass: bins outside the band are zeroed.
    FftBandpass {
        /// Lower band edge in Hz; 0.0 keeps the DC component.
        low_hz: f32,
        /// Upper band edge in Hz; must be below Nyquist.
        high_hz: f32,
    },
    /// Zero-phase Butterworth IIR filter.
    Butterworth {
        /// Band selection and cutoff frequencies.
        band: Band,
        /// Filter order, 1 to [`MAX_BUTTERWORTH_ORDER`].
        order: usize,
    },
    /// Adaptive cancellation of learned noise patterns.
    AdaptiveCancel(AdaptiveConfig),
}

impl FilterConfig {
    /// Savitzky-Golay smoothing with the historical defaults (51/3).
    pub fn savitzky_golay_default() -> Self {
        FilterConfig::SavitzkyGolay {
            window_length: 51,
            poly_order: 3,
        }
    }

    /// Short label for diagnostics and logging.
    pub fn label(&self) -> &'static str {
        match self {
            FilterConfig::SavitzkyGolay { .. } => "savitzky-golay",
            FilterConfig::FftBandpass { .. } => "fft-bandpass",
            FilterConfig::Butterworth { .. } => "butterworth",
            FilterConfig::AdaptiveCancel(_) => "adaptive-cancel",
        }
    }

    /// Check mathematical feasibility against the buffer this stage would
    /// process. Fails with [`CoreError::Config`]; nothing is clamped.
    pub fn validate(&self, sample_rate_hz: f32, signal_len: usize) -> CoreResult<()> {
        let nyquist = sample_rate_hz / 2.0;
        match self {
            FilterConfig::SavitzkyGolay {
                window_length,
                poly_order,
            } => {
                if *window_length % 2 == 0 {
                    return Err(CoreError::config(
                        "savitzky-golay",
                        format!("window length {} must be odd", window_length),
                    ));
                }
                if *window_length <= *poly_order {
                    return Err(CoreError::config(
                        "savitzky-golay",
                        format!(
                            "window length {} must exceed polynomial order {}",
                            window_length, poly_order
                        ),
                    ));
                }
                if *window_length > signal_len {
                    return Err(CoreError::config(
                        "savitzky-golay",
                        format!(
                            "window length {} exceeds signal length {}",
                            window_length, signal_len
                        ),
                    ));
                }
                Ok(())
            }
            FilterConfig::FftBandpass { low_hz, high_hz } => {
                if !low_hz.is_finite() || !high_hz.is_finite() || *low_hz < 0.0 {
                    return Err(CoreError::config(
                        "fft-bandpass",
                        format!("cutoffs ({}, {}) must be finite and non-negative", low_hz, high_hz),
                    ));
                }
                if low_hz >= high_hz {
                    return Err(CoreError::config(
                        "fft-bandpass",
                        format!("low cutoff {} must be below high cutoff {}", low_hz, high_hz),
                    ));
                }
                if *high_hz >= nyquist {
                    return Err(CoreError::config(
                        "fft-bandpass",
                        format!("high cutoff {} must be below Nyquist {}", high_hz, nyquist),
                    ));
                }
                Ok(())
            }
            FilterConfig::Butterworth { band, order } => {
                if *order == 0 || *order > MAX_BUTTERWORTH_ORDER {
                    return Err(CoreError::config(
                        "butterworth",
                        format!("order must be 1-{}, got {}", MAX_BUTTERWORTH_ORDER, order),
                    ));
                }
                let check_cutoff = |cutoff: f32| -> CoreResult<()> {
                    if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
                        return Err(CoreError::config(
                            "butterworth",
                            format!("cutoff {} outside (0, Nyquist {})", cutoff, nyquist),
                        ));
                    }
                    Ok(())
                };
                match band {
                    Band::Lowpass { cutoff_hz } | Band::Highpass { cutoff_hz } => {
                        check_cutoff(*cutoff_hz)
                    }
                    Band::Bandpass { low_hz, high_hz } => {
                        check_cutoff(*low_hz)?;
                        check_cutoff(*high_hz)?;
                        if low_hz >= high_hz {
                            return Err(CoreError::config(
                                "butterworth",
                                format!(
                                    "band edges must satisfy low {} < high {}",
                                    low_hz, high_hz
                                ),
                            ));
                        }
                        Ok(())
                    }
                }
            }
            FilterConfig::AdaptiveCancel(cfg) => {
                if cfg.template_len < 4 {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        format!("template length {} too short, need at least 4", cfg.template_len),
                    ));
                }
                if cfg.template_len > signal_len {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        format!(
                            "template length {} exceeds signal length {}",
                            cfg.template_len, signal_len
                        ),
                    ));
                }
                if !(cfg.learning_rate > 0.0 && cfg.learning_rate <= 1.0) {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        format!("learning rate {} outside (0, 1]", cfg.learning_rate),
                    ));
                }
                if !(cfg.similarity_threshold > 0.0 && cfg.similarity_threshold < 1.0) {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        format!("similarity threshold {} outside (0, 1)", cfg.similarity_threshold),
                    ));
                }
                if cfg.library_capacity == 0 {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        "library capacity must be at least 1",
                    ));
                }
                if !(cfg.confidence_floor >= 0.0 && cfg.confidence_floor < cfg.initial_confidence)
                {
                    return Err(CoreError::config(
                        "adaptive-cancel",
                        format!(
                            "confidence floor {} must sit below initial confidence {}",
                            cfg.confidence_floor, cfg.initial_confidence
                        ),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Ordered stage list for a pipeline, loadable from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Stage configurations in application order.
    pub stages: Vec<FilterConfig>,
}

impl PipelineSettings {
    /// Load settings from a TOML file.
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
