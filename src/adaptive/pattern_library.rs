// src/adaptive/pattern_library.rs
//! Learned noise-pattern library.
//!
//! Templates are built from quiet (event-free) signal segments, reinforced
//! when a segment re-matches, decayed over time without reinforcement, and
//! evicted at the confidence floor. Insertion keys are monotonically
//! increasing, so serialized field order is insertion order.

use crate::config::AdaptiveConfig;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Segments with less centered energy than this carry nothing to learn.
const MIN_SEGMENT_ENERGY: f32 = 1e-10;

/// A learned noise waveform template with usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoisePattern {
    template: Vec<f32>,
    norm_factor: f32,
    observation_count: u32,
    last_seen: u64,
    confidence: f32,
}

impl NoisePattern {
    /// Zero-mean, unit-norm template waveform.
    pub fn template(&self) -> &[f32] {
        &self.template
    }

    /// Amplitude normalization factor (L2 norm of the originating segment).
    pub fn norm_factor(&self) -> f32 {
        self.norm_factor
    }

    /// How many times this pattern has been observed.
    pub fn observation_count(&self) -> u32 {
        self.observation_count
    }

    /// Stream sample clock at the last reinforcement.
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Current confidence score in [0, 1].
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// Outcome of submitting a segment to [`NoisePatternLibrary::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Segment matched an existing pattern, which was reinforced.
    Reinforced(u64),
    /// Segment became a new candidate pattern.
    Inserted(u64),
    /// Library full and no eviction candidate qualified; segment dropped.
    Dropped,
    /// Segment carried no usable content (near-zero energy or wrong length).
    Skipped,
}

/// A pattern match found by [`NoisePatternLibrary::best_match`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Library key of the matched pattern.
    pub id: u64,
    /// Normalized cross-correlation with the query segment.
    pub similarity: f32,
}

/// Read-only view of one pattern, for GUI inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSnapshot {
    /// Library key.
    pub id: u64,
    /// Template waveform (zero-mean, unit-norm).
    pub template: Vec<f32>,
    /// Amplitude normalization factor.
    pub norm_factor: f32,
    /// Observation count.
    pub observation_count: u32,
    /// Confidence score.
    pub confidence: f32,
}

/// Capacity-bounded store of learned noise patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoisePatternLibrary {
    patterns: BTreeMap<u64, NoisePattern>,
    next_id: u64,
    template_len: usize,
    capacity: usize,
    similarity_threshold: f32,
    learning_rate: f32,
    min_observations: u32,
    confidence_floor: f32,
    confidence_gain: f32,
    initial_confidence: f32,
    decay_rate_per_s: f32,
    dropped_inserts: u64,
}

impl NoisePatternLibrary {
    /// Create an empty library from canceller configuration.
    pub fn new(config: &AdaptiveConfig) -> Self {
        Self {
            patterns: BTreeMap::new(),
            next_id: 0,
            template_len: config.template_len,
            capacity: config.library_capacity,
            similarity_threshold: config.similarity_threshold,
            learning_rate: config.learning_rate,
            min_observations: config.min_observations,
            confidence_floor: config.confidence_floor,
            confidence_gain: config.confidence_gain,
            initial_confidence: config.initial_confidence,
            decay_rate_per_s: config.decay_rate_per_s,
            dropped_inserts: 0,
        }
    }

    /// Number of patterns currently held.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the library holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Template length in samples.
    pub fn template_len(&self) -> usize {
        self.template_len
    }

    /// Insertions dropped because the library was full and every resident
    /// pattern outranked a fresh candidate. Diagnostic, never an error.
    pub fn dropped_inserts(&self) -> u64 {
        self.dropped_inserts
    }

    /// Look up a pattern by id.
    pub fn pattern(&self, id: u64) -> Option<&NoisePattern> {
        self.patterns.get(&id)
    }

    /// Submit a segment believed to contain no signal event. Reinforces the
    /// best matching pattern above the similarity threshold, otherwise
    /// inserts a new candidate (evicting the weakest resident only if it
    /// ranks below a fresh candidate's initial confidence).
    pub fn observe(&mut self, segment: &[f32], now: u64) -> Observation {
        if segment.len() != self.template_len {
            return Observation::Skipped;
        }
        let (centered, norm) = center(segment);
        if norm * norm < MIN_SEGMENT_ENERGY {
            return Observation::Skipped;
        }
        let unit: Vec<f32> = centered.iter().map(|c| c / norm).collect();

        if let Some((id, similarity)) = self.closest(&unit, 0) {
            if similarity >= self.similarity_threshold {
                let lr = self.learning_rate;
                let gain = self.confidence_gain;
                if let Some(pattern) = self.patterns.get_mut(&id) {
                    for (t, u) in pattern.template.iter_mut().zip(&unit) {
                        *t = (1.0 - lr) * *t + lr * u;
                    }
                    renormalize(&mut pattern.template);
                    pattern.norm_factor = (1.0 - lr) * pattern.norm_factor + lr * norm;
                    pattern.observation_count += 1;
                    pattern.confidence = (pattern.confidence + gain).min(1.0);
                    pattern.last_seen = now;
                }
                return Observation::Reinforced(id);
            }
        }

        if self.patterns.len() >= self.capacity && !self.evict_for_insert() {
            self.dropped_inserts += 1;
            warn!(
                capacity = self.capacity,
                dropped = self.dropped_inserts,
                "pattern library full, candidate dropped"
            );
            return Observation::Dropped;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.patterns.insert(
            id,
            NoisePattern {
                template: unit,
                norm_factor: norm,
                observation_count: 1,
                last_seen: now,
                confidence: self.initial_confidence,
            },
        );
        Observation::Inserted(id)
    }

    /// Decay every pattern's confidence by `elapsed_s` seconds and evict
    /// those below the floor. Returns the eviction count.
    pub fn decay(&mut self, elapsed_s: f32) -> usize {
        if elapsed_s <= 0.0 {
            return 0;
        }
        let factor = (-self.decay_rate_per_s * elapsed_s).exp();
        for pattern in self.patterns.values_mut() {
            pattern.confidence *= factor;
        }
        let floor = self.confidence_floor;
        let before = self.patterns.len();
        self.patterns.retain(|_, p| p.confidence >= floor);
        let evicted = before - self.patterns.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.patterns.len(), "decayed patterns evicted");
        }
        evicted
    }

    /// Highest-similarity established pattern above the threshold, or None.
    /// Ties in similarity prefer the higher observation count.
    pub fn best_match(&self, segment: &[f32]) -> Option<Match> {
        if segment.len() != self.template_len {
            return None;
        }
        let (centered, norm) = center(segment);
        if norm * norm < MIN_SEGMENT_ENERGY {
            return None;
        }
        let unit: Vec<f32> = centered.iter().map(|c| c / norm).collect();
        self.closest(&unit, self.min_observations)
            .filter(|(_, similarity)| *similarity >= self.similarity_threshold)
            .map(|(id, similarity)| Match { id, similarity })
    }

    /// Read-only snapshot of the current patterns, in insertion order.
    pub fn snapshot(&self) -> Vec<PatternSnapshot> {
        self.patterns
            .iter()
            .map(|(&id, p)| PatternSnapshot {
                id,
                template: p.template.clone(),
                norm_factor: p.norm_factor,
                observation_count: p.observation_count,
                confidence: p.confidence,
            })
            .collect()
    }

    /// Persist the library as JSON for reuse across sessions.
    pub fn save_to(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a previously persisted library.
    pub fn load_from(path: impl AsRef<Path>) -> CoreResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Best correlation among patterns with at least `min_count`
    /// observations. The query must already be zero-mean unit-norm.
    fn closest(&self, unit: &[f32], min_count: u32) -> Option<(u64, f32)> {
        let mut best: Option<(u64, f32, u32)> = None;
        for (&id, pattern) in &self.patterns {
            if pattern.observation_count < min_count {
                continue;
            }
            let similarity: f32 = unit
                .iter()
                .zip(&pattern.template)
                .map(|(a, b)| a * b)
                .sum();
            let better = match best {
                None => true,
                Some((_, best_sim, best_count)) => {
                    similarity > best_sim + f32::EPSILON
                        || ((similarity - best_sim).abs() <= f32::EPSILON
                            && pattern.observation_count > best_count)
                }
            };
            if better {
                best = Some((id, similarity, pattern.observation_count));
            }
        }
        best.map(|(id, sim, _)| (id, sim))
    }

    /// Evict the lowest-confidence resident if it ranks below a fresh
    /// candidate. Keeps the retained set the highest-confidence subset.
    fn evict_for_insert(&mut self) -> bool {
        let weakest = self
            .patterns
            .iter()
            .min_by(|a, b| {
                a.1.confidence
                    .partial_cmp(&b.1.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(&id, p)| (id, p.confidence));
        match weakest {
            Some((id, confidence)) if confidence < self.initial_confidence => {
                debug!(id, confidence, "evicting weakest pattern for new candidate");
                self.patterns.remove(&id);
                true
            }
            _ => false,
        }
    }
}

fn center(segment: &[f32]) -> (Vec<f32>, f32) {
    let mean = segment.iter().sum::<f32>() / segment.len() as f32;
    let centered: Vec<f32> = segment.iter().map(|s| s - mean).collect();
    let norm = centered.iter().map(|c| c * c).sum::<f32>().sqrt();
    (centered, norm)
}

fn renormalize(template: &mut [f32]) {
    let norm = template.iter().map(|t| t * t).sum::<f32>().sqrt();
    if norm > 0.0 {
        for t in template.iter_mut() {
            *t /= norm;
        }
    }
}
