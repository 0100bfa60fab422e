//! Multi-frame temporal consensus
//!
//! A single frame can hallucinate a pattern; a real pattern on a static or
//! slowly scrolling chart shows up frame after frame in about the same
//! place. The stabilizer keeps the last `window_size` fused frames and only
//! lets through patterns seen in enough of them.
//!
//! ```text
//! required = ceil(window_size × consensus_threshold)      (≥ 1)
//!
//! frames: [f₋₄] [f₋₃] [f₋₂] [f₋₁] [f₀]
//!           │     │     │     │    │
//!           └─────┴─ group by (class, ⌊cx/20⌉, ⌊cy/20⌉) ─→ votes ≥ required ─→ emit
//! ```
//!
//! Until the window holds `required` frames the current frame passes
//! through unchanged, so the first detections are not delayed forever.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::vec::Vec;

use heapless::Deque;

use crate::constants::temporal::{
    DEFAULT_CONSENSUS_THRESHOLD, DEFAULT_WINDOW_SIZE, MAX_TEMPORAL_WINDOW, TEMPORAL_GRID_SIZE_PX,
    VOTE_EPSILON,
};
use crate::detection::FusedPattern;
use crate::errors::{check_range, ConfigError, ConfigResult};
use crate::geometry::SpatialKey;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Voting window parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TemporalConfig {
    /// Number of frames kept (1 ..= 32)
    pub window_size: usize,
    /// Fraction of the window a pattern must appear in
    pub consensus_threshold: f32,
    /// Grid size in pixels for matching patterns across frames
    pub grid_size: u32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            consensus_threshold: DEFAULT_CONSENSUS_THRESHOLD,
            grid_size: TEMPORAL_GRID_SIZE_PX,
        }
    }
}

impl TemporalConfig {
    /// Votes a group needs to be emitted
    pub fn required_votes(&self) -> usize {
        let window = self.effective_window() as f32;
        let votes = libm::ceilf(window * self.consensus_threshold - VOTE_EPSILON);
        if votes.is_nan() || votes < 1.0 {
            1
        } else {
            votes as usize
        }
    }

    /// Window size clamped to the supported range
    pub fn effective_window(&self) -> usize {
        self.window_size.clamp(1, MAX_TEMPORAL_WINDOW)
    }

    /// Check ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window_size == 0 || self.window_size > MAX_TEMPORAL_WINDOW {
            return Err(ConfigError::OutOfRange {
                field: "temporal.window_size",
                value: self.window_size as f32,
                min: 1.0,
                max: MAX_TEMPORAL_WINDOW as f32,
            });
        }
        check_range("temporal.consensus_threshold", self.consensus_threshold, 0.0, 1.0)?;
        if self.consensus_threshold <= 0.0 {
            return Err(ConfigError::Inconsistent {
                reason: "temporal.consensus_threshold must be positive",
            });
        }
        if self.grid_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "temporal.grid_size",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f32,
            });
        }
        Ok(())
    }
}

/// Sliding-window voter over fused frames
#[derive(Debug, Clone, Default)]
pub struct TemporalStabilizer {
    config: TemporalConfig,
    window: Deque<Vec<FusedPattern>, MAX_TEMPORAL_WINDOW>,
}

impl TemporalStabilizer {
    /// Create a stabilizer with an empty window
    pub fn new(config: TemporalConfig) -> Self {
        Self {
            config,
            window: Deque::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    /// Number of frames currently in the window
    pub fn history_len(&self) -> usize {
        self.window.len()
    }

    /// Add a frame and return the stable patterns
    pub fn stabilize(&mut self, current: Vec<FusedPattern>) -> Vec<FusedPattern> {
        let capacity = self.config.effective_window();
        while self.window.len() >= capacity {
            self.window.pop_front();
        }
        if self.window.push_back(current.clone()).is_err() {
            log_warn!("temporal window full, dropping frame");
        }

        let required = self.config.required_votes();
        if self.window.len() < required {
            log_trace!("temporal warm-up: {}/{} frames", self.window.len(), required);
            return current;
        }

        // Oldest first, so the last vote of each group is the most recent
        let mut groups: BTreeMap<SpatialKey, Vec<&FusedPattern>> = BTreeMap::new();
        for frame in self.window.iter() {
            for pattern in frame {
                let key = SpatialKey::of(&pattern.class, &pattern.bbox, self.config.grid_size);
                groups.entry(key).or_default().push(pattern);
            }
        }

        let mut stable: Vec<FusedPattern> = groups
            .values()
            .filter(|votes| votes.len() >= required)
            .filter_map(|votes| self.merge(votes))
            .collect();
        stable.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        log_trace!(
            "temporal consensus: {} groups, {} stable (need {} votes)",
            groups.len(),
            stable.len(),
            required
        );

        stable
    }

    fn merge(&self, votes: &[&FusedPattern]) -> Option<FusedPattern> {
        let latest = *votes.last()?;

        let sum: f64 = votes.iter().map(|p| p.confidence as f64).sum();
        let mean = (sum / votes.len() as f64) as f32;
        let sources = votes.iter().fold(latest.sources, |acc, p| acc.union(p.sources));

        let mut merged = latest.clone();
        merged.confidence = mean;
        merged.sources = sources;
        merged.reasoning = format!(
            "{} | stable in {} of {} frames, mean {:.2}",
            latest.reasoning,
            votes.len(),
            self.window.len(),
            mean
        );

        Some(merged)
    }

    /// Apply a new window size or threshold, dropping the oldest frames
    /// when the window shrinks
    pub fn reconfigure(&mut self, config: TemporalConfig) {
        self.config = config;
        let capacity = config.effective_window();
        while self.window.len() > capacity {
            self.window.pop_front();
        }
        log_debug!(
            "temporal window reconfigured: size {}, {} votes required",
            capacity,
            config.required_votes()
        );
    }

    /// Clear the window
    pub fn reset(&mut self) {
        self.window.clear();
        log_debug!("temporal window cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::SourceSet;
    use crate::geometry::BoundingBox;
    use crate::pattern::PatternClass;
    use alloc::string::ToString;
    use alloc::vec;

    fn pattern(class: PatternClass, confidence: f32, x: i32) -> FusedPattern {
        FusedPattern {
            class,
            confidence,
            bbox: BoundingBox::new(x, 100, x + 40, 140),
            sources: SourceSet::ML,
            reasoning: "test".to_string(),
            ml_confidence: Some(confidence),
            template_confidence: None,
            template_match_count: 0,
        }
    }

    #[test]
    fn required_votes_defaults() {
        assert_eq!(TemporalConfig::default().required_votes(), 3);

        let single = TemporalConfig { window_size: 1, ..TemporalConfig::default() };
        assert_eq!(single.required_votes(), 1);

        let tiny = TemporalConfig { consensus_threshold: 0.01, ..TemporalConfig::default() };
        assert_eq!(tiny.required_votes(), 1);

        let all = TemporalConfig { consensus_threshold: 1.0, ..TemporalConfig::default() };
        assert_eq!(all.required_votes(), 5);
    }

    #[test]
    fn warm_up_passes_frames_through() {
        let mut stabilizer = TemporalStabilizer::default();
        let frame = vec![pattern(PatternClass::Flag, 0.8, 0)];

        assert_eq!(stabilizer.stabilize(frame.clone()), frame);
        assert_eq!(stabilizer.stabilize(frame.clone()), frame);
        assert_eq!(stabilizer.history_len(), 2);
    }

    #[test]
    fn consensus_averages_votes() {
        let mut stabilizer = TemporalStabilizer::default();
        stabilizer.stabilize(vec![pattern(PatternClass::Flag, 0.6, 0)]);
        stabilizer.stabilize(vec![pattern(PatternClass::Flag, 0.7, 3)]);
        let out = stabilizer.stabilize(vec![pattern(PatternClass::Flag, 0.8, 5)]);

        assert_eq!(out.len(), 1);
        assert!((out[0].confidence - 0.7).abs() < 1e-6);
        assert_eq!(out[0].bbox, BoundingBox::new(5, 100, 45, 140));
    }

    #[test]
    fn flicker_is_suppressed() {
        let mut stabilizer = TemporalStabilizer::default();
        stabilizer.stabilize(vec![pattern(PatternClass::Wedge, 0.9, 300)]);
        for _ in 0..4 {
            let out = stabilizer.stabilize(vec![pattern(PatternClass::Flag, 0.8, 0)]);
            assert!(out.iter().all(|p| p.class != PatternClass::Wedge));
        }
    }

    #[test]
    fn sources_are_unioned() {
        let mut stabilizer = TemporalStabilizer::default();
        let mut confirmed = pattern(PatternClass::Triangle, 0.9, 0);
        confirmed.sources = SourceSet::BOTH;

        stabilizer.stabilize(vec![confirmed]);
        stabilizer.stabilize(vec![pattern(PatternClass::Triangle, 0.9, 0)]);
        let out = stabilizer.stabilize(vec![pattern(PatternClass::Triangle, 0.9, 0)]);

        assert_eq!(out[0].sources, SourceSet::BOTH);
    }

    #[test]
    fn window_evicts_oldest() {
        let mut stabilizer = TemporalStabilizer::default();
        for _ in 0..9 {
            stabilizer.stabilize(Vec::new());
        }
        assert_eq!(stabilizer.history_len(), 5);

        stabilizer.reconfigure(TemporalConfig { window_size: 3, ..TemporalConfig::default() });
        assert_eq!(stabilizer.history_len(), 3);

        stabilizer.reset();
        assert_eq!(stabilizer.history_len(), 0);
    }

    #[test]
    fn output_sorted_by_confidence() {
        let mut stabilizer = TemporalStabilizer::default();
        let frame = vec![
            pattern(PatternClass::Flag, 0.5, 0),
            pattern(PatternClass::Wedge, 0.9, 200),
        ];
        for _ in 0..2 {
            stabilizer.stabilize(frame.clone());
        }
        let out = stabilizer.stabilize(frame);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].class, PatternClass::Wedge);
    }

    #[test]
    fn validation() {
        assert!(TemporalConfig::default().validate().is_ok());
        assert!(TemporalConfig { window_size: 0, ..TemporalConfig::default() }.validate().is_err());
        assert!(TemporalConfig { window_size: 33, ..TemporalConfig::default() }.validate().is_err());
        assert!(TemporalConfig { consensus_threshold: 0.0, ..TemporalConfig::default() }
            .validate()
            .is_err());
        assert!(TemporalConfig { grid_size: 0, ..TemporalConfig::default() }.validate().is_err());
    }
}
