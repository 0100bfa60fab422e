//! Session match ledger
//!
//! Stable outputs are recorded as [`CalibratedMatch`]es for confluence
//! queries. A pattern that stays on screen across consecutive frames is one
//! match whose confidence, box and timestamp follow the latest frame; it
//! gets a new id only after it disappears and comes back.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use crate::constants::session::{DEFAULT_LEDGER_CAPACITY, DEFAULT_LOOKBACK_MS};
use crate::confluence::CalibratedMatch;
use crate::constants::temporal::TEMPORAL_GRID_SIZE_PX;
use crate::detection::FusedPattern;
use crate::errors::{ConfigError, ConfigResult};
use crate::geometry::SpatialKey;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ledger sizing and default query window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Matches kept before the oldest are dropped
    pub ledger_capacity: usize,
    /// Default look-back for confluence queries, in milliseconds
    pub lookback_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
            lookback_ms: DEFAULT_LOOKBACK_MS,
        }
    }
}

impl SessionConfig {
    /// Check ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ledger_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "session.ledger_capacity",
                value: 0.0,
                min: 1.0,
                max: usize::MAX as f32,
            });
        }
        Ok(())
    }
}

/// Bounded, deduplicated record of stable matches
#[derive(Debug, Clone)]
pub struct SessionLedger {
    config: SessionConfig,
    grid_size: u32,
    matches: VecDeque<CalibratedMatch>,
    on_screen: BTreeMap<SpatialKey, u64>,
    next_id: u64,
}

impl Default for SessionLedger {
    fn default() -> Self {
        Self::new(SessionConfig::default(), TEMPORAL_GRID_SIZE_PX)
    }
}

impl SessionLedger {
    /// Create an empty ledger; `grid_size` decides when two frames show
    /// the same match
    pub fn new(config: SessionConfig, grid_size: u32) -> Self {
        Self {
            config,
            grid_size,
            matches: VecDeque::new(),
            on_screen: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Record one frame's stable output
    pub fn record(&mut self, timestamp_ms: u64, patterns: &[FusedPattern]) {
        let mut seen = BTreeMap::new();

        for pattern in patterns {
            let key = SpatialKey::of(&pattern.class, &pattern.bbox, self.grid_size);
            if seen.contains_key(&key) {
                continue;
            }

            let existing = self
                .on_screen
                .get(&key)
                .and_then(|id| self.matches.iter_mut().find(|m| m.id == *id));

            let id = match existing {
                Some(m) => {
                    m.confidence = pattern.confidence;
                    m.bbox = pattern.bbox;
                    m.timestamp_ms = timestamp_ms;
                    m.id
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    self.matches.push_back(CalibratedMatch::from_pattern(id, timestamp_ms, pattern));
                    id
                }
            };
            seen.insert(key, id);
        }

        self.on_screen = seen;

        while self.matches.len() > self.config.ledger_capacity {
            self.matches.pop_front();
        }
    }

    /// Matches seen within `lookback_ms` before `now_ms`
    pub fn recent(&self, now_ms: u64, lookback_ms: u64) -> Vec<CalibratedMatch> {
        let cutoff = now_ms.saturating_sub(lookback_ms);
        self.matches
            .iter()
            .filter(|m| m.timestamp_ms >= cutoff && m.timestamp_ms <= now_ms)
            .cloned()
            .collect()
    }

    /// All recorded matches, oldest first
    pub fn matches(&self) -> impl Iterator<Item = &CalibratedMatch> {
        self.matches.iter()
    }

    /// Number of recorded matches
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Forget the session; ids keep increasing
    pub fn clear(&mut self) {
        self.matches.clear();
        self.on_screen.clear();
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
            bbox: BoundingBox::new(x, 0, x + 40, 40),
            sources: SourceSet::BOTH,
            reasoning: "stable".to_string(),
            ml_confidence: Some(confidence),
            template_confidence: Some(confidence),
            template_match_count: 1,
        }
    }

    #[test]
    fn persistent_pattern_is_one_match() {
        let mut ledger = SessionLedger::default();
        ledger.record(100, &[pattern(PatternClass::Flag, 0.7, 0)]);
        ledger.record(200, &[pattern(PatternClass::Flag, 0.8, 2)]);

        assert_eq!(ledger.len(), 1);
        let m = ledger.matches().next().cloned();
        assert_eq!(m.as_ref().map(|m| m.timestamp_ms), Some(200));
        assert_eq!(m.map(|m| m.confidence), Some(0.8));
    }

    #[test]
    fn reappearing_pattern_gets_new_id() {
        let mut ledger = SessionLedger::default();
        ledger.record(100, &[pattern(PatternClass::Flag, 0.7, 0)]);
        ledger.record(200, &[]);
        ledger.record(300, &[pattern(PatternClass::Flag, 0.7, 0)]);

        let ids: Vec<u64> = ledger.matches().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn capacity_drops_oldest() {
        let config = SessionConfig { ledger_capacity: 2, ..SessionConfig::default() };
        let mut ledger = SessionLedger::new(config, 20);
        for i in 0..4 {
            ledger.record(i * 10, &[pattern(PatternClass::Wedge, 0.9, i as i32 * 100)]);
        }

        let ids: Vec<u64> = ledger.matches().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn recent_applies_lookback() {
        let mut ledger = SessionLedger::default();
        ledger.record(1_000, &[pattern(PatternClass::Flag, 0.7, 0)]);
        ledger.record(5_000, &[pattern(PatternClass::Wedge, 0.7, 200)]);

        assert_eq!(ledger.recent(6_000, 2_000).len(), 1);
        assert_eq!(ledger.recent(6_000, 10_000).len(), 2);
        assert_eq!(ledger.recent(500, 10_000).len(), 0);

        ledger.clear();
        assert!(ledger.is_empty());
    }
}
