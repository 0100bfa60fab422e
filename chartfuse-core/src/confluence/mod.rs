//! Confluence Zones
//!
//! ## Overview
//!
//! Traders give more weight to a price region where several patterns
//! point the same way. Over a session the pipeline accumulates stable
//! matches; this module clusters them spatially and scores each cluster.
//!
//! ## Strength
//!
//! ```text
//! base       = 1.0 (1 member) | 1.5 (2 members) | 2.0 (3+ members)
//! diversity  = 0.2 if more than one class, else 0
//! confidence = max(0, avg_confidence − 0.7) × 0.5
//!
//! strength   = clamp(base + diversity + confidence, 1.0, 3.0)
//! ```
//!
//! A zone is high-strength at 1.8 or above with at least two members.
//! Zones are derived data, recomputed from scratch on every query.
//!
//! ## Example
//!
//! ```rust
//! use chartfuse_core::confluence::{CalibratedMatch, ConfluenceEngine};
//! use chartfuse_core::{BoundingBox, PatternClass};
//!
//! let matches = [
//!     CalibratedMatch {
//!         id: 1,
//!         class: PatternClass::DoubleBottom,
//!         confidence: 0.9,
//!         bbox: BoundingBox::new(90, 90, 110, 110),
//!         timestamp_ms: 0,
//!     },
//!     CalibratedMatch {
//!         id: 2,
//!         class: PatternClass::Triangle,
//!         confidence: 0.8,
//!         bbox: BoundingBox::new(95, 92, 115, 112),
//!         timestamp_ms: 0,
//!     },
//! ];
//!
//! let zones = ConfluenceEngine::default().find_confluence_zones(&matches);
//! assert_eq!(zones.len(), 1);
//! assert_eq!(zones[0].description(), "2× Multi-Pattern Confluence");
//! ```

pub mod binner;
pub mod zone;

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::constants::confluence::{
    BASE_STRENGTH_MANY, BASE_STRENGTH_PAIR, BASE_STRENGTH_SINGLE, CONFIDENCE_BONUS_PIVOT,
    CONFIDENCE_BONUS_WEIGHT, CONFLUENCE_GRID_SIZE_PX, DEFAULT_NEARBY_RADIUS_PX, DIVERSITY_BONUS,
    MAX_ZONE_STRENGTH, MIN_ZONE_PATTERNS, MIN_ZONE_STRENGTH,
};
use crate::errors::{check_range, ConfigError, ConfigResult};

pub use binner::{GridCell, SpatialBinner};
pub use zone::{CalibratedMatch, ConfluenceZone};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clustering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConfluenceConfig {
    /// Grid size in pixels
    pub grid_size: u32,
    /// Minimum members per zone (at least 2)
    pub min_patterns: usize,
    /// Radius for nearby-match searches
    pub nearby_radius: f32,
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            grid_size: CONFLUENCE_GRID_SIZE_PX,
            min_patterns: MIN_ZONE_PATTERNS,
            nearby_radius: DEFAULT_NEARBY_RADIUS_PX,
        }
    }
}

impl ConfluenceConfig {
    /// Check ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "confluence.grid_size",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f32,
            });
        }
        if self.min_patterns < MIN_ZONE_PATTERNS {
            return Err(ConfigError::Inconsistent {
                reason: "confluence.min_patterns below 2 would report singletons",
            });
        }
        check_range("confluence.nearby_radius", self.nearby_radius, 0.0, f32::MAX)
    }
}

/// Strength score of a cluster
pub fn calculate_strength(matches: &[CalibratedMatch]) -> f32 {
    let base = match matches.len() {
        0 | 1 => BASE_STRENGTH_SINGLE,
        2 => BASE_STRENGTH_PAIR,
        _ => BASE_STRENGTH_MANY,
    };

    let classes = matches.iter().map(|m| &m.class).collect::<BTreeSet<_>>().len();
    let diversity = if classes > 1 { DIVERSITY_BONUS } else { 0.0 };

    let average = zone::average_confidence(matches);
    let confidence = (average - CONFIDENCE_BONUS_PIVOT).max(0.0) * CONFIDENCE_BONUS_WEIGHT;

    (base + diversity + confidence).clamp(MIN_ZONE_STRENGTH, MAX_ZONE_STRENGTH)
}

/// Cluster matches into zones, strongest first
pub fn find_confluence_zones(
    matches: &[CalibratedMatch],
    grid_size: u32,
    min_patterns: usize,
) -> Vec<ConfluenceZone> {
    let min_patterns = min_patterns.max(MIN_ZONE_PATTERNS);
    if matches.len() < min_patterns {
        return Vec::new();
    }

    let mut zones: Vec<ConfluenceZone> = SpatialBinner::new(grid_size)
        .cluster(matches)
        .into_iter()
        .filter(|cluster| cluster.len() >= min_patterns)
        .filter_map(|cluster| {
            let centroid = SpatialBinner::centroid(&cluster)?;
            let strength = calculate_strength(&cluster);
            Some(ConfluenceZone {
                matches: cluster,
                centroid,
                strength,
            })
        })
        .collect();

    zones.sort_by(|a, b| b.strength.total_cmp(&a.strength));

    log_debug!("found {} confluence zones in {} matches", zones.len(), matches.len());
    zones
}

/// Stateless zone finder bound to a config
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfluenceEngine {
    config: ConfluenceConfig,
}

impl ConfluenceEngine {
    /// Create an engine
    pub fn new(config: ConfluenceConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }

    /// Zones among `matches`, strongest first
    pub fn find_confluence_zones(&self, matches: &[CalibratedMatch]) -> Vec<ConfluenceZone> {
        find_confluence_zones(matches, self.config.grid_size, self.config.min_patterns)
    }

    /// Matches near `target` within the configured radius
    pub fn find_nearby<'a>(
        &self,
        target: &CalibratedMatch,
        all: &'a [CalibratedMatch],
    ) -> Vec<&'a CalibratedMatch> {
        SpatialBinner::find_nearby(target, all, self.config.nearby_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::pattern::PatternClass;
    use alloc::vec;

    fn at(id: u64, class: PatternClass, confidence: f32, x: i32, y: i32) -> CalibratedMatch {
        CalibratedMatch {
            id,
            class,
            confidence,
            bbox: BoundingBox::new(x - 10, y - 10, x + 10, y + 10),
            timestamp_ms: id * 100,
        }
    }

    #[test]
    fn strength_formula() {
        let pair = [
            at(1, PatternClass::Flag, 0.9, 100, 100),
            at(2, PatternClass::Flag, 0.9, 105, 100),
        ];
        // 1.5 + 0 + 0.2 × 0.5
        assert!((calculate_strength(&pair) - 1.6).abs() < 1e-5);

        let mixed = [
            at(1, PatternClass::Flag, 0.6, 100, 100),
            at(2, PatternClass::Wedge, 0.6, 105, 100),
            at(3, PatternClass::Channel, 0.6, 100, 105),
        ];
        assert!((calculate_strength(&mixed) - 2.2).abs() < 1e-5);

        assert_eq!(calculate_strength(&[]), 1.0);
    }

    #[test]
    fn strength_is_clamped() {
        let strong: Vec<_> = (0..10)
            .map(|i| at(i, PatternClass::KNOWN[i as usize].clone(), 1.0, 100, 100))
            .collect();
        let s = calculate_strength(&strong);
        assert!(s <= 3.0 && s >= 1.0);
    }

    #[test]
    fn zones_sorted_by_strength() {
        let matches = [
            at(1, PatternClass::Flag, 0.5, 100, 100),
            at(2, PatternClass::Flag, 0.5, 102, 101),
            at(3, PatternClass::Flag, 0.9, 400, 400),
            at(4, PatternClass::Wedge, 0.9, 401, 399),
            at(5, PatternClass::Channel, 0.9, 399, 401),
            at(6, PatternClass::Triangle, 0.9, 800, 100),
        ];

        let zones = ConfluenceEngine::default().find_confluence_zones(&matches);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].pattern_count(), 3);
        assert!(zones[0].is_high_strength());
        assert!(!zones[1].is_high_strength());
        assert_eq!(zones[1].description(), "2× Same Pattern");
        assert!(zones.iter().all(|z| z.pattern_count() >= 2));
    }

    #[test]
    fn too_few_matches_give_no_zones() {
        let one = [at(1, PatternClass::Flag, 0.9, 100, 100)];
        assert!(find_confluence_zones(&one, 50, 2).is_empty());
        assert!(find_confluence_zones(&[], 50, 2).is_empty());
    }

    #[test]
    fn min_patterns_filters_clusters() {
        let matches = [
            at(1, PatternClass::Flag, 0.9, 100, 100),
            at(2, PatternClass::Flag, 0.9, 101, 100),
        ];
        assert_eq!(find_confluence_zones(&matches, 50, 2).len(), 1);
        assert!(find_confluence_zones(&matches, 50, 3).is_empty());
    }

    #[test]
    fn zone_descriptions() {
        let zone = |matches: Vec<CalibratedMatch>| ConfluenceZone {
            centroid: SpatialBinner::centroid(&matches).unwrap_or_default(),
            strength: calculate_strength(&matches),
            matches,
        };

        assert_eq!(zone(Vec::new()).description(), "No confluence");
        assert_eq!(zone(vec![at(1, PatternClass::Flag, 0.9, 0, 0)]).description(), "Single pattern");
        assert_eq!(
            zone(vec![
                at(1, PatternClass::Flag, 0.9, 0, 0),
                at(2, PatternClass::Wedge, 0.9, 0, 0),
                at(3, PatternClass::Wedge, 0.9, 0, 0),
            ])
            .description(),
            "3× Multi-Pattern Confluence"
        );
    }

    #[test]
    fn validation() {
        assert!(ConfluenceConfig::default().validate().is_ok());
        assert!(ConfluenceConfig { min_patterns: 1, ..ConfluenceConfig::default() }
            .validate()
            .is_err());
        assert!(ConfluenceConfig { grid_size: 0, ..ConfluenceConfig::default() }
            .validate()
            .is_err());
    }
}
