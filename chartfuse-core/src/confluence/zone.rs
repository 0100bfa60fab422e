//! Session matches and confluence zones

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::constants::confluence::HIGH_STRENGTH_THRESHOLD;
use crate::detection::FusedPattern;
use crate::geometry::{BoundingBox, Point};
use crate::pattern::PatternClass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable pattern recorded during a session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibratedMatch {
    /// Session-unique id
    pub id: u64,
    /// Pattern class
    pub class: PatternClass,
    /// Calibrated, stabilized confidence
    pub confidence: f32,
    /// Location in image pixels
    pub bbox: BoundingBox,
    /// Time of the last frame it was seen in, in milliseconds
    pub timestamp_ms: u64,
}

impl CalibratedMatch {
    /// Match from a stable pipeline output
    pub fn from_pattern(id: u64, timestamp_ms: u64, pattern: &FusedPattern) -> Self {
        Self {
            id,
            class: pattern.class.clone(),
            confidence: pattern.confidence,
            bbox: pattern.bbox,
            timestamp_ms,
        }
    }

    /// Center of the box
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Region where several patterns coincide
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfluenceZone {
    /// Member matches
    pub matches: Vec<CalibratedMatch>,
    /// Mean of member centers
    pub centroid: Point,
    /// Strength in `[1.0, 3.0]`
    pub strength: f32,
}

impl ConfluenceZone {
    /// Number of member matches
    pub fn pattern_count(&self) -> usize {
        self.matches.len()
    }

    /// Number of distinct classes among the members
    pub fn distinct_classes(&self) -> usize {
        self.matches.iter().map(|m| &m.class).collect::<BTreeSet<_>>().len()
    }

    /// Mean member confidence, 0 for an empty zone
    pub fn average_confidence(&self) -> f32 {
        average_confidence(&self.matches)
    }

    /// Strength of at least 1.8 with two or more members
    pub fn is_high_strength(&self) -> bool {
        self.strength >= HIGH_STRENGTH_THRESHOLD && self.pattern_count() >= 2
    }

    /// Short label for display
    pub fn description(&self) -> String {
        let count = self.pattern_count();
        match (count, self.distinct_classes()) {
            (0, _) => String::from("No confluence"),
            (1, _) => String::from("Single pattern"),
            (_, 1) => format!("{}× Same Pattern", count),
            _ => format!("{}× Multi-Pattern Confluence", count),
        }
    }
}

pub(crate) fn average_confidence(matches: &[CalibratedMatch]) -> f32 {
    if matches.is_empty() {
        return 0.0;
    }
    let sum: f64 = matches.iter().map(|m| m.confidence as f64).sum();
    (sum / matches.len() as f64) as f32
}
