//! Detector outputs and fused patterns

use alloc::string::String;
use core::fmt;

use crate::constants::calibration::FULL_CONSENSUS_MATCHES;
use crate::geometry::BoundingBox;
use crate::pattern::PatternClass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clamp a probability into `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Which detector produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DetectorKind {
    /// Learned detector
    Ml,
    /// Template / correlation matcher
    Template,
}

impl DetectorKind {
    const fn bit(self) -> u8 {
        match self {
            DetectorKind::Ml => 0b01,
            DetectorKind::Template => 0b10,
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Ml => f.write_str("ML"),
            DetectorKind::Template => f.write_str("Template"),
        }
    }
}

/// Single detector output for one frame
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Detection {
    /// Reported class
    pub class: PatternClass,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Location in image pixels
    pub bbox: BoundingBox,
    /// Agreement of the detector's internal matches (e.g. across template
    /// scales) in `[0, 1]`; 0 when the detector reports none
    #[cfg_attr(feature = "serde", serde(default))]
    pub consensus: f32,
}

impl Detection {
    /// Create a detection, clamping the confidence into `[0, 1]`
    pub fn new(class: impl Into<PatternClass>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class: class.into(),
            confidence: clamp_unit(confidence),
            bbox,
            consensus: 0.0,
        }
    }

    /// Same detection with a different confidence
    pub fn with_confidence(&self, confidence: f32) -> Self {
        Self {
            class: self.class.clone(),
            confidence: clamp_unit(confidence),
            bbox: self.bbox,
            consensus: self.consensus,
        }
    }

    /// Set the consensus strength, clamped into `[0, 1]`
    #[must_use]
    pub fn with_consensus(mut self, strength: f32) -> Self {
        self.consensus = clamp_unit(strength);
        self
    }

    /// Set the consensus strength from the number of agreeing matches
    ///
    /// One match (or none) gives no consensus.
    #[must_use]
    pub fn with_scale_matches(self, matches: u32) -> Self {
        let strength = if matches > 1 {
            matches as f32 / FULL_CONSENSUS_MATCHES as f32
        } else {
            0.0
        };
        self.with_consensus(strength)
    }
}

/// Non-empty set of contributing detectors
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct SourceSet {
    bits: u8,
}

impl SourceSet {
    /// Only the ML detector
    pub const ML: SourceSet = SourceSet { bits: 0b01 };
    /// Only the template detector
    pub const TEMPLATE: SourceSet = SourceSet { bits: 0b10 };
    /// Both detectors
    pub const BOTH: SourceSet = SourceSet { bits: 0b11 };

    /// Set holding one detector
    pub const fn single(kind: DetectorKind) -> Self {
        Self { bits: kind.bit() }
    }

    /// Union of two sets
    #[must_use]
    pub const fn union(self, other: SourceSet) -> Self {
        Self { bits: self.bits | other.bits }
    }

    /// Whether `kind` contributed
    pub const fn contains(self, kind: DetectorKind) -> bool {
        self.bits & kind.bit() != 0
    }

    /// Number of contributing detectors (1 or 2)
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Always false; kept for API symmetry with `len`
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Whether both detectors contributed
    pub const fn is_confirmed(self) -> bool {
        self.bits == Self::BOTH.bits
    }

    /// Contributing detectors, ML first
    pub fn iter(self) -> impl Iterator<Item = DetectorKind> {
        [DetectorKind::Ml, DetectorKind::Template]
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<DetectorKind> for SourceSet {
    fn from(kind: DetectorKind) -> Self {
        Self::single(kind)
    }
}

impl From<SourceSet> for u8 {
    fn from(set: SourceSet) -> u8 {
        set.bits
    }
}

impl TryFrom<u8> for SourceSet {
    type Error = &'static str;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b01 | 0b10 | 0b11 => Ok(Self { bits }),
            _ => Err("source set must name at least one known detector"),
        }
    }
}

/// Output of fusion and of temporal stabilization
///
/// Equality ignores `reasoning`: the text is diagnostic only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FusedPattern {
    /// Pattern class
    pub class: PatternClass,
    /// Posterior confidence in `[0, 1]`
    pub confidence: f32,
    /// Location in image pixels
    pub bbox: BoundingBox,
    /// Contributing detectors
    pub sources: SourceSet,
    /// Human-readable account of how the confidence was derived
    pub reasoning: String,
    /// Calibrated ML confidence, when ML contributed
    pub ml_confidence: Option<f32>,
    /// Best calibrated template confidence, when templates contributed
    pub template_confidence: Option<f32>,
    /// Number of template detections supporting this pattern
    pub template_match_count: usize,
}

impl FusedPattern {
    /// Whether both detectors agree on this pattern
    pub fn is_confirmed(&self) -> bool {
        self.sources.is_confirmed()
    }
}

impl PartialEq for FusedPattern {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && self.confidence == other.confidence
            && self.bbox == other.bbox
            && self.sources == other.sources
            && self.ml_confidence == other.ml_confidence
            && self.template_confidence == other.template_confidence
            && self.template_match_count == other.template_match_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn confidence_is_clamped() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(Detection::new("Flag", 1.7, bbox).confidence, 1.0);
        assert_eq!(Detection::new("Flag", -0.2, bbox).confidence, 0.0);
        assert_eq!(Detection::new("Flag", f32::NAN, bbox).confidence, 0.0);
    }

    #[test]
    fn consensus_from_scale_matches() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let base = Detection::new("Flag", 0.8, bbox);

        assert_eq!(base.consensus, 0.0);
        assert_eq!(base.clone().with_scale_matches(1).consensus, 0.0);
        assert_eq!(base.clone().with_scale_matches(5).consensus, 0.5);
        assert_eq!(base.clone().with_scale_matches(40).consensus, 1.0);
        assert_eq!(base.clone().with_consensus(f32::NAN).consensus, 0.0);

        let moved = base.with_scale_matches(3).with_confidence(0.6);
        assert!((moved.consensus - 0.3).abs() < 1e-6);
    }

    #[test]
    fn source_set_union() {
        let set = SourceSet::ML.union(SourceSet::TEMPLATE);
        assert_eq!(set, SourceSet::BOTH);
        assert!(set.is_confirmed());
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), [DetectorKind::Ml, DetectorKind::Template]);

        assert!(SourceSet::from(DetectorKind::Template).contains(DetectorKind::Template));
        assert!(!SourceSet::ML.contains(DetectorKind::Template));
    }

    #[test]
    fn source_set_rejects_empty_bits() {
        assert!(SourceSet::try_from(0u8).is_err());
        assert!(SourceSet::try_from(4u8).is_err());
        assert_eq!(SourceSet::try_from(3u8), Ok(SourceSet::BOTH));
    }

    #[test]
    fn equality_ignores_reasoning() {
        let a = FusedPattern {
            class: PatternClass::DoubleTop,
            confidence: 0.8,
            bbox: BoundingBox::new(0, 0, 10, 10),
            sources: SourceSet::ML,
            reasoning: "first".to_string(),
            ml_confidence: Some(0.8),
            template_confidence: None,
            template_match_count: 0,
        };
        let mut b = a.clone();
        b.reasoning = "second".to_string();
        assert_eq!(a, b);

        b.confidence = 0.7;
        assert_ne!(a, b);
    }
}
