//! Bayesian Two-Source Fusion
//!
//! ## Overview
//!
//! The ML detector generalises well but hallucinates; the template matcher
//! is precise but brittle. Where both agree on the same region the evidence
//! compounds. Where only one fires, its score is discounted.
//!
//! ## Algorithm
//!
//! For each ML detection, template detections overlapping it at
//! IoU > 0.5 confirm it:
//!
//! ```text
//!                p_ml · p_t · prior
//! P = ──────────────────────────────────────
//!       p_ml · p_t · prior + (1 − prior)
//! ```
//!
//! with `p_t` the best overlapping template score and `prior` the class
//! prior. The posterior never drops below the ML-only score `0.7 · p_ml`,
//! so gaining a confirming template can only help.
//!
//! | Case | Confidence | Sources |
//! |------|------------|---------|
//! | ML + template (IoU > 0.5) | `max(P, 0.7·p_ml)` | ML, Template |
//! | ML alone | `0.7 · p_ml` | ML |
//! | Template alone, `p_t > 0.85`, no ML box at IoU > 0.3 | `0.8 · p_t` | Template |
//! | Any other template | dropped | |
//!
//! Results are sorted by descending confidence. The sort is stable, so
//! ties keep the order confirmed, ML-only, template-only.
//!
//! ## Example
//!
//! ```rust
//! use chartfuse_core::fusion::FusionEngine;
//! use chartfuse_core::{BoundingBox, Detection};
//!
//! let engine = FusionEngine::default();
//! let bbox = BoundingBox::new(10, 10, 50, 50);
//!
//! let fused = engine.fuse(
//!     &[Detection::new("Double Top", 0.9, bbox)],
//!     &[Detection::new("Double Top", 0.8, bbox)],
//! );
//!
//! assert_eq!(fused.len(), 1);
//! assert!(fused[0].is_confirmed());
//! ```

pub mod priors;

use alloc::format;
use alloc::vec::Vec;

use crate::constants::fusion::{
    CONFIRMATION_IOU_THRESHOLD, ML_ONLY_PENALTY, PRIOR_EPSILON, TEMPLATE_ONLY_IOU_THRESHOLD,
    TEMPLATE_ONLY_MIN_CONFIDENCE, TEMPLATE_ONLY_PENALTY,
};
use crate::detection::{clamp_unit, Detection, FusedPattern, SourceSet};
use crate::errors::{check_range, ConfigError, ConfigResult};
use crate::geometry::iou;
use crate::pattern::{ClassTable, PatternClass};

pub use priors::default_priors;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fusion thresholds, penalties and class priors
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FusionConfig {
    /// Prior probability per class
    pub priors: ClassTable<f32>,
    /// IoU above which a template confirms an ML detection
    pub confirmation_iou: f32,
    /// IoU above which a template counts as near an ML detection
    pub template_only_iou: f32,
    /// Multiplier for unconfirmed ML detections
    pub ml_only_penalty: f32,
    /// Multiplier for template-only detections
    pub template_only_penalty: f32,
    /// Minimum confidence for a template detection to stand alone
    pub template_only_min_confidence: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            priors: default_priors(),
            confirmation_iou: CONFIRMATION_IOU_THRESHOLD,
            template_only_iou: TEMPLATE_ONLY_IOU_THRESHOLD,
            ml_only_penalty: ML_ONLY_PENALTY,
            template_only_penalty: TEMPLATE_ONLY_PENALTY,
            template_only_min_confidence: TEMPLATE_ONLY_MIN_CONFIDENCE,
        }
    }
}

impl FusionConfig {
    /// Check ranges and threshold ordering
    pub fn validate(&self) -> ConfigResult<()> {
        for prior in self.priors.values() {
            check_range("fusion.priors", *prior, 0.0, 1.0)?;
        }
        check_range("fusion.confirmation_iou", self.confirmation_iou, 0.0, 1.0)?;
        check_range("fusion.template_only_iou", self.template_only_iou, 0.0, 1.0)?;
        check_range("fusion.ml_only_penalty", self.ml_only_penalty, 0.0, 1.0)?;
        check_range("fusion.template_only_penalty", self.template_only_penalty, 0.0, 1.0)?;
        check_range(
            "fusion.template_only_min_confidence",
            self.template_only_min_confidence,
            0.0,
            1.0,
        )?;

        if self.template_only_iou > self.confirmation_iou {
            return Err(ConfigError::Inconsistent {
                reason: "fusion.template_only_iou exceeds fusion.confirmation_iou",
            });
        }

        Ok(())
    }
}

/// Bayesian posterior of two agreeing detections
///
/// The prior is clamped into `[1e-4, 1 − 1e-4]` so the result is always
/// defined.
pub fn posterior(p_ml: f32, p_template: f32, prior: f32) -> f32 {
    let prior = if prior.is_nan() {
        0.5
    } else {
        prior.clamp(PRIOR_EPSILON, 1.0 - PRIOR_EPSILON)
    };

    let evidence = clamp_unit(p_ml) * clamp_unit(p_template) * prior;
    clamp_unit(evidence / (evidence + (1.0 - prior)))
}

fn clamped(detection: &Detection) -> Detection {
    detection.with_confidence(detection.confidence)
}

/// Stateless fusion of ML and template detections
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Prior of `class`
    pub fn prior(&self, class: &PatternClass) -> f32 {
        *self.config.priors.get(class)
    }

    /// Fuse one frame's detections
    ///
    /// Input confidences are clamped into `[0, 1]` (NaN as 0) before use,
    /// so every emitted confidence is in `[0, 1]`.
    pub fn fuse(&self, ml: &[Detection], template: &[Detection]) -> Vec<FusedPattern> {
        let ml: Vec<Detection> = ml.iter().map(clamped).collect();
        let template: Vec<Detection> = template.iter().map(clamped).collect();

        let mut confirmed = Vec::new();
        let mut ml_only = Vec::new();

        for detection in &ml {
            let mut best: Option<&Detection> = None;
            let mut overlaps = 0;

            for candidate in &template {
                if iou(&detection.bbox, &candidate.bbox) > self.config.confirmation_iou {
                    overlaps += 1;
                    if best.map_or(true, |b| candidate.confidence > b.confidence) {
                        best = Some(candidate);
                    }
                }
            }

            match best {
                Some(support) => confirmed.push(self.confirm(detection, support, overlaps)),
                None => ml_only.push(self.ml_only(detection)),
            }
        }

        let template_only = template
            .iter()
            .filter(|t| t.confidence > self.config.template_only_min_confidence)
            .filter(|t| {
                ml.iter()
                    .all(|m| iou(&m.bbox, &t.bbox) <= self.config.template_only_iou)
            })
            .map(|t| self.template_only(t));

        let mut fused = confirmed;
        fused.append(&mut ml_only);
        fused.extend(template_only);
        fused.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        log_debug!(
            "fused {} ML + {} template detections into {} patterns",
            ml.len(),
            template.len(),
            fused.len()
        );

        fused
    }

    fn confirm(&self, detection: &Detection, support: &Detection, overlaps: usize) -> FusedPattern {
        let prior = self.prior(&detection.class);
        let p_ml = detection.confidence;
        let p_t = support.confidence;

        let bayes = posterior(p_ml, p_t, prior);
        let floor = p_ml * self.config.ml_only_penalty;
        let confidence = clamp_unit(bayes.max(floor));

        let bbox = if p_t > p_ml { support.bbox } else { detection.bbox };

        let mut reasoning = format!(
            "ML {:.2} confirmed by {} template(s), best {:.2}; prior {:.2}; posterior {:.2}",
            p_ml, overlaps, p_t, prior, bayes
        );
        if floor > bayes {
            reasoning.push_str(&format!("; raised to ML-only floor {:.2}", floor));
        }

        FusedPattern {
            class: detection.class.clone(),
            confidence,
            bbox,
            sources: SourceSet::BOTH,
            reasoning,
            ml_confidence: Some(p_ml),
            template_confidence: Some(p_t),
            template_match_count: overlaps,
        }
    }

    fn ml_only(&self, detection: &Detection) -> FusedPattern {
        let confidence = clamp_unit(detection.confidence * self.config.ml_only_penalty);

        FusedPattern {
            class: detection.class.clone(),
            confidence,
            bbox: detection.bbox,
            sources: SourceSet::ML,
            reasoning: format!(
                "ML {:.2} without template support, x{:.2}",
                detection.confidence, self.config.ml_only_penalty
            ),
            ml_confidence: Some(detection.confidence),
            template_confidence: None,
            template_match_count: 0,
        }
    }

    fn template_only(&self, detection: &Detection) -> FusedPattern {
        let confidence = clamp_unit(detection.confidence * self.config.template_only_penalty);

        FusedPattern {
            class: detection.class.clone(),
            confidence,
            bbox: detection.bbox,
            sources: SourceSet::TEMPLATE,
            reasoning: format!(
                "template {:.2} without ML support, x{:.2}",
                detection.confidence, self.config.template_only_penalty
            ),
            ml_confidence: None,
            template_confidence: Some(detection.confidence),
            template_match_count: 1,
        }
    }
}
