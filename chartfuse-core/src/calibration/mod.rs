//! Confidence Calibration
//!
//! ## Overview
//!
//! Raw detector scores are not probabilities: a template matcher reporting
//! 0.8 and an ML head reporting 0.8 mean different things, and the same
//! detector is over-confident on some classes and timid on others. The
//! calibrator maps every raw score onto a per-class logistic curve, then
//! corrects it using what it has seen of that class so far.
//!
//! ## Pipeline
//!
//! ```text
//! raw ──→ σ(A·x + B) ──→ FP suppression ──→ min_confidence ──→ consensus boost
//!              │                                 │
//!              └──→ class history                └──→ 0.0 (hard reject)
//! ```
//!
//! 1. **Curve**: `σ(A·x + B)` with the class's slope and intercept,
//!    evaluated with the deterministic [`series::logistic`].
//! 2. **Suppression**: the class history estimates how often this class
//!    scores low. Above a 15% empirical rate the score shrinks by
//!    `1 − 0.5·fp`.
//! 3. **Floor**: anything below the class's `min_confidence` becomes
//!    exactly 0.0 and is dropped by the pipeline.
//! 4. **Boost**: independent agreement multiplies by `1 + 0.2·strength`,
//!    capped at 1.0.
//!
//! ## Example
//!
//! ```rust
//! use chartfuse_core::calibration::Calibrator;
//! use chartfuse_core::PatternClass;
//!
//! let mut calibrator = Calibrator::default();
//!
//! let strong = calibrator.calibrate(&PatternClass::DoubleTop, 0.9, 0.0);
//! assert!(strong > 0.9);
//!
//! // Below the default floor: hard reject
//! let weak = calibrator.calibrate(&PatternClass::DoubleTop, 0.2, 0.0);
//! assert_eq!(weak, 0.0);
//! ```

pub mod history;
pub mod series;

use alloc::collections::BTreeMap;

use crate::constants::calibration::{
    CONSENSUS_BOOST_FACTOR, DEFAULT_CURVE_INTERCEPT, DEFAULT_CURVE_SLOPE,
    DEFAULT_FALSE_POSITIVE_RATE, DEFAULT_MIN_CONFIDENCE, FP_MAX_SHRINK, FP_SUPPRESSION_THRESHOLD,
};
use crate::detection::{clamp_unit, Detection};
use crate::errors::{check_range, ConfigResult};
use crate::pattern::{ClassTable, PatternClass};

pub use history::ClassHistory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest accepted curve slope or intercept magnitude
const MAX_CURVE_PARAMETER: f32 = 100.0;

/// Per-class calibration parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibrationCurve {
    /// Logistic slope `A`
    pub slope: f32,
    /// Logistic intercept `B`
    pub intercept: f32,
    /// Static false-positive rate, prior of the empirical estimate
    pub false_positive_rate: f32,
    /// Scores below this are rejected
    pub min_confidence: f32,
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        Self {
            slope: DEFAULT_CURVE_SLOPE,
            intercept: DEFAULT_CURVE_INTERCEPT,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl CalibrationCurve {
    /// Logistic value for a raw score, before suppression
    pub fn evaluate(&self, raw: f32) -> f32 {
        let z = self.slope as f64 * clamp_unit(raw) as f64 + self.intercept as f64;
        series::logistic(z) as f32
    }

    /// Check parameter ranges
    pub fn validate(&self) -> ConfigResult<()> {
        check_range("calibration.slope", self.slope, f32::MIN_POSITIVE, MAX_CURVE_PARAMETER)?;
        check_range(
            "calibration.intercept",
            self.intercept,
            -MAX_CURVE_PARAMETER,
            MAX_CURVE_PARAMETER,
        )?;
        check_range("calibration.false_positive_rate", self.false_positive_rate, 0.0, 1.0)?;
        check_range("calibration.min_confidence", self.min_confidence, 0.0, 1.0)
    }
}

/// Calibration parameters for all classes
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibrationConfig {
    /// Curves per class; unknown classes use the default curve
    pub curves: ClassTable<CalibrationCurve>,
}

impl CalibrationConfig {
    /// Validate every curve
    pub fn validate(&self) -> ConfigResult<()> {
        self.curves.values().try_for_each(CalibrationCurve::validate)
    }
}

/// Stateful calibrator with per-class false-positive learning
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    config: CalibrationConfig,
    history: BTreeMap<PatternClass, ClassHistory>,
}

impl Calibrator {
    /// Create a calibrator with empty history
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            history: BTreeMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Replace the curves, keeping learned history
    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.config = config;
    }

    /// Curve used for `class`
    pub fn curve(&self, class: &PatternClass) -> &CalibrationCurve {
        self.config.curves.get(class)
    }

    /// Calibrate a raw score
    ///
    /// `raw` and `consensus_strength` are clamped into `[0, 1]`. The result
    /// is in `[0, 1]` and is exactly 0.0 for a hard reject. Every call adds
    /// the logistic score to the class history.
    pub fn calibrate(&mut self, class: &PatternClass, raw: f32, consensus_strength: f32) -> f32 {
        let curve = *self.config.curves.get(class);
        let consensus = clamp_unit(consensus_strength);

        let calibrated = curve.evaluate(raw);
        let fp_rate = self.empirical_fp_rate(class);

        let mut score = calibrated;
        if fp_rate > FP_SUPPRESSION_THRESHOLD {
            score *= 1.0 - FP_MAX_SHRINK * fp_rate;
        }

        self.history.entry(class.clone()).or_default().record(calibrated);

        if score < curve.min_confidence {
            log_trace!(
                "rejecting {} at {:.3} (floor {:.2}, fp rate {:.3})",
                class,
                score,
                curve.min_confidence,
                fp_rate
            );
            return 0.0;
        }

        if consensus > 0.0 {
            score = (score * (1.0 + CONSENSUS_BOOST_FACTOR * consensus)).min(1.0);
        }

        clamp_unit(score)
    }

    /// Calibrate a detection, returning `None` for a hard reject
    pub fn calibrate_detection(
        &mut self,
        detection: &Detection,
        consensus_strength: f32,
    ) -> Option<Detection> {
        let score = self.calibrate(&detection.class, detection.confidence, consensus_strength);
        if score > 0.0 {
            Some(detection.with_confidence(score))
        } else {
            None
        }
    }

    /// Current smoothed false-positive estimate for `class`
    pub fn empirical_fp_rate(&self, class: &PatternClass) -> f32 {
        let static_rate = self.config.curves.get(class).false_positive_rate;
        match self.history.get(class) {
            Some(history) => history.false_positive_rate(static_rate),
            None => static_rate,
        }
    }

    /// Snapshot of the history for `class`
    pub fn history(&self, class: &PatternClass) -> Option<ClassHistory> {
        self.history.get(class).copied()
    }

    /// Forget all learned history
    pub fn reset_history(&mut self) {
        log_debug!("clearing calibration history for {} classes", self.history.len());
        self.history.clear();
    }
}
