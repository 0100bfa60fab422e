//! Calibration Constants
//!
//! Parameters for the per-class logistic calibration curve, the rolling
//! false-positive history and the deterministic exponential.

// ===== DEFAULT CURVE =====

/// Slope `A` of the default logistic curve `σ(A·x + B)`.
///
/// Maps raw 0.5 to 0.5, raw 0.9 to ≈0.96 and raw 0.2 to ≈0.08.
///
/// Source: Fitted against template-matcher score distributions
pub const DEFAULT_CURVE_SLOPE: f32 = 8.0;

/// Intercept `B` of the default logistic curve.
///
/// Together with the default slope this centres the curve at raw 0.5.
pub const DEFAULT_CURVE_INTERCEPT: f32 = -4.0;

/// Default minimum calibrated confidence.
///
/// Suppressed scores below this floor are hard-rejected to exactly 0.0.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;

/// Default static false-positive rate of a class.
///
/// Used as the prior of the empirical rate until history accumulates.
/// Below `FP_SUPPRESSION_THRESHOLD`, so a fresh class is never shrunk.
pub const DEFAULT_FALSE_POSITIVE_RATE: f32 = 0.10;

// ===== FALSE-POSITIVE HISTORY =====

/// Upper bound (exclusive) of the low-confidence bucket.
///
/// Calibrated scores below this count towards the empirical FP rate.
pub const LOW_BUCKET_UPPER: f32 = 0.4;

/// Upper bound (exclusive) of the medium-confidence bucket.
pub const MEDIUM_BUCKET_UPPER: f32 = 0.7;

/// Maximum number of observations kept per class before decay.
pub const HISTORY_CAPACITY: f32 = 1000.0;

/// Factor applied to every bucket when the history overflows.
pub const HISTORY_DECAY: f32 = 0.9;

/// Weight, in pseudo-observations, of the static FP rate in the estimate.
///
/// With no history the estimate equals the static rate; after a few
/// hundred observations the empirical fraction dominates.
pub const FP_PRIOR_WEIGHT: f32 = 10.0;

/// Empirical FP rate above which scores are shrunk.
pub const FP_SUPPRESSION_THRESHOLD: f32 = 0.15;

/// Maximum fractional shrink, reached at an FP rate of 1.0.
pub const FP_MAX_SHRINK: f32 = 0.5;

// ===== CONSENSUS BOOST =====

/// Multiplicative boost per unit of consensus strength.
///
/// score × (1 + 0.2 × strength), capped at 1.0.
pub const CONSENSUS_BOOST_FACTOR: f32 = 0.2;

/// Agreeing scale matches that give full consensus strength.
///
/// A single match carries no consensus; `n > 1` matches give `min(n / 10, 1)`.
pub const FULL_CONSENSUS_MATCHES: u32 = 10;

// ===== DETERMINISTIC EXPONENTIAL =====

/// Number of Taylor terms evaluated by `series::exp`.
pub const SERIES_TERMS: usize = 12;

/// Number of squarings applied after the series (argument scaled by 2^-8).
pub const SERIES_SQUARINGS: u32 = 8;

/// Logistic arguments are clamped to ±this value.
///
/// σ(±30) differs from 0/1 by less than f32 resolution.
pub const LOGISTIC_ARG_LIMIT: f64 = 30.0;
