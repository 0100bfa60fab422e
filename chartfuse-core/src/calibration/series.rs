//! Deterministic exponential and logistic
//!
//! `libm` and platform `exp` implementations may differ in the last bit
//! between targets. Calibrated scores feed thresholds, so a one-ulp
//! difference can flip a hard reject. These functions use only IEEE basic
//! operations (`+`, `*`, `/`) in a fixed order and therefore produce the
//! same bits everywhere.
//!
//! ```text
//! exp(x) = (Σₖ₌₀¹² (x/256)ᵏ / k!) ^ 256
//! ```
//!
//! The scaled argument stays within ±0.25 for the logistic range, where the
//! truncated series is accurate to well below f64 resolution; eight
//! squarings then undo the scaling.

use crate::constants::calibration::{LOGISTIC_ARG_LIMIT, SERIES_SQUARINGS, SERIES_TERMS};

const SCALE: f64 = (1u32 << SERIES_SQUARINGS) as f64;

/// Largest argument accepted by [`exp`]; larger values are clamped
pub const EXP_ARG_LIMIT: f64 = 2.0 * LOGISTIC_ARG_LIMIT;

/// Bit-reproducible `eˣ`
///
/// Arguments are clamped to ±[`EXP_ARG_LIMIT`]. NaN propagates.
pub fn exp(x: f64) -> f64 {
    if x.is_nan() {
        return x;
    }

    let scaled = x.clamp(-EXP_ARG_LIMIT, EXP_ARG_LIMIT) / SCALE;

    // Horner form of the truncated Taylor series
    let mut acc = 1.0;
    for k in (1..=SERIES_TERMS).rev() {
        acc = 1.0 + acc * scaled / k as f64;
    }

    for _ in 0..SERIES_SQUARINGS {
        acc *= acc;
    }

    acc
}

/// Bit-reproducible logistic `1 / (1 + e⁻ᶻ)`
///
/// `z` is clamped to ±30; NaN is treated as 0.
pub fn logistic(z: f64) -> f64 {
    let z = if z.is_nan() {
        0.0
    } else {
        z.clamp(-LOGISTIC_ARG_LIMIT, LOGISTIC_ARG_LIMIT)
    };

    1.0 / (1.0 + exp(-z))
}
