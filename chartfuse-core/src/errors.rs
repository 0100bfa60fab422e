//! Error Types for Pipeline Configuration
//!
//! ## Design Philosophy
//!
//! The per-frame path of ChartFuse never fails. Calibration, fusion,
//! stabilization, the delta cache and confluence clustering all have a
//! defined output for every input: empty detection lists produce empty
//! results, unknown pattern classes fall back to default parameters and
//! out-of-range numbers are clamped to `[0, 1]`.
//!
//! Errors therefore only exist at the configuration boundary, where a bad
//! value would otherwise silently change the behaviour of every later frame.
//! They follow the same rules as the rest of the crate:
//!
//! 1. **Small Size**: variants carry only `f32`/`usize` values and
//!    `&'static str` field names.
//! 2. **No Heap Allocation**: errors can be raised on `no_std` targets.
//! 3. **Copy Semantics**: returned by value, cheap to log and compare.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use chartfuse_core::{ConfigError, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.temporal.window_size = 0;
//!
//! match config.validate() {
//!     Ok(()) => {}
//!     Err(ConfigError::OutOfRange { field, .. }) => {
//!         // Reject the profile, keep running with the previous config
//!         assert_eq!(field, "temporal.window_size");
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Numeric parameter outside its accepted range
    #[error("{field} = {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the offending field
        field: &'static str,
        /// Value that was supplied
        value: f32,
        /// Smallest accepted value
        min: f32,
        /// Largest accepted value
        max: f32,
    },

    /// Parameter is NaN or infinite
    #[error("{field} is not a finite number")]
    NotFinite {
        /// Dotted path of the offending field
        field: &'static str,
    },

    /// Two parameters contradict each other
    #[error("Inconsistent configuration: {reason}")]
    Inconsistent {
        /// What is inconsistent
        reason: &'static str,
    },

    /// Serialized configuration could not be decoded
    #[error("Malformed configuration document: {reason}")]
    Malformed {
        /// Short description of the decode failure
        reason: &'static str,
    },
}

/// Check that `value` is finite and within `[min, max]`
pub(crate) fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> ConfigResult<()> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field });
    }

    if value < min || value > max {
        return Err(ConfigError::OutOfRange { field, value, min, max });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check() {
        assert!(check_range("x", 0.5, 0.0, 1.0).is_ok());
        assert!(check_range("x", 0.0, 0.0, 1.0).is_ok());
        assert_eq!(
            check_range("x", 1.5, 0.0, 1.0),
            Err(ConfigError::OutOfRange { field: "x", value: 1.5, min: 0.0, max: 1.0 })
        );
    }

    #[test]
    fn non_finite_rejected() {
        assert_eq!(check_range("y", f32::NAN, 0.0, 1.0), Err(ConfigError::NotFinite { field: "y" }));
        assert_eq!(
            check_range("y", f32::INFINITY, 0.0, 1.0),
            Err(ConfigError::NotFinite { field: "y" })
        );
    }
}
