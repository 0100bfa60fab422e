//! Constants for ChartFuse Core
//!
//! This module provides centralized, documented constants used throughout
//! the pipeline. Every default in the `config` types is defined here, so a
//! profile that omits a field falls back to exactly these values.
//!
//! ## Organization
//!
//! Constants are grouped by pipeline stage:
//! - **Calibration**: logistic curve defaults, false-positive buckets, series exp
//! - **Fusion**: IoU thresholds, single-source penalties, class priors
//! - **Temporal**: voting window and spatial grid
//! - **Cache**: frame fingerprint geometry and change threshold
//! - **Confluence**: coarse grid and zone strength formula
//! - **Session**: match ledger capacity and look-back
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Document where a value comes from when adding one
//! 3. Keep probabilities in `[0, 1]` and pixel sizes in whole pixels

/// Calibration curve defaults and false-positive suppression parameters.
pub mod calibration;

/// Bayesian fusion thresholds and penalties.
pub mod fusion;

/// Temporal consensus window parameters.
pub mod temporal;

/// Delta cache fingerprint parameters.
pub mod cache;

/// Confluence zone clustering and strength parameters.
pub mod confluence;

/// Session match ledger parameters.
pub mod session;

// Re-export commonly used constants for convenience
pub use calibration::{
    DEFAULT_CURVE_SLOPE, DEFAULT_CURVE_INTERCEPT,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_FALSE_POSITIVE_RATE,
};

pub use fusion::{
    CONFIRMATION_IOU_THRESHOLD, TEMPLATE_ONLY_IOU_THRESHOLD,
    DEFAULT_CLASS_PRIOR,
};

pub use temporal::{
    DEFAULT_WINDOW_SIZE, DEFAULT_CONSENSUS_THRESHOLD,
    TEMPORAL_GRID_SIZE_PX, MAX_TEMPORAL_WINDOW,
};

pub use cache::{FINGERPRINT_SIDE, DEFAULT_CHANGE_THRESHOLD_BITS};

pub use confluence::{CONFLUENCE_GRID_SIZE_PX, MIN_ZONE_PATTERNS};
