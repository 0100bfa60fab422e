//! Detection fusion and temporal stabilization for on-device chart
//! pattern detectors
//!
//! Two independent detectors look at every captured chart frame: a learned
//! model and a template matcher. Both are noisy. ChartFuse turns their raw
//! per-frame outputs into a small set of calibrated, temporally stable,
//! de-duplicated patterns.
//!
//! Key constraints:
//! - Per-frame path never fails; bad input yields empty or clamped output
//! - Deterministic calibration across targets (no platform `exp`)
//! - Fixed-capacity temporal window, no unbounded per-frame growth
//! - `no_std` + `alloc` capable
//!
//! ```rust
//! use chartfuse_core::{
//!     BoundingBox, Detection, FrameView, FusionPipeline, PatternClass, PipelineConfig,
//! };
//!
//! let mut pipeline = FusionPipeline::new(PipelineConfig::default())?;
//!
//! let mut ml = |_: &FrameView<'_>| {
//!     vec![Detection::new("Head and Shoulders", 0.92, BoundingBox::new(40, 30, 160, 110))]
//! };
//! let mut template = |_: &FrameView<'_>| {
//!     vec![Detection::new("Head and Shoulders", 0.88, BoundingBox::new(42, 31, 161, 112))]
//! };
//!
//! let pixels = vec![0u8; 320 * 240];
//! let frame = FrameView::gray(&pixels, 320, 240).with_sequence(1);
//!
//! let outcome = pipeline.process_frame(&frame, &mut ml, &mut template);
//! let patterns = outcome.patterns();
//! assert_eq!(patterns[0].class, PatternClass::HeadAndShoulders);
//! assert!(patterns[0].is_confirmed());
//! # Ok::<(), chartfuse_core::ConfigError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod calibration;
pub mod config;
pub mod confluence;
pub mod constants;
pub mod delta;
pub mod detection;
pub mod errors;
pub mod frame;
pub mod fusion;
pub mod geometry;
pub mod pattern;
pub mod pipeline;
pub mod power;
pub mod session;
pub mod temporal;
pub mod traits;

// Public API
pub use calibration::{CalibrationConfig, CalibrationCurve, Calibrator};
pub use config::PipelineConfig;
pub use confluence::{CalibratedMatch, ConfluenceConfig, ConfluenceEngine, ConfluenceZone};
pub use delta::{DeltaCache, DeltaConfig};
pub use detection::{Detection, DetectorKind, FusedPattern, SourceSet};
pub use errors::{ConfigError, ConfigResult};
pub use frame::{Fingerprint, FrameView, PixelFormat, UNSEQUENCED};
pub use fusion::{FusionConfig, FusionEngine};
pub use geometry::{iou, BoundingBox, Point, SpatialKey};
pub use pattern::{ClassTable, PatternClass};
pub use pipeline::{FrameOutcome, FusionPipeline, PipelineStats};
pub use power::{DeviceState, PowerProfile};
pub use session::{SessionConfig, SessionLedger};
pub use temporal::{TemporalConfig, TemporalStabilizer};
pub use traits::{NoDetections, PatternDetector};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
