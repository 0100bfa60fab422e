//! Pipeline Profiles for ChartFuse
//!
//! ## Overview
//!
//! A profile is a named [`PipelineConfig`] stored as JSON. Deployments tune
//! the pipeline per device class or per use case (battery-constrained
//! scanning, maximum recall for review tools) by shipping profiles instead
//! of recompiling.
//!
//! Profile documents only list the sections they change; everything else
//! keeps the core defaults:
//!
//! ```json
//! {
//!   "temporal": { "window_size": 7 },
//!   "delta": { "change_threshold_bits": 10 }
//! }
//! ```
//!
//! ## Bundled Profiles
//!
//! | Name          | Use                                                    |
//! |---------------|--------------------------------------------------------|
//! | `balanced`    | Core defaults, written out                             |
//! | `low_power`   | Wider window and coarser change detection              |
//! | `high_recall` | Lower calibration floor and consensus threshold        |
//!
//! ## Usage Example
//!
//! ```rust
//! use chartfuse_core::FusionPipeline;
//! use chartfuse_profiles::{builtin, ProfileRegistry};
//!
//! // Bundled profile
//! let config = builtin("low_power")?;
//! assert_eq!(config.temporal.window_size, 7);
//!
//! // Registry with bundled plus custom profiles
//! let registry = ProfileRegistry::with_builtin()?;
//! registry.register_json("kiosk", r#"{ "temporal": { "window_size": 9 } }"#)?;
//!
//! let pipeline = FusionPipeline::new(registry.get("kiosk")?)?;
//! assert_eq!(pipeline.config().temporal.window_size, 9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use chartfuse_core::{ConfigError, PipelineConfig};
use include_dir::{include_dir, Dir};

pub mod registry;

pub use registry::ProfileRegistry;

/// Profiles compiled into the crate
pub static BUNDLED_PROFILES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/profiles");

/// Profile-related errors
#[derive(Debug, thiserror_no_std::Error)]
pub enum ProfileError {
    /// No profile registered under this name
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// Document is not a valid pipeline configuration
    #[error("Failed to parse profile {name}: {message}")]
    Parse {
        /// Profile name
        name: String,
        /// Parser message
        message: String,
    },

    /// Document parsed but holds out-of-range values
    #[error("Invalid profile {name}: {error}")]
    Invalid {
        /// Profile name
        name: String,
        /// First failing check
        error: ConfigError,
    },

    /// Reading a profile from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry lock was poisoned by a panicking writer
    #[error("Profile registry lock poisoned")]
    Poisoned,
}

/// Parse and validate a profile document
pub fn parse_profile(name: &str, json: &str) -> Result<PipelineConfig, ProfileError> {
    let config: PipelineConfig = serde_json::from_str(json).map_err(|e| ProfileError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    config.validate().map_err(|error| ProfileError::Invalid {
        name: name.to_string(),
        error,
    })?;

    Ok(config)
}

/// Register a profile, logging and skipping it when it fails to load
fn register_or_warn(registry: &ProfileRegistry, name: &str, json: &str) -> bool {
    match registry.register_json(name, json) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("skipping bundled profile {}: {}", name, e);
            false
        }
    }
}

/// Names of the bundled profiles, sorted
pub fn builtin_names() -> Vec<String> {
    let mut names: Vec<String> = BUNDLED_PROFILES
        .files()
        .filter_map(|file| registry::profile_name(file.path()))
        .collect();
    names.sort();
    names
}

/// Look up a bundled profile
pub fn builtin(name: &str) -> Result<PipelineConfig, ProfileError> {
    BUILTIN_REGISTRY.get(name)
}

lazy_static::lazy_static! {
    /// Registry holding every bundled profile
    ///
    /// Bundled profiles that fail to load are skipped.
    pub static ref BUILTIN_REGISTRY: ProfileRegistry = {
        let registry = ProfileRegistry::new();
        for file in BUNDLED_PROFILES.files() {
            let Some(name) = registry::profile_name(file.path()) else {
                continue;
            };
            match file.contents_utf8() {
                Some(json) => {
                    register_or_warn(&registry, &name, json);
                }
                None => log::warn!("skipping bundled profile {}: not UTF-8", name),
            }
        }
        registry
    };
}
