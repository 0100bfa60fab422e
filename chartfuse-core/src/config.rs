//! Pipeline configuration
//!
//! One typed document configures every stage. All sections default, so a
//! JSON profile only lists what it changes:
//!
//! ```json
//! {
//!   "temporal": { "window_size": 7 },
//!   "fusion": { "priors": { "default": 0.5, "overrides": { "Flag": 0.65 } } }
//! }
//! ```

#[cfg(feature = "std")]
use alloc::string::String;

use crate::calibration::CalibrationConfig;
use crate::confluence::ConfluenceConfig;
use crate::delta::DeltaConfig;
use crate::errors::ConfigResult;
#[cfg(feature = "std")]
use crate::errors::ConfigError;
use crate::fusion::FusionConfig;
use crate::session::SessionConfig;
use crate::temporal::TemporalConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of every pipeline stage
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Per-class calibration curves
    pub calibration: CalibrationConfig,
    /// Fusion thresholds and priors
    pub fusion: FusionConfig,
    /// Temporal voting window
    pub temporal: TemporalConfig,
    /// Delta cache change threshold
    pub delta: DeltaConfig,
    /// Confluence clustering
    pub confluence: ConfluenceConfig,
    /// Session ledger
    pub session: SessionConfig,
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.calibration.validate()?;
        self.fusion.validate()?;
        self.temporal.validate()?;
        self.delta.validate()?;
        self.confluence.validate()?;
        self.session.validate()
    }

    /// Parse and validate a JSON document
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: PipelineConfig = serde_json::from_str(json).map_err(|_e| {
            log_warn!("rejecting pipeline config: {}", _e);
            ConfigError::Malformed {
                reason: "invalid JSON pipeline configuration",
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty-printed JSON
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|_| ConfigError::Malformed {
            reason: "pipeline configuration is not representable as JSON",
        })
    }
}
