//! Power and thermal profiles
//!
//! The pipeline never reads battery or thermal state itself. The host
//! reports a [`DeviceState`], picks a [`PowerProfile`] and applies it; the
//! profile sets the frame rate the host should capture at and loosens the
//! pipeline so fewer frames reach the detectors.
//!
//! | Profile | FPS | Delta threshold | Temporal window |
//! |---------|-----|-----------------|-----------------|
//! | UltraLowPower | 10 | +6 bits | +3 frames |
//! | LowPower | 20 | +3 bits | +2 frames |
//! | Balanced | 30 | base | base |
//! | HighPerformance | 60 | base | base |

use crate::config::PipelineConfig;
use crate::constants::cache::MAX_CHANGE_THRESHOLD_BITS;
use crate::constants::temporal::MAX_TEMPORAL_WINDOW;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Battery level below which the ultra-low profile is chosen
const CRITICAL_BATTERY_PERCENT: u8 = 15;

/// Battery level above which the high-performance profile is chosen
const HIGH_BATTERY_PERCENT: u8 = 80;

/// Inference budget preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PowerProfile {
    /// Critical battery
    UltraLowPower,
    /// Power-save mode or thermal throttling
    LowPower,
    /// Normal operation
    #[default]
    Balanced,
    /// Charging or high battery
    HighPerformance,
}

/// Device state reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Battery charge, 0–100
    pub battery_percent: u8,
    /// Connected to power
    pub charging: bool,
    /// OS power-save mode active
    pub power_save: bool,
    /// Thermal status at or above "moderate"
    pub thermal_throttled: bool,
}

impl PowerProfile {
    /// Target capture rate
    pub const fn target_fps(self) -> u32 {
        match self {
            PowerProfile::UltraLowPower => 10,
            PowerProfile::LowPower => 20,
            PowerProfile::Balanced => 30,
            PowerProfile::HighPerformance => 60,
        }
    }

    /// Milliseconds between captured frames
    pub const fn frame_interval_ms(self) -> u64 {
        1000 / self.target_fps() as u64
    }

    /// Profile for the reported device state
    pub fn select(state: &DeviceState) -> Self {
        if state.battery_percent < CRITICAL_BATTERY_PERCENT && !state.charging {
            PowerProfile::UltraLowPower
        } else if state.power_save || state.thermal_throttled {
            PowerProfile::LowPower
        } else if state.charging || state.battery_percent > HIGH_BATTERY_PERCENT {
            PowerProfile::HighPerformance
        } else {
            PowerProfile::Balanced
        }
    }

    /// `base` adjusted for this profile
    pub fn tune(self, base: &PipelineConfig) -> PipelineConfig {
        let (extra_bits, extra_frames) = match self {
            PowerProfile::UltraLowPower => (6, 3),
            PowerProfile::LowPower => (3, 2),
            PowerProfile::Balanced | PowerProfile::HighPerformance => (0, 0),
        };

        let mut tuned = base.clone();
        tuned.delta.change_threshold_bits = base
            .delta
            .change_threshold_bits
            .saturating_add(extra_bits)
            .min(MAX_CHANGE_THRESHOLD_BITS);
        tuned.temporal.window_size = base
            .temporal
            .window_size
            .saturating_add(extra_frames)
            .min(MAX_TEMPORAL_WINDOW);
        tuned
    }
}
