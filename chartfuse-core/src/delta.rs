//! Frame-level delta cache
//!
//! Charts are mostly static between frames. When a frame's fingerprint is
//! within a few bits of the last processed frame, detectors are skipped and
//! the previous stable result is served instead.
//!
//! The decision and the commit are separate calls. `should_process`
//! computes the fingerprint and holds it as pending; only `update_cache`
//! makes it the reference for later frames. A frame abandoned between the
//! two never replaces the committed entry.

use alloc::vec::Vec;

use crate::constants::cache::{DEFAULT_CHANGE_THRESHOLD_BITS, MAX_CHANGE_THRESHOLD_BITS};
use crate::detection::FusedPattern;
use crate::errors::{ConfigError, ConfigResult};
use crate::frame::{Fingerprint, FrameView};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Change detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeltaConfig {
    /// Largest Hamming distance still treated as the same frame
    pub change_threshold_bits: u32,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            change_threshold_bits: DEFAULT_CHANGE_THRESHOLD_BITS,
        }
    }
}

impl DeltaConfig {
    /// Check ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.change_threshold_bits > MAX_CHANGE_THRESHOLD_BITS {
            return Err(ConfigError::OutOfRange {
                field: "delta.change_threshold_bits",
                value: self.change_threshold_bits as f32,
                min: 0.0,
                max: MAX_CHANGE_THRESHOLD_BITS as f32,
            });
        }
        Ok(())
    }
}

/// Committed fingerprint and the result computed for it
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Fingerprint of the last processed frame
    pub fingerprint: Fingerprint,
    /// Stable result for that frame
    pub detections: Vec<FusedPattern>,
}

/// Hit and miss counters since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheStats {
    /// Frames served from the cache
    pub hits: u64,
    /// Frames sent to the detectors
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of decisions that were hits
    pub fn hit_rate(&self) -> f32 {
        let decisions = self.hits + self.misses;
        if decisions == 0 {
            0.0
        } else {
            (self.hits as f64 / decisions as f64) as f32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Pending {
    /// Last decision was a hit, or nothing was decided yet
    #[default]
    Idle,
    /// Changed frame awaiting commit
    Changed(Fingerprint),
    /// Frame that could not be fingerprinted
    Opaque,
}

/// Fingerprint-based short-circuit for unchanged frames
#[derive(Debug, Clone, Default)]
pub struct DeltaCache {
    config: DeltaConfig,
    committed: Option<CacheEntry>,
    pending: Pending,
    stats: CacheStats,
}

impl DeltaCache {
    /// Create an empty cache
    pub fn new(config: DeltaConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &DeltaConfig {
        &self.config
    }

    /// Change the threshold, keeping the committed entry
    pub fn set_config(&mut self, config: DeltaConfig) {
        self.config = config;
    }

    /// Whether `frame` differs enough from the committed frame to run
    /// the detectors
    pub fn should_process(&mut self, frame: &FrameView<'_>) -> bool {
        let fingerprint = match Fingerprint::of(frame) {
            Some(fingerprint) => fingerprint,
            None => {
                log_trace!("frame {} cannot be fingerprinted, processing", frame.sequence);
                self.pending = Pending::Opaque;
                self.stats.misses += 1;
                return true;
            }
        };

        if let Some(entry) = &self.committed {
            let distance = fingerprint.hamming(&entry.fingerprint);
            if distance <= self.config.change_threshold_bits {
                log_trace!("frame {} unchanged ({} bits), serving cache", frame.sequence, distance);
                self.pending = Pending::Idle;
                self.stats.hits += 1;
                return false;
            }
        }

        self.pending = Pending::Changed(fingerprint);
        self.stats.misses += 1;
        true
    }

    /// Result committed with the current fingerprint
    pub fn cached_detections(&self) -> Option<&[FusedPattern]> {
        self.committed.as_ref().map(|entry| entry.detections.as_slice())
    }

    /// Committed entry, if any
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.committed.as_ref()
    }

    /// Commit the pending fingerprint with its result
    ///
    /// After an unfingerprintable frame the committed entry is dropped, so
    /// its stale result is never served for a later frame.
    pub fn update_cache(&mut self, detections: Vec<FusedPattern>) {
        match core::mem::take(&mut self.pending) {
            Pending::Changed(fingerprint) => {
                self.committed = Some(CacheEntry {
                    fingerprint,
                    detections,
                });
            }
            Pending::Opaque => self.committed = None,
            Pending::Idle => {
                if let Some(entry) = self.committed.as_mut() {
                    entry.detections = detections;
                }
            }
        }
    }

    /// Hits over decisions since the last reset
    pub fn cache_hit_rate(&self) -> f32 {
        self.stats.hit_rate()
    }

    /// Counters since the last reset
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Forget fingerprints, result and counters
    pub fn reset(&mut self) {
        self.committed = None;
        self.pending = Pending::Idle;
        self.stats = CacheStats::default();
        log_debug!("delta cache reset");
    }
}
