//! Per-frame Fusion Pipeline
//!
//! ## Overview
//!
//! [`FusionPipeline`] owns every stage and runs one frame at a time:
//!
//! ```text
//! FrameView ─→ sequence check ─→ DeltaCache ──unchanged──→ cached result
//!                                    │
//!                                 changed
//!                                    ↓
//!              ML detector ─┐
//!                           ├─→ Calibrator ─→ FusionEngine ─→ TemporalStabilizer
//!        template detector ─┘                                        │
//!                                                                    ↓
//!                                        DeltaCache::update_cache ←─ stable result
//!                                        SessionLedger::record    ←─┘
//! ```
//!
//! Nothing is committed until the stable result exists, so dropping a
//! frame half way (e.g. a detector panicking on the host side) leaves the
//! cache and ledger as they were.
//!
//! ## Threading
//!
//! The pipeline is `Send` and takes `&mut self` per frame. Hosts scanning
//! several charts run one pipeline per chart; hosts sharing one pipeline
//! across threads wrap it in a mutex.
//!
//! ## Example
//!
//! ```rust
//! use chartfuse_core::{
//!     BoundingBox, Detection, FrameOutcome, FrameView, FusionPipeline, NoDetections,
//! };
//!
//! let mut pipeline = FusionPipeline::default();
//! let mut ml = |_: &FrameView<'_>| {
//!     vec![Detection::new("Double Top", 0.9, BoundingBox::new(10, 10, 60, 60))]
//! };
//!
//! let pixels: Vec<u8> = (0..64u32 * 64).map(|i| (i % 64) as u8 * 4).collect();
//! let frame = FrameView::gray(&pixels, 64, 64).with_sequence(1);
//!
//! match pipeline.process_frame(&frame, &mut ml, &mut NoDetections) {
//!     FrameOutcome::Processed(patterns) => assert_eq!(patterns.len(), 1),
//!     other => panic!("unexpected outcome {:?}", other),
//! }
//! ```

use alloc::vec::Vec;

use crate::calibration::Calibrator;
use crate::config::PipelineConfig;
use crate::confluence::{ConfluenceEngine, ConfluenceZone};
use crate::delta::DeltaCache;
use crate::detection::{Detection, FusedPattern};
use crate::errors::ConfigResult;
use crate::frame::{FrameView, UNSEQUENCED};
use crate::fusion::FusionEngine;
use crate::power::PowerProfile;
use crate::session::SessionLedger;
use crate::temporal::TemporalStabilizer;
use crate::traits::PatternDetector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of offering one frame to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Detectors ran; stable result for this frame
    Processed(Vec<FusedPattern>),
    /// Frame unchanged; result of the last processed frame
    Cached(Vec<FusedPattern>),
    /// Sequence number not newer than the last accepted frame; nothing ran
    Stale {
        /// Sequence number of the rejected frame
        sequence: u64,
        /// Last accepted sequence number
        last_accepted: u64,
    },
}

impl FrameOutcome {
    /// Stable patterns for display; empty for a stale frame
    pub fn patterns(&self) -> &[FusedPattern] {
        match self {
            FrameOutcome::Processed(patterns) | FrameOutcome::Cached(patterns) => patterns,
            FrameOutcome::Stale { .. } => &[],
        }
    }

    /// Take the stable patterns
    pub fn into_patterns(self) -> Vec<FusedPattern> {
        match self {
            FrameOutcome::Processed(patterns) | FrameOutcome::Cached(patterns) => patterns,
            FrameOutcome::Stale { .. } => Vec::new(),
        }
    }

    /// Whether the frame was rejected as out of order
    pub fn is_stale(&self) -> bool {
        matches!(self, FrameOutcome::Stale { .. })
    }
}

/// Counters since construction or the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineStats {
    /// Frames offered, including stale ones
    pub frames: u64,
    /// Frames that ran the detectors
    pub processed: u64,
    /// Frames served from the delta cache
    pub cache_hits: u64,
    /// Frames rejected as out of order
    pub stale_frames: u64,
    /// Detections hard-rejected by calibration
    pub rejected_detections: u64,
}

impl PipelineStats {
    /// Cache hits over accepted frames
    pub fn cache_hit_rate(&self) -> f32 {
        let accepted = self.processed + self.cache_hits;
        if accepted == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / accepted as f64) as f32
        }
    }
}

/// Owner and orchestrator of every pipeline stage
#[derive(Debug, Clone)]
pub struct FusionPipeline {
    base_config: PipelineConfig,
    config: PipelineConfig,
    power: PowerProfile,
    delta: DeltaCache,
    calibrator: Calibrator,
    fusion: FusionEngine,
    stabilizer: TemporalStabilizer,
    confluence: ConfluenceEngine,
    ledger: SessionLedger,
    last_sequence: Option<u64>,
    stats: PipelineStats,
}

impl Default for FusionPipeline {
    fn default() -> Self {
        Self::build(PipelineConfig::default())
    }
}

impl FusionPipeline {
    /// Create a pipeline after validating `config`
    pub fn new(config: PipelineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PipelineConfig) -> Self {
        Self {
            delta: DeltaCache::new(config.delta),
            calibrator: Calibrator::new(config.calibration.clone()),
            fusion: FusionEngine::new(config.fusion.clone()),
            stabilizer: TemporalStabilizer::new(config.temporal),
            confluence: ConfluenceEngine::new(config.confluence),
            ledger: SessionLedger::new(config.session, config.temporal.grid_size),
            base_config: config.clone(),
            config,
            power: PowerProfile::default(),
            last_sequence: None,
            stats: PipelineStats::default(),
        }
    }

    /// Run one frame
    ///
    /// Sequenced frames must arrive with strictly increasing sequence
    /// numbers; any other frame is reported as [`FrameOutcome::Stale`]
    /// without touching state. Frames with sequence 0 are unsequenced and
    /// always accepted.
    pub fn process_frame<M, T>(
        &mut self,
        frame: &FrameView<'_>,
        ml: &mut M,
        template: &mut T,
    ) -> FrameOutcome
    where
        M: PatternDetector + ?Sized,
        T: PatternDetector + ?Sized,
    {
        self.stats.frames += 1;

        let ordered = self.last_sequence.filter(|_| frame.sequence != UNSEQUENCED);
        if let Some(last_accepted) = ordered {
            if frame.sequence <= last_accepted {
                log_warn!(
                    "dropping stale frame {} (last accepted {})",
                    frame.sequence,
                    last_accepted
                );
                self.stats.stale_frames += 1;
                return FrameOutcome::Stale {
                    sequence: frame.sequence,
                    last_accepted,
                };
            }
        }
        if frame.sequence != UNSEQUENCED {
            self.last_sequence = Some(frame.sequence);
        }

        if !self.delta.should_process(frame) {
            if let Some(cached) = self.delta.cached_detections() {
                let cached = cached.to_vec();
                self.stats.cache_hits += 1;
                self.ledger.record(frame.timestamp_ms, &cached);
                return FrameOutcome::Cached(cached);
            }
        }

        let ml_raw = ml.detect(frame);
        let template_raw = template.detect(frame);
        let stable = self.run_stages(&ml_raw, &template_raw);

        self.delta.update_cache(stable.clone());
        self.ledger.record(frame.timestamp_ms, &stable);
        self.stats.processed += 1;

        log_trace!(
            "frame {}: {} ML + {} template detections, {} stable patterns",
            frame.sequence,
            ml_raw.len(),
            template_raw.len(),
            stable.len()
        );

        FrameOutcome::Processed(stable)
    }

    fn run_stages(&mut self, ml_raw: &[Detection], template_raw: &[Detection]) -> Vec<FusedPattern> {
        let ml = self.calibrate_all(ml_raw);
        let template = self.calibrate_all(template_raw);
        let fused = self.fusion.fuse(&ml, &template);
        self.stabilizer.stabilize(fused)
    }

    fn calibrate_all(&mut self, raw: &[Detection]) -> Vec<Detection> {
        let calibrated: Vec<Detection> = raw
            .iter()
            .filter_map(|d| self.calibrator.calibrate_detection(d, d.consensus))
            .collect();
        self.stats.rejected_detections += (raw.len() - calibrated.len()) as u64;
        calibrated
    }

    /// Confluence zones among matches seen in the last `lookback_ms`
    pub fn confluence_zones(&self, now_ms: u64, lookback_ms: u64) -> Vec<ConfluenceZone> {
        let recent = self.ledger.recent(now_ms, lookback_ms);
        self.confluence.find_confluence_zones(&recent)
    }

    /// Confluence zones over the configured default look-back
    pub fn recent_confluence_zones(&self, now_ms: u64) -> Vec<ConfluenceZone> {
        self.confluence_zones(now_ms, self.config.session.lookback_ms)
    }

    /// Switch power profile, re-tuning from the configuration given at
    /// construction
    pub fn set_power_profile(&mut self, profile: PowerProfile) {
        if profile == self.power {
            return;
        }

        let tuned = profile.tune(&self.base_config);
        self.delta.set_config(tuned.delta);
        self.stabilizer.reconfigure(tuned.temporal);
        self.config = tuned;
        self.power = profile;

        log_info!(
            "power profile {:?}: {} fps, window {}, change threshold {} bits",
            profile,
            profile.target_fps(),
            self.config.temporal.window_size,
            self.config.delta.change_threshold_bits
        );
    }

    /// Active power profile
    pub fn power_profile(&self) -> PowerProfile {
        self.power
    }

    /// Effective configuration, after power tuning
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Counters since the last reset
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Cache hits over accepted frames since the last reset
    pub fn cache_hit_rate(&self) -> f32 {
        self.stats.cache_hit_rate()
    }

    /// Calibrator, for inspecting learned false-positive rates
    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Recorded session matches
    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    /// Frames currently held by the temporal window
    pub fn temporal_history_len(&self) -> usize {
        self.stabilizer.history_len()
    }

    /// Start a new session: clears the delta cache, temporal window,
    /// session ledger, sequence tracking and counters
    ///
    /// Calibration history is kept; use
    /// [`reset_calibration`](Self::reset_calibration) to forget it too.
    pub fn reset(&mut self) {
        self.delta.reset();
        self.stabilizer.reset();
        self.ledger.clear();
        self.last_sequence = None;
        self.stats = PipelineStats::default();
        log_info!("pipeline reset");
    }

    /// Forget learned false-positive history
    pub fn reset_calibration(&mut self) {
        self.calibrator.reset_history();
    }
}
