//! Temporal Consensus Constants

/// Default number of frames in the voting window.
///
/// 5 frames at 60 FPS cover roughly 83 ms.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Largest supported voting window.
///
/// The window is a fixed-capacity ring; this is its compile-time capacity.
pub const MAX_TEMPORAL_WINDOW: usize = 32;

/// Default fraction of the window a pattern must appear in.
///
/// ceil(5 × 0.6) = 3 votes.
pub const DEFAULT_CONSENSUS_THRESHOLD: f32 = 0.6;

/// Grid size in pixels used to match patterns across frames.
pub const TEMPORAL_GRID_SIZE_PX: u32 = 20;

/// Tolerance subtracted before taking the ceiling of `window × threshold`.
///
/// 5 × 0.6 evaluates slightly above 3.0 in binary floating point.
pub const VOTE_EPSILON: f32 = 1.0e-4;
