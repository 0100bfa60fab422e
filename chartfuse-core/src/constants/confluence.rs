//! Confluence Zone Constants

/// Default grid size in pixels for session-level clustering.
///
/// Coarser than the temporal grid: matches come from a whole session.
pub const CONFLUENCE_GRID_SIZE_PX: u32 = 50;

/// Default minimum number of matches in a zone.
pub const MIN_ZONE_PATTERNS: usize = 2;

/// Default radius in pixels for nearby-match searches.
pub const DEFAULT_NEARBY_RADIUS_PX: f32 = 50.0;

// ===== STRENGTH FORMULA =====

/// Base strength of a single-member cluster.
pub const BASE_STRENGTH_SINGLE: f32 = 1.0;

/// Base strength of a two-member cluster.
pub const BASE_STRENGTH_PAIR: f32 = 1.5;

/// Base strength of a cluster with three or more members.
pub const BASE_STRENGTH_MANY: f32 = 2.0;

/// Bonus when a cluster holds more than one distinct pattern class.
pub const DIVERSITY_BONUS: f32 = 0.2;

/// Average confidence above which the confidence bonus applies.
pub const CONFIDENCE_BONUS_PIVOT: f32 = 0.7;

/// Weight of the confidence bonus.
pub const CONFIDENCE_BONUS_WEIGHT: f32 = 0.5;

/// Lower clamp of zone strength.
pub const MIN_ZONE_STRENGTH: f32 = 1.0;

/// Upper clamp of zone strength.
pub const MAX_ZONE_STRENGTH: f32 = 3.0;

/// Strength at or above which a zone is high-strength.
pub const HIGH_STRENGTH_THRESHOLD: f32 = 1.8;
