//! Fusion Constants
//!
//! Thresholds and penalties for combining ML and template detections.

// ===== OVERLAP =====

/// IoU above which a template detection confirms an ML detection.
///
/// Source: PASCAL VOC match criterion
pub const CONFIRMATION_IOU_THRESHOLD: f32 = 0.5;

/// IoU above which a template detection counts as "near" an ML detection.
///
/// Template-only detections must clear every ML box at this looser level.
pub const TEMPLATE_ONLY_IOU_THRESHOLD: f32 = 0.3;

// ===== SINGLE-SOURCE PENALTIES =====

/// Confidence multiplier for ML detections without template support.
pub const ML_ONLY_PENALTY: f32 = 0.7;

/// Confidence multiplier for template detections without ML support.
pub const TEMPLATE_ONLY_PENALTY: f32 = 0.8;

/// Template detections must exceed this confidence to survive alone.
///
/// Unsupported template detections at or below it are dropped.
pub const TEMPLATE_ONLY_MIN_CONFIDENCE: f32 = 0.85;

// ===== PRIORS =====

/// Prior probability for classes missing from the prior table.
pub const DEFAULT_CLASS_PRIOR: f32 = 0.5;

/// Priors are clamped into this open band so the posterior stays defined.
pub const PRIOR_EPSILON: f32 = 1.0e-4;
