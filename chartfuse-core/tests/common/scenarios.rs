//! Reference inputs for the end-to-end scenarios

use chartfuse_core::{Detection, FusedPattern, FusionEngine};

use super::bbox;

/// ML and template detections of one Double Top, overlapping at IoU ≈ 0.82
pub fn double_top_pair() -> (Detection, Detection) {
    (
        Detection::new("DoubleTop", 0.9, bbox(10, 10, 50, 50)),
        Detection::new("DoubleTop", 0.8, bbox(12, 12, 52, 52)),
    )
}

/// Fused output of [`double_top_pair`] with the default engine
pub fn double_top_frame() -> Vec<FusedPattern> {
    let (ml, template) = double_top_pair();
    FusionEngine::default().fuse(&[ml], &[template])
}
