//! Detector interface
//!
//! Detector internals are out of scope for this crate: the ML model and the
//! template matcher live with the host. The pipeline only needs them to
//! turn a frame into raw detections.

use alloc::vec::Vec;

use crate::detection::Detection;
use crate::frame::FrameView;

/// Source of raw detections for a frame
///
/// Implemented by the ML and template collaborators, and by any closure
/// `FnMut(&FrameView) -> Vec<Detection>`.
///
/// ```rust
/// use chartfuse_core::{BoundingBox, Detection, FrameView, PatternDetector};
///
/// let mut detector = |_: &FrameView<'_>| {
///     vec![Detection::new("Flag", 0.8, BoundingBox::new(0, 0, 40, 40))]
/// };
///
/// let pixels = [0u8; 16];
/// assert_eq!(detector.detect(&FrameView::gray(&pixels, 4, 4)).len(), 1);
/// ```
pub trait PatternDetector {
    /// Detect patterns in `frame`
    ///
    /// Confidences outside `[0, 1]` are clamped by the pipeline.
    fn detect(&mut self, frame: &FrameView<'_>) -> Vec<Detection>;
}

impl<F> PatternDetector for F
where
    F: FnMut(&FrameView<'_>) -> Vec<Detection>,
{
    fn detect(&mut self, frame: &FrameView<'_>) -> Vec<Detection> {
        self(frame)
    }
}

/// Detector that never reports anything
///
/// Stands in for a collaborator that is disabled, e.g. a template matcher
/// switched off under the lowest power profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetections;

impl PatternDetector for NoDetections {
    fn detect(&mut self, _frame: &FrameView<'_>) -> Vec<Detection> {
        Vec::new()
    }
}
