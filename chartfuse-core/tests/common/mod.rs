//! Shared fixtures for integration tests
//!
//! - Synthetic chart frames with controllable content
//! - Scripted detectors that replay per-frame outputs
//! - The reference detections used by the end-to-end scenarios

#![allow(dead_code)]

pub mod scenarios;

use chartfuse_core::{BoundingBox, Detection, FrameView, PatternDetector};

pub const FRAME_WIDTH: u32 = 96;
pub const FRAME_HEIGHT: u32 = 64;

/// Deterministic xorshift generator
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16777216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Grayscale "price line" image: a dark background with a bright zig-zag
/// whose phase is `offset` pixels
pub fn chart_pixels(offset: u32) -> Vec<u8> {
    let mut pixels = vec![16u8; (FRAME_WIDTH * FRAME_HEIGHT) as usize];
    for x in 0..FRAME_WIDTH {
        let phase = (x + offset) % 32;
        let level = if phase < 16 { phase } else { 32 - phase };
        let y = 8 + level * 3;
        for dy in 0..4 {
            let row = (y + dy).min(FRAME_HEIGHT - 1);
            pixels[(row * FRAME_WIDTH + x) as usize] = 230;
        }
    }
    pixels
}

/// Frame over `pixels` with sequence `n` and timestamp `n × 33 ms`
pub fn frame(pixels: &[u8], n: u64) -> FrameView<'_> {
    FrameView::gray(pixels, FRAME_WIDTH, FRAME_HEIGHT)
        .with_sequence(n)
        .with_timestamp(n * 33)
}

/// Box from corner coordinates
pub fn bbox(left: i32, top: i32, right: i32, bottom: i32) -> BoundingBox {
    BoundingBox::new(left, top, right, bottom)
}

/// Detector replaying one list per call; repeats the last list when the
/// script runs out
pub struct ScriptedDetector {
    script: Vec<Vec<Detection>>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self { script, calls: 0 }
    }

    /// Same output on every call
    pub fn constant(detections: Vec<Detection>) -> Self {
        Self::new(vec![detections])
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl PatternDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &FrameView<'_>) -> Vec<Detection> {
        let index = self.calls.min(self.script.len().saturating_sub(1));
        self.calls += 1;
        self.script.get(index).cloned().unwrap_or_default()
    }
}
