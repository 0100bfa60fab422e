//! Borrowed frames and perceptual fingerprints
//!
//! The pipeline never owns pixel data: capture hands in a [`FrameView`]
//! over its own buffer. The only thing computed from pixels here is a
//! 64-bit average hash used by the delta cache.

use core::fmt;

use crate::constants::cache::{
    FINGERPRINT_SIDE, LUMA_BLUE_WEIGHT, LUMA_GREEN_WEIGHT, LUMA_RED_WEIGHT,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelFormat {
    /// One luma byte per pixel
    Gray8,
    /// Red, green, blue bytes
    Rgb8,
    /// Red, green, blue, alpha bytes
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Sequence number of a frame that does not take part in ordering checks
pub const UNSEQUENCED: u64 = 0;

/// One captured frame, borrowed from the caller
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Row-major pixel bytes, no padding between rows
    pub data: &'a [u8],
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
    /// Capture sequence number, strictly increasing; [`UNSEQUENCED`] opts
    /// out of stale-frame rejection
    pub sequence: u64,
    /// Capture time in milliseconds
    pub timestamp_ms: u64,
}

impl<'a> FrameView<'a> {
    /// Create an unsequenced frame with timestamp 0
    pub fn new(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
            sequence: UNSEQUENCED,
            timestamp_ms: 0,
        }
    }

    /// Grayscale frame
    pub fn gray(data: &'a [u8], width: u32, height: u32) -> Self {
        Self::new(data, width, height, PixelFormat::Gray8)
    }

    /// RGBA frame
    pub fn rgba(data: &'a [u8], width: u32, height: u32) -> Self {
        Self::new(data, width, height, PixelFormat::Rgba8)
    }

    /// Set the sequence number
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the capture timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Bytes required for the declared size and format
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.format.bytes_per_pixel())
    }

    /// Non-empty and backed by enough bytes
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.expected_len().map_or(false, |len| self.data.len() >= len)
    }

    fn luma(&self, x: usize, y: usize) -> u32 {
        let bpp = self.format.bytes_per_pixel();
        let offset = (y * self.width as usize + x) * bpp;
        match self.format {
            PixelFormat::Gray8 => self.data[offset] as u32,
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                let r = self.data[offset] as u32;
                let g = self.data[offset + 1] as u32;
                let b = self.data[offset + 2] as u32;
                (LUMA_RED_WEIGHT * r + LUMA_GREEN_WEIGHT * g + LUMA_BLUE_WEIGHT * b) >> 8
            }
        }
    }
}

/// 64-bit average hash of a frame
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Number of differing bits
    pub fn hamming(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Hash of a frame, or `None` for a malformed frame
    ///
    /// The frame is area-averaged onto an 8×8 luma grid; bit `row·8 + col`
    /// is set when that cell is brighter than the grid mean. Frames smaller
    /// than 8 px on a side sample the nearest pixel.
    pub fn of(frame: &FrameView<'_>) -> Option<Fingerprint> {
        if !frame.is_well_formed() {
            return None;
        }

        let width = frame.width as usize;
        let height = frame.height as usize;
        let mut cells = [0u32; FINGERPRINT_SIDE * FINGERPRINT_SIDE];

        for row in 0..FINGERPRINT_SIDE {
            let (y0, y1) = cell_span(row, height);
            for col in 0..FINGERPRINT_SIDE {
                let (x0, x1) = cell_span(col, width);

                let mut sum = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += frame.luma(x, y) as u64;
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)) as u64;
                cells[row * FINGERPRINT_SIDE + col] = (sum / count) as u32;
            }
        }

        // Compare against the mean without dividing: cell·64 > total
        let total: u64 = cells.iter().map(|&c| c as u64).sum();
        let n = cells.len() as u64;

        let bits = cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell as u64 * n > total)
            .fold(0u64, |acc, (i, _)| acc | (1u64 << i));

        Some(Fingerprint(bits))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:016x})", self.0)
    }
}

/// Pixel range `[start, end)` covered by grid cell `index` along an axis
fn cell_span(index: usize, extent: usize) -> (usize, usize) {
    let start = index * extent / FINGERPRINT_SIDE;
    let end = (index + 1) * extent / FINGERPRINT_SIDE;
    if end > start {
        (start, end)
    } else {
        let start = start.min(extent - 1);
        (start, start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..height)
            .flat_map(|_| (0..width).map(move |x| (x * 255 / width.max(1)) as u8))
            .collect()
    }

    #[test]
    fn malformed_frames_have_no_fingerprint() {
        let data = vec![0u8; 10];
        assert!(Fingerprint::of(&FrameView::gray(&data, 0, 10)).is_none());
        assert!(Fingerprint::of(&FrameView::gray(&data, 4, 4)).is_none());
        assert!(Fingerprint::of(&FrameView::rgba(&data, 2, 2)).is_none());
        assert!(Fingerprint::of(&FrameView::gray(&data, 10, 1)).is_some());
    }

    #[test]
    fn uniform_frame_hashes_to_zero() {
        let data = vec![128u8; 64 * 64];
        assert_eq!(Fingerprint::of(&FrameView::gray(&data, 64, 64)), Some(Fingerprint(0)));
    }

    #[test]
    fn horizontal_gradient_sets_right_half() {
        let data = gradient(64, 64);
        let fp = Fingerprint::of(&FrameView::gray(&data, 64, 64)).map(|f| f.0);

        // Columns 4..8 of every row are brighter than the mean
        assert_eq!(fp, Some(0xF0F0_F0F0_F0F0_F0F0));
    }

    #[test]
    fn color_and_gray_agree_on_gray_content() {
        let gray = gradient(32, 16);
        let rgb: Vec<u8> = gray.iter().flat_map(|&v| [v, v, v]).collect();

        let a = Fingerprint::of(&FrameView::gray(&gray, 32, 16));
        let b = Fingerprint::of(&FrameView::new(&rgb, 32, 16, PixelFormat::Rgb8));
        assert_eq!(a, b);
    }

    #[test]
    fn small_change_flips_few_bits() {
        let data = gradient(64, 64);
        let mut touched = data.clone();
        for byte in touched.iter_mut().take(8) {
            *byte = byte.saturating_add(3);
        }

        let a = Fingerprint::of(&FrameView::gray(&data, 64, 64));
        let b = Fingerprint::of(&FrameView::gray(&touched, 64, 64));
        match (a, b) {
            (Some(a), Some(b)) => assert!(a.hamming(&b) <= 1),
            _ => panic!("well-formed frames must hash"),
        }
    }

    #[test]
    fn tiny_frames_sample_nearest_pixel() {
        let data = [0u8, 255, 0, 255];
        let fp = Fingerprint::of(&FrameView::gray(&data, 2, 2));
        assert!(fp.is_some());
        assert_ne!(fp, Some(Fingerprint(0)));
    }

    #[test]
    fn hamming_distance() {
        assert_eq!(Fingerprint(0b1011).hamming(&Fingerprint(0b0001)), 2);
        assert_eq!(Fingerprint(u64::MAX).hamming(&Fingerprint(0)), 64);
    }
}
