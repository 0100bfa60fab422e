//! Box geometry shared by fusion, stabilization and confluence
//!
//! Boxes are axis-aligned, in integer image pixels. Overlap is measured with
//! intersection-over-union; spatial grouping snaps box centers to a grid.

use crate::pattern::PatternClass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Point in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Create a point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }
}

/// Axis-aligned bounding box
///
/// `right >= left` and `bottom >= top` hold for boxes built with
/// [`BoundingBox::new`]. Size accessors clamp at zero for boxes built
/// field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Right edge
    pub right: i32,
    /// Bottom edge
    pub bottom: i32,
}

impl BoundingBox {
    /// Create a box, swapping reversed edges
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let (left, right) = if right < left { (right, left) } else { (left, right) };
        let (top, bottom) = if bottom < top { (bottom, top) } else { (top, bottom) };

        Self { left, top, right, bottom }
    }

    /// Create a box from its top-left corner and size
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    /// Width in pixels
    pub fn width(&self) -> i64 {
        (self.right as i64 - self.left as i64).max(0)
    }

    /// Height in pixels
    pub fn height(&self) -> i64 {
        (self.bottom as i64 - self.top as i64).max(0)
    }

    /// Area in square pixels
    ///
    /// Computed in `i128`: a full-range `i32` box does not fit `i64`.
    pub fn area(&self) -> i128 {
        self.width() as i128 * self.height() as i128
    }

    /// Whether the box covers no area
    pub fn is_degenerate(&self) -> bool {
        self.area() == 0
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point {
            x: ((self.left as i64 + self.right as i64) as f32) / 2.0,
            y: ((self.top as i64 + self.bottom as i64) as f32) / 2.0,
        }
    }

    /// Overlapping region, if the boxes intersect
    ///
    /// Boxes that only touch along an edge intersect in a zero-area box.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x1 = self.left.max(other.left);
        let y1 = self.top.max(other.top);
        let x2 = self.right.min(other.right);
        let y2 = self.bottom.min(other.bottom);

        if x2 < x1 || y2 < y1 {
            return None;
        }

        Some(BoundingBox { left: x1, top: y1, right: x2, bottom: y2 })
    }

    /// Intersection-over-union with `other`
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        iou(self, other)
    }

    /// Move the box by `(dx, dy)`
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            right: self.right.saturating_add(dx),
            bottom: self.bottom.saturating_add(dy),
        }
    }
}

/// Intersection-over-union of two boxes
///
/// Disjoint boxes give exactly 0.0, identical non-degenerate boxes exactly
/// 1.0. A zero-area union also gives 0.0.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let intersection = match a.intersection(b) {
        Some(region) => region.area(),
        None => return 0.0,
    };

    let union = a.area() + b.area() - intersection;
    if union <= 0 {
        return 0.0;
    }

    (intersection as f64 / union as f64) as f32
}

/// Snap a point to a square grid, rounding to the nearest cell
///
/// Returns `(column, row)`. A zero grid size is treated as 1 px.
pub fn grid_cell(point: Point, grid_size: u32) -> (i32, i32) {
    let grid = grid_size.max(1) as f32;
    let col = libm::roundf(point.x / grid) as i32;
    let row = libm::roundf(point.y / grid) as i32;
    (col, row)
}

/// Spatial grouping key: class plus grid cell of the box center
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpatialKey {
    /// Pattern class
    pub class: PatternClass,
    /// Grid column of the center
    pub cell_x: i32,
    /// Grid row of the center
    pub cell_y: i32,
}

impl SpatialKey {
    /// Key of a box of `class` on a grid of `grid_size` pixels
    pub fn of(class: &PatternClass, bbox: &BoundingBox, grid_size: u32) -> Self {
        let (cell_x, cell_y) = grid_cell(bbox.center(), grid_size);
        Self {
            class: class.clone(),
            cell_x,
            cell_y,
        }
    }
}
