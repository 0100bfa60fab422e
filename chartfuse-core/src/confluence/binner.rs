//! Grid clustering of session matches

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::geometry::{grid_cell, Point};

use super::zone::CalibratedMatch;

/// Grid cell of a match center, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    /// `round(cy / grid)`
    pub row: i32,
    /// `round(cx / grid)`
    pub col: i32,
}

/// Buckets match centers on a square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialBinner {
    grid_size: u32,
}

impl SpatialBinner {
    /// Binner on a grid of `grid_size` pixels (0 is treated as 1)
    pub fn new(grid_size: u32) -> Self {
        Self {
            grid_size: grid_size.max(1),
        }
    }

    /// Grid size in pixels
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Cell holding the center of `m`
    pub fn cell_of(&self, m: &CalibratedMatch) -> GridCell {
        let (col, row) = grid_cell(m.center(), self.grid_size);
        GridCell { row, col }
    }

    /// Group matches by cell, keeping cells with two or more members
    ///
    /// Clusters come out in row, then column order.
    pub fn cluster(&self, matches: &[CalibratedMatch]) -> Vec<Vec<CalibratedMatch>> {
        let mut cells: BTreeMap<GridCell, Vec<CalibratedMatch>> = BTreeMap::new();
        for m in matches {
            cells.entry(self.cell_of(m)).or_default().push(m.clone());
        }

        cells.into_values().filter(|members| members.len() >= 2).collect()
    }

    /// Matches whose centers lie within `radius` of the target's center
    ///
    /// The target itself (same id) is excluded.
    pub fn find_nearby<'a>(
        target: &CalibratedMatch,
        all: &'a [CalibratedMatch],
        radius: f32,
    ) -> Vec<&'a CalibratedMatch> {
        let center = target.center();
        all.iter()
            .filter(|m| m.id != target.id)
            .filter(|m| m.center().distance(&center) <= radius)
            .collect()
    }

    /// Mean of the member centers, `None` when empty
    pub fn centroid(matches: &[CalibratedMatch]) -> Option<Point> {
        if matches.is_empty() {
            return None;
        }

        let (sx, sy) = matches.iter().fold((0.0f64, 0.0f64), |(sx, sy), m| {
            let c = m.center();
            (sx + c.x as f64, sy + c.y as f64)
        });
        let n = matches.len() as f64;

        Some(Point::new((sx / n) as f32, (sy / n) as f32))
    }
}
