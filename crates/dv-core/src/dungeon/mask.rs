//! Layout silhouettes
//!
//! A silhouette decides, for each grid cell, whether it lies inside the
//! dungeon outline. Cells outside are flagged [`CellFlags::BLOCKED`] before
//! anything is placed, so every later phase sees them as solid rock.

use super::cell::CellFlags;
use super::grid::Grid;

/// Outline of a dungeon layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Silhouette {
    /// Low-resolution 0/1 bitmap, scaled to the grid by nearest neighbour.
    Bitmap(&'static [&'static [u8]]),
    /// Two crossing diagonal bands.
    Saltire,
    /// Hexagon with flat top and bottom edges.
    Hexagon,
    /// Disc centred on the grid.
    Round,
}

impl Silhouette {
    /// Whether cell `(r, c)` of a `height x width` grid is inside the outline.
    pub fn covers(&self, r: usize, c: usize, height: usize, width: usize) -> bool {
        match *self {
            Silhouette::Bitmap(rows) => {
                let mask_rows = rows.len();
                let Some(first) = rows.first() else {
                    return true;
                };
                let mr = r * mask_rows / height;
                let mc = c * first.len() / width;
                rows.get(mr).and_then(|row| row.get(mc)).is_some_and(|&v| v != 0)
            }
            Silhouette::Saltire => {
                let v = r as f64 / (height - 1).max(1) as f64;
                let u = c as f64 / (width - 1).max(1) as f64;
                (u - v).abs() <= 0.25 || (u + v - 1.0).abs() <= 0.25
            }
            Silhouette::Hexagon => {
                let rc = (height - 1) as f64 / 2.0;
                let cc = (width - 1) as f64 / 2.0;
                let dy = if rc > 0.0 { (r as f64 - rc).abs() / rc } else { 0.0 };
                (c as f64 - cc).abs() <= cc * (1.0 - dy / 2.0)
            }
            Silhouette::Round => {
                let rc = (height - 1) as f64 / 2.0;
                let cc = (width - 1) as f64 / 2.0;
                let dr = r as f64 - rc;
                let dc = c as f64 - cc;
                (dr * dr + dc * dc).sqrt() <= rc.min(cc)
            }
        }
    }

    /// Block every cell outside the outline. Returns the number of cells
    /// blocked.
    pub fn apply(&self, grid: &mut Grid) -> usize {
        let (height, width) = (grid.height(), grid.width());
        let mut blocked = 0;
        for r in 0..height {
            for c in 0..width {
                if !self.covers(r, c, height, width) {
                    grid.insert(r, c, CellFlags::BLOCKED);
                    blocked += 1;
                }
            }
        }
        blocked
    }
}
