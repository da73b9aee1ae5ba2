//! Cell grid with hub/connector addressing
//!
//! A grid built for `n_i x n_j` hubs is `(2*n_i + 1) x (2*n_j + 1)` cells.
//! Odd coordinates are hubs that can hold rooms or corridor junctions; even
//! coordinates are connectors between hubs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::cell::{Cell, CellFlags};

/// Cardinal direction, in grid terms (north is row - 1).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row delta
    pub const fn di(self) -> isize {
        match self {
            Direction::North => -1,
            Direction::South => 1,
            Direction::East | Direction::West => 0,
        }
    }

    /// Column delta
    pub const fn dj(self) -> isize {
        match self {
            Direction::West => -1,
            Direction::East => 1,
            Direction::North | Direction::South => 0,
        }
    }

    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

/// Relative cell position, row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub dr: isize,
    pub dc: isize,
}

/// Shorthand for building offset tables.
pub const fn off(dr: isize, dc: isize) -> Offset {
    Offset { dr, dc }
}

/// Grid coordinate of hub index `i`.
#[inline]
pub const fn hub(i: usize) -> usize {
    i * 2 + 1
}

/// The mutable cell array a build works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    n_i: usize,
    n_j: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Allocate an empty grid for `n_i` hub rows and `n_j` hub columns.
    pub fn new(n_i: usize, n_j: usize) -> Self {
        let cells = vec![Cell::EMPTY; (2 * n_i + 1) * (2 * n_j + 1)];
        Self { n_i, n_j, cells }
    }

    pub fn n_i(&self) -> usize {
        self.n_i
    }

    pub fn n_j(&self) -> usize {
        self.n_j
    }

    /// Largest row index (`2 * n_i`).
    pub fn n_rows(&self) -> usize {
        2 * self.n_i
    }

    /// Largest column index (`2 * n_j`).
    pub fn n_cols(&self) -> usize {
        2 * self.n_j
    }

    /// Number of rows of cells.
    pub fn height(&self) -> usize {
        self.n_rows() + 1
    }

    /// Number of columns of cells.
    pub fn width(&self) -> usize {
        self.n_cols() + 1
    }

    fn index(&self, r: usize, c: usize) -> Option<usize> {
        (r < self.height() && c < self.width()).then(|| r * self.width() + c)
    }

    pub fn get(&self, r: usize, c: usize) -> Option<Cell> {
        self.index(r, c).map(|idx| self.cells[idx])
    }

    pub fn get_mut(&mut self, r: usize, c: usize) -> Option<&mut Cell> {
        self.index(r, c).map(move |idx| &mut self.cells[idx])
    }

    /// Cell at a signed position; anything off the grid reads as empty.
    pub fn at(&self, r: isize, c: isize) -> Cell {
        if r < 0 || c < 0 {
            return Cell::EMPTY;
        }
        self.get(r as usize, c as usize).unwrap_or(Cell::EMPTY)
    }

    /// Cell at `(r, c)` shifted by `o`.
    pub fn at_offset(&self, r: usize, c: usize, o: Offset) -> Cell {
        self.at(r as isize + o.dr, c as isize + o.dc)
    }

    /// In-bounds position of `(r, c)` shifted by `o`.
    pub fn shifted(&self, r: usize, c: usize, o: Offset) -> Option<(usize, usize)> {
        let nr = r as isize + o.dr;
        let nc = c as isize + o.dc;
        if nr < 0 || nc < 0 {
            return None;
        }
        let (nr, nc) = (nr as usize, nc as usize);
        self.index(nr, nc).map(|_| (nr, nc))
    }

    /// Mutable cell for a position the caller has already bounds-checked.
    pub(crate) fn cell_mut(&mut self, r: usize, c: usize) -> &mut Cell {
        let w = self.width();
        &mut self.cells[r * w + c]
    }

    /// Cell for a position the caller has already bounds-checked.
    pub(crate) fn cell(&self, r: usize, c: usize) -> Cell {
        self.cells[r * self.width() + c]
    }

    pub fn insert(&mut self, r: usize, c: usize, flags: CellFlags) {
        self.cell_mut(r, c).insert(flags);
    }

    pub fn remove(&mut self, r: usize, c: usize, flags: CellFlags) {
        self.cell_mut(r, c).remove(flags);
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width())
    }

    /// Every cell with its `(row, col)`.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Cell)> + '_ {
        let w = self.width();
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, &cell)| ((idx / w, idx % w), cell))
    }

    /// Hub positions in raster order.
    pub fn hubs(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let n_j = self.n_j;
        (0..self.n_i).flat_map(move |i| (0..n_j).map(move |j| (hub(i), hub(j))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let grid = Grid::new(11, 14);
        assert_eq!(grid.height(), 23);
        assert_eq!(grid.width(), 29);
        assert_eq!(grid.n_rows(), 22);
        assert_eq!(grid.n_cols(), 28);
        assert_eq!(grid.rows().count(), 23);
    }

    #[test]
    fn test_out_of_bounds_reads_empty() {
        let mut grid = Grid::new(2, 2);
        grid.insert(0, 0, CellFlags::BLOCKED);
        assert_eq!(grid.at(-1, 0), Cell::EMPTY);
        assert_eq!(grid.at(0, 5), Cell::EMPTY);
        assert!(grid.at(0, 0).contains(CellFlags::BLOCKED));
        assert!(grid.get(5, 0).is_none());
        assert_eq!(grid.shifted(0, 0, off(-1, 0)), None);
        assert_eq!(grid.shifted(1, 1, off(1, 2)), Some((2, 3)));
    }

    #[test]
    fn test_hubs_are_odd() {
        let grid = Grid::new(3, 4);
        let hubs: Vec<_> = grid.hubs().collect();
        assert_eq!(hubs.len(), 12);
        assert_eq!(hubs[0], (1, 1));
        assert_eq!(hubs[11], (5, 7));
        assert!(hubs.iter().all(|&(r, c)| r % 2 == 1 && c % 2 == 1));
    }

    #[test]
    fn test_direction_deltas() {
        for dir in Direction::ALL {
            assert_eq!(dir.di(), -dir.opposite().di());
            assert_eq!(dir.dj(), -dir.opposite().dj());
            assert_eq!((dir.di().abs() + dir.dj().abs()), 1);
        }
        assert_eq!(Direction::North.to_string(), "north");
    }
}
