//! Stair placement
//!
//! Stairs go on corridor dead ends that have a straight run of corridor
//! behind them, so stepping off a stair always leads somewhere.

use dv_rng::NumberSource;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use super::cell::CellFlags;
use super::deadend::Pattern;
use super::grid::{Direction, Grid, Offset, off};
use crate::config::Stairs;
use crate::consts::AREA_PER_EXTRA_STAIR;
use crate::rng::NumberSourceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StairKind {
    Down,
    Up,
}

impl StairKind {
    pub const fn flag(self) -> CellFlags {
        match self {
            StairKind::Down => CellFlags::STAIR_DOWN,
            StairKind::Up => CellFlags::STAIR_UP,
        }
    }

    pub const fn label(self) -> u8 {
        match self {
            StairKind::Down => b'd',
            StairKind::Up => b'u',
        }
    }

    pub const fn glyph(self) -> char {
        match self {
            StairKind::Down => '>',
            StairKind::Up => '<',
        }
    }
}

/// A placed stair and the cell one steps off onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stair {
    pub row: usize,
    pub col: usize,
    pub next_row: usize,
    pub next_col: usize,
    pub kind: StairKind,
}

/// Dead end facing `dir`, with the corridor running the other way.
const STAIR_ENDS: [(Direction, Pattern, Offset); 4] = [
    (
        Direction::North,
        Pattern {
            walled: &[off(1, -1), off(0, -1), off(-1, -1), off(-1, 0), off(-1, 1), off(0, 1), off(1, 1)],
            corridor: &[off(0, 0), off(1, 0), off(2, 0)],
        },
        off(1, 0),
    ),
    (
        Direction::South,
        Pattern {
            walled: &[off(-1, -1), off(0, -1), off(1, -1), off(1, 0), off(1, 1), off(0, 1), off(-1, 1)],
            corridor: &[off(0, 0), off(-1, 0), off(-2, 0)],
        },
        off(-1, 0),
    ),
    (
        Direction::West,
        Pattern {
            walled: &[off(-1, 1), off(-1, 0), off(-1, -1), off(0, -1), off(1, -1), off(1, 0), off(1, 1)],
            corridor: &[off(0, 0), off(0, 1), off(0, 2)],
        },
        off(0, 1),
    ),
    (
        Direction::East,
        Pattern {
            walled: &[off(-1, -1), off(-1, 0), off(-1, 1), off(0, 1), off(1, 1), off(1, 0), off(1, -1)],
            corridor: &[off(0, 0), off(0, -1), off(0, -2)],
        },
        off(0, -1),
    ),
];

/// Number of stairs a configuration asks for. `Many` draws once.
pub fn stair_count<R: NumberSource + ?Sized>(stairs: Stairs, grid: &Grid, rng: &mut R) -> usize {
    match stairs {
        Stairs::No => 0,
        Stairs::Yes => 2,
        Stairs::Many => {
            let area = (grid.n_rows() * grid.n_cols()) as u32;
            3 + rng.next(area / AREA_PER_EXTRA_STAIR) as usize
        }
    }
}

/// Every hub that qualifies as a stair site, in raster order.
pub fn stair_ends(grid: &Grid) -> Vec<Stair> {
    let mut list = Vec::new();
    for (r, c) in grid.hubs() {
        if !grid.cell(r, c).is_bare_corridor() {
            continue;
        }
        let found = STAIR_ENDS
            .iter()
            .find(|(_, pattern, _)| pattern.matches(grid, r, c));
        if let Some(&(_, _, next)) = found {
            let (next_row, next_col) = ((r as isize + next.dr) as usize, (c as isize + next.dc) as usize);
            list.push(Stair {
                row: r,
                col: c,
                next_row,
                next_col,
                // Overwritten on placement.
                kind: StairKind::Down,
            });
        }
    }
    list
}

/// Place `count` stairs on random dead ends. The first is down, the second
/// up, the rest drawn.
pub(crate) fn place_stairs<R: NumberSource + ?Sized>(grid: &mut Grid, count: usize, rng: &mut R) -> Vec<Stair> {
    let mut candidates = stair_ends(grid);
    let mut placed = Vec::with_capacity(count);
    for n in 0..count {
        if candidates.is_empty() {
            break;
        }
        let idx = rng.pick_index(candidates.len());
        let mut stair = candidates.remove(idx);
        stair.kind = match n {
            0 => StairKind::Down,
            1 => StairKind::Up,
            _ if rng.next(2) == 0 => StairKind::Down,
            _ => StairKind::Up,
        };
        let cell = grid.cell_mut(stair.row, stair.col);
        cell.insert(stair.kind.flag());
        cell.set_label(stair.kind.label());
        placed.push(stair);
    }
    placed
}
