//! Corridor tunnelling
//!
//! A randomised depth-first walk over hubs. From each hub the four directions
//! are shuffled, optionally with the incoming heading pushed to the front, and
//! each is tried in turn: the connector and the next hub must both be free of
//! [`CellFlags::BLOCK_CORRIDOR`]. A carved step continues from the new hub;
//! when every direction fails the walk backs up.

use dv_rng::NumberSource;

use super::cell::CellFlags;
use super::grid::{Direction, Grid, hub};
use crate::rng::NumberSourceExt;

/// Direction order for one hub.
fn tunnel_dirs<R: NumberSource + ?Sized>(last: Option<Direction>, straightness: u32, rng: &mut R) -> Vec<Direction> {
    let mut dirs = Direction::ALL.to_vec();
    rng.shuffle(&mut dirs);
    if let Some(last) = last {
        if straightness > 0 && rng.percent(straightness) {
            dirs.insert(0, last);
        }
    }
    dirs
}

/// Hub index one step from `(i, j)`, if still on the grid.
pub(super) fn step(grid: &Grid, i: usize, j: usize, dir: Direction) -> Option<(usize, usize)> {
    let ni = i as isize + dir.di();
    let nj = j as isize + dir.dj();
    if ni < 0 || nj < 0 || ni as usize >= grid.n_i() || nj as usize >= grid.n_j() {
        return None;
    }
    Some((ni as usize, nj as usize))
}

/// Carve from hub `(i, j)` towards `dir` if the way is clear.
fn open_tunnel(grid: &mut Grid, i: usize, j: usize, dir: Direction) -> Option<(usize, usize)> {
    let (ni, nj) = step(grid, i, j, dir)?;
    let (this_r, this_c) = (hub(i), hub(j));
    let (next_r, next_c) = (hub(ni), hub(nj));
    let mid_r = (this_r + next_r) / 2;
    let mid_c = (this_c + next_c) / 2;

    let sound = [(mid_r, mid_c), (next_r, next_c)]
        .iter()
        .all(|&(r, c)| !grid.cell(r, c).intersects(CellFlags::BLOCK_CORRIDOR));
    if !sound {
        return None;
    }

    for (r, c) in [(this_r, this_c), (mid_r, mid_c), (next_r, next_c)] {
        let cell = grid.cell_mut(r, c);
        cell.remove(CellFlags::ENTRANCE);
        cell.insert(CellFlags::CORRIDOR);
    }
    Some((ni, nj))
}

struct Frame {
    i: usize,
    j: usize,
    dirs: Vec<Direction>,
    next: usize,
}

/// Tunnel from one hub until the walk backs all the way out. Returns the
/// number of steps carved.
pub fn tunnel<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    i: usize,
    j: usize,
    straightness: u32,
    rng: &mut R,
) -> usize {
    let mut carved = 0;
    let mut stack = vec![Frame {
        i,
        j,
        dirs: tunnel_dirs(None, straightness, rng),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(&dir) = frame.dirs.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        let (i, j) = (frame.i, frame.j);
        if let Some((ni, nj)) = open_tunnel(grid, i, j, dir) {
            carved += 1;
            stack.push(Frame {
                i: ni,
                j: nj,
                dirs: tunnel_dirs(Some(dir), straightness, rng),
                next: 0,
            });
        }
    }
    carved
}

/// Start a tunnel at every hub that is neither open space nor blocked.
pub(crate) fn carve_corridors<R: NumberSource + ?Sized>(grid: &mut Grid, straightness: u32, rng: &mut R) -> usize {
    let mut carved = 0;
    for i in 0..grid.n_i() {
        for j in 0..grid.n_j() {
            if grid
                .cell(hub(i), hub(j))
                .intersects(CellFlags::OPEN_SPACE | CellFlags::BLOCKED)
            {
                continue;
            }
            carved += tunnel(grid, i, j, straightness, rng);
        }
    }
    carved
}
