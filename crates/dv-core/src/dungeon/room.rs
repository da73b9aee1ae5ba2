//! Room footprints and placement
//!
//! Rooms are rectangles of hubs. A room `h` hubs tall anchored at hub row `i`
//! covers grid rows `2i+1 ..= 2(i+h)-1`, and is ringed by a one-cell
//! perimeter that only a door can break.

use std::collections::{BTreeMap, BTreeSet};

use dv_rng::NumberSource;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::cell::CellFlags;
use super::door::Door;
use super::grid::{Direction, Grid, hub};
use crate::config::{RoomDims, RoomSize};
use crate::consts::MAX_ROOMS;

/// A placed room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// 1-based, in placement order
    pub id: u16,
    /// Top-left hub
    pub i: usize,
    pub j: usize,
    /// Size in hubs
    pub width: usize,
    pub height: usize,
    /// Edge coordinates in grid cells, inclusive
    pub north: usize,
    pub south: usize,
    pub west: usize,
    pub east: usize,
    /// Doors by the edge they sit on
    pub doors: BTreeMap<Direction, Vec<Door>>,
}

impl Room {
    pub fn new(id: u16, i: usize, j: usize, width: usize, height: usize) -> Self {
        Self {
            id,
            i,
            j,
            width,
            height,
            north: hub(i),
            south: hub(i + height - 1),
            west: hub(j),
            east: hub(j + width - 1),
            doors: BTreeMap::new(),
        }
    }

    /// Whether grid cell `(r, c)` lies inside the footprint.
    pub fn contains(&self, r: usize, c: usize) -> bool {
        (self.north..=self.south).contains(&r) && (self.west..=self.east).contains(&c)
    }

    pub fn door_count(&self) -> usize {
        self.doors.values().map(Vec::len).sum()
    }
}

/// A partially specified room; unset fields are drawn at placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomProto {
    pub i: Option<usize>,
    pub j: Option<usize>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    /// Size class override, for the secondary batch of huge layouts
    pub dims: Option<RoomDims>,
}

impl RoomProto {
    /// Anchored at hub `(i, j)`, size drawn.
    pub fn at(i: usize, j: usize) -> Self {
        Self {
            i: Some(i),
            j: Some(j),
            ..Self::default()
        }
    }

    /// Fully specified footprint.
    pub fn exact(i: usize, j: usize, width: usize, height: usize) -> Self {
        Self {
            i: Some(i),
            j: Some(j),
            width: Some(width),
            height: Some(height),
            dims: None,
        }
    }

    pub fn with_dims(dims: RoomDims) -> Self {
        Self {
            dims: Some(dims),
            ..Self::default()
        }
    }
}

/// One side of a room: drawn size, then drawn position if unanchored.
fn draw_extent<R: NumberSource + ?Sized>(
    fixed: Option<usize>,
    anchor: Option<usize>,
    hubs: usize,
    dims: RoomDims,
    rng: &mut R,
) -> usize {
    if let Some(extent) = fixed {
        return extent;
    }
    let radix = match anchor {
        Some(at) => hubs.saturating_sub(dims.base).saturating_sub(at).min(dims.radix),
        None => dims.radix,
    };
    rng.next(radix as u32) as usize + dims.base
}

/// Fill in a prototype's missing fields. Draw order is height, width, row,
/// column.
fn resolve<R: NumberSource + ?Sized>(
    proto: RoomProto,
    dims: RoomDims,
    n_i: usize,
    n_j: usize,
    rng: &mut R,
) -> (usize, usize, usize, usize) {
    let dims = proto.dims.unwrap_or(dims);
    let height = draw_extent(proto.height, proto.i, n_i, dims, rng);
    let width = draw_extent(proto.width, proto.j, n_j, dims, rng);
    let i = proto
        .i
        .unwrap_or_else(|| rng.next(n_i.saturating_sub(height) as u32) as usize);
    let j = proto
        .j
        .unwrap_or_else(|| rng.next(n_j.saturating_sub(width) as u32) as usize);
    (i, j, width, height)
}

/// Room ids a footprint overlaps, or `None` if it touches a blocked cell.
fn sound_room(grid: &Grid, r1: usize, c1: usize, r2: usize, c2: usize) -> Option<BTreeSet<u16>> {
    let mut hits = BTreeSet::new();
    for r in r1..=r2 {
        for c in c1..=c2 {
            let cell = grid.cell(r, c);
            if cell.contains(CellFlags::BLOCKED) {
                return None;
            }
            if cell.contains(CellFlags::ROOM) {
                hits.insert(cell.room_id());
            }
        }
    }
    Some(hits)
}

/// Try to place one room. Returns the new room's id, or `None` when the
/// footprint is rejected or the room cap is reached.
pub(crate) fn emplace_room<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    rooms: &mut Vec<Room>,
    proto: RoomProto,
    dims: RoomDims,
    rng: &mut R,
) -> Option<u16> {
    if rooms.len() >= MAX_ROOMS as usize {
        return None;
    }
    let (i, j, width, height) = resolve(proto, dims, grid.n_i(), grid.n_j(), rng);
    if width == 0 || height == 0 {
        return None;
    }

    let (r1, c1) = (hub(i), hub(j));
    let (r2, c2) = (hub(i + height - 1), hub(j + width - 1));
    if r2 + 1 > grid.n_rows() || c2 + 1 > grid.n_cols() {
        trace!(i, j, width, height, "room rejected: out of bounds");
        return None;
    }

    let Some(hits) = sound_room(grid, r1, c1, r2, c2) else {
        trace!(i, j, width, height, "room rejected: blocked");
        return None;
    };
    if hits.len() > 1 {
        trace!(i, j, width, height, ?hits, "room rejected: straddles rooms");
        return None;
    }

    let id = rooms.len() as u16 + 1;
    for r in r1..=r2 {
        for c in c1..=c2 {
            let cell = grid.cell_mut(r, c);
            if cell.contains(CellFlags::ENTRANCE) {
                cell.remove(CellFlags::ENTRANCE | CellFlags::DOOR_SPACE);
                cell.clear_label();
            } else if cell.contains(CellFlags::PERIMETER) {
                cell.remove(CellFlags::PERIMETER);
            }
            cell.insert(CellFlags::ROOM);
            cell.set_room_id(id);
        }
    }

    for r in r1 - 1..=r2 + 1 {
        for c in [c1 - 1, c2 + 1] {
            stamp_perimeter(grid, r, c);
        }
    }
    for c in c1 - 1..=c2 + 1 {
        for r in [r1 - 1, r2 + 1] {
            stamp_perimeter(grid, r, c);
        }
    }

    rooms.push(Room::new(id, i, j, width, height));
    Some(id)
}

fn stamp_perimeter(grid: &mut Grid, r: usize, c: usize) {
    let cell = grid.cell_mut(r, c);
    if !cell.intersects(CellFlags::ROOM | CellFlags::ENTRANCE) {
        cell.insert(CellFlags::PERIMETER);
    }
}

/// Try a room at every free hub in raster order. Hubs on the top row or left
/// column are skipped half the time.
pub(crate) fn dense_rooms<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    rooms: &mut Vec<Room>,
    dims: RoomDims,
    rng: &mut R,
) -> usize {
    let before = rooms.len();
    for i in 0..grid.n_i() {
        for j in 0..grid.n_j() {
            if grid.cell(hub(i), hub(j)).contains(CellFlags::ROOM) {
                continue;
            }
            if (i == 0 || j == 0) && rng.next(2) == 1 {
                continue;
            }
            emplace_room(grid, rooms, RoomProto::at(i, j), dims, rng);
        }
    }
    rooms.len() - before
}

/// Placement attempts for a scattered layout.
///
/// The divisor is `(base + radix + 1) XOR 2`, not a square; changing it would
/// change every scattered dungeon.
pub fn scatter_target(n_rows: usize, n_cols: usize, dims: RoomDims, sparse: bool) -> usize {
    let area = n_rows * n_cols;
    let divisor = (dims.base + dims.radix + 1) ^ 2;
    let target = area / divisor * 2;
    if sparse { target / 2 } else { target }
}

/// Random-position placement, plus a batch of medium rooms for huge classes.
pub(crate) fn scatter_rooms<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    rooms: &mut Vec<Room>,
    dims: RoomDims,
    sparse: bool,
    rng: &mut R,
) -> usize {
    let before = rooms.len();
    let target = scatter_target(grid.n_rows(), grid.n_cols(), dims, sparse);
    for _ in 0..target {
        emplace_room(grid, rooms, RoomProto::default(), dims, rng);
    }
    if dims.huge {
        let medium = RoomSize::Medium.dims();
        let target = scatter_target(grid.n_rows(), grid.n_cols(), medium, sparse);
        for _ in 0..target {
            emplace_room(grid, rooms, RoomProto::with_dims(medium), dims, rng);
        }
    }
    rooms.len() - before
}

/// Stamp each room's decimal id across the middle of its centre row.
pub(crate) fn label_rooms(grid: &mut Grid, rooms: &[Room]) {
    for room in rooms {
        let label = room.id.to_string();
        let row = (room.north + room.south) / 2;
        let start = (room.west + room.east) as isize - label.len() as isize;
        let col = start.div_euclid(2) + 1;
        for (k, ch) in label.bytes().enumerate() {
            let c = col + k as isize;
            if c < 0 {
                continue;
            }
            if let Some(cell) = grid.get_mut(row, c as usize) {
                cell.set_label(ch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dv_rng::Isaac64;

    fn medium() -> RoomDims {
        RoomSize::Medium.dims()
    }

    #[test]
    fn test_room_edges() {
        let room = Room::new(1, 0, 2, 3, 2);
        assert_eq!((room.north, room.south), (1, 3));
        assert_eq!((room.west, room.east), (5, 9));
        assert!(room.contains(2, 5));
        assert!(!room.contains(4, 5));
    }

    #[test]
    fn test_emplace_stamps_room_and_perimeter() {
        let mut grid = Grid::new(6, 6);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::from_bytes(b"room");
        let id = emplace_room(&mut grid, &mut rooms, RoomProto::exact(1, 1, 2, 2), medium(), &mut rng);
        assert_eq!(id, Some(1));
        for r in 3..=5 {
            for c in 3..=5 {
                let cell = grid.at(r, c);
                assert!(cell.contains(CellFlags::ROOM));
                assert_eq!(cell.room_id(), 1);
            }
        }
        for c in 2..=6 {
            assert!(grid.at(2, c).contains(CellFlags::PERIMETER));
            assert!(grid.at(6, c).contains(CellFlags::PERIMETER));
        }
        assert!(grid.at(4, 2).contains(CellFlags::PERIMETER));
        assert!(!grid.at(4, 4).contains(CellFlags::PERIMETER));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_rejects_border_and_blocked() {
        let mut grid = Grid::new(4, 4);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::default();
        assert_eq!(
            emplace_room(&mut grid, &mut rooms, RoomProto::exact(2, 0, 2, 3), medium(), &mut rng),
            None
        );
        grid.insert(3, 3, CellFlags::BLOCKED);
        assert_eq!(
            emplace_room(&mut grid, &mut rooms, RoomProto::exact(0, 0, 2, 2), medium(), &mut rng),
            None
        );
        assert!(rooms.is_empty());
    }

    #[test]
    fn test_anchored_radix_clamped() {
        let mut grid = Grid::new(5, 5);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::from_bytes(b"clamp");
        // Three hubs from the edge with base 2: the radix clamps to 1, so
        // the size is always exactly 2.
        for _ in 0..10 {
            let (_, _, w, h) = resolve(RoomProto::at(3, 3), medium(), 5, 5, &mut rng);
            assert_eq!((w, h), (2, 2));
        }
        let id = emplace_room(&mut grid, &mut rooms, RoomProto::at(3, 3), medium(), &mut rng);
        assert_eq!(id, Some(1));
    }

    #[test]
    fn test_scatter_target_uses_xor() {
        let dims = medium();
        // (2 + 5 + 1) ^ 2 = 10
        assert_eq!(scatter_target(20, 20, dims, false), 400 / 10 * 2);
        assert_eq!(scatter_target(20, 20, dims, true), 40);
        let small = RoomSize::Small.dims();
        // (2 + 2 + 1) ^ 2 = 7
        assert_eq!(scatter_target(14, 14, small, false), 196 / 7 * 2);
    }

    #[test]
    fn test_label_rooms_centres_id() {
        let mut grid = Grid::new(8, 8);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::default();
        emplace_room(&mut grid, &mut rooms, RoomProto::exact(0, 0, 3, 3), medium(), &mut rng);
        label_rooms(&mut grid, &rooms);
        // Rows 1..=5, cols 1..=5: centre row 3, start column (6 - 1) / 2 + 1.
        assert_eq!(grid.at(3, 3).label(), Some(b'1'));
        assert!(grid.at(3, 3).contains(CellFlags::ROOM));
        assert_eq!(grid.at(3, 4).label(), None);
    }

    #[test]
    fn test_dense_fills_grid() {
        let mut grid = Grid::new(11, 14);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::from_bytes(b"dense");
        let placed = dense_rooms(&mut grid, &mut rooms, medium(), &mut rng);
        assert!(placed > 0);
        assert_eq!(placed, rooms.len());
        for (idx, room) in rooms.iter().enumerate() {
            assert_eq!(room.id as usize, idx + 1);
        }
    }
}
