//! Open-space regions
//!
//! Tunnels never cross a room perimeter, so carving can leave open space in
//! several pieces: maze pockets sealed off by the outline and room walls, or
//! rooms no tunnel reached. [`connect_regions`] keeps the largest piece and
//! fills corridor-only pieces back in. Every piece holding room floor is then
//! joined to the rest along the shortest hub-to-hub path, breaking a room
//! wall as a new doorway wherever the path crosses one.

use std::cmp::Reverse;
use std::collections::{BTreeSet, VecDeque};

use dv_rng::NumberSource;
use tracing::trace;

use super::cell::CellFlags;
use super::corridor::step;
use super::door::{Door, DoorKind};
use super::grid::{Direction, Grid, hub, off};
use super::room::Room;
use crate::config::DoorTable;

/// 4-connected pieces of open space, numbered in raster order of their first
/// cell
#[derive(Debug, Clone)]
pub struct Regions {
    width: usize,
    ids: Vec<Option<usize>>,
    sizes: Vec<usize>,
    firsts: Vec<(usize, usize)>,
    with_rooms: Vec<bool>,
}

impl Regions {
    pub fn scan(grid: &Grid) -> Self {
        let width = grid.width();
        let mut ids = vec![None; grid.height() * width];
        let mut sizes = Vec::new();
        let mut firsts = Vec::new();
        let mut with_rooms = Vec::new();

        for ((r, c), cell) in grid.iter() {
            if !cell.is_open() || ids[r * width + c].is_some() {
                continue;
            }
            let id = sizes.len();
            ids[r * width + c] = Some(id);
            let mut queue = VecDeque::from([(r, c)]);
            let mut size = 0;
            let mut room = false;
            while let Some((qr, qc)) = queue.pop_front() {
                size += 1;
                room |= grid.cell(qr, qc).contains(CellFlags::ROOM);
                for dir in Direction::ALL {
                    let Some((nr, nc)) = grid.shifted(qr, qc, off(dir.di(), dir.dj())) else {
                        continue;
                    };
                    let slot = &mut ids[nr * width + nc];
                    if slot.is_none() && grid.cell(nr, nc).is_open() {
                        *slot = Some(id);
                        queue.push_back((nr, nc));
                    }
                }
            }
            sizes.push(size);
            firsts.push((r, c));
            with_rooms.push(room);
        }

        Self {
            width,
            ids,
            sizes,
            firsts,
            with_rooms,
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Region of cell `(r, c)`, `None` for solid cells.
    pub fn region(&self, r: usize, c: usize) -> Option<usize> {
        self.ids.get(r * self.width + c).copied().flatten()
    }

    /// Cells in region `id`.
    pub fn size(&self, id: usize) -> usize {
        self.sizes.get(id).copied().unwrap_or(0)
    }

    /// Whether region `id` holds any room floor.
    pub fn has_room(&self, id: usize) -> bool {
        self.with_rooms.get(id).copied().unwrap_or(false)
    }

    /// Largest region; the earliest wins a tie.
    pub fn largest(&self) -> Option<usize> {
        (0..self.len()).max_by_key(|&id| (self.sizes[id], Reverse(id)))
    }
}

/// Outcome of [`connect_regions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionReport {
    /// Corridor cells filled back in
    pub filled: usize,
    /// Regions joined to the main one
    pub joined: usize,
    /// Room walls broken along joining paths
    pub doorways: usize,
    /// Regions no path could reach
    pub stranded: usize,
}

/// Merge open space into a single region where the outline allows it.
pub(crate) fn connect_regions<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    rooms: &mut [Room],
    connections: &mut BTreeSet<(u16, u16)>,
    table: DoorTable,
    rng: &mut R,
) -> RegionReport {
    let mut report = RegionReport::default();
    let regions = Regions::scan(grid);
    let Some(main) = regions.largest() else {
        return report;
    };

    let pockets: Vec<(usize, usize)> = grid
        .iter()
        .filter(|&((r, c), _)| {
            regions
                .region(r, c)
                .is_some_and(|id| id != main && !regions.has_room(id))
        })
        .map(|(pos, _)| pos)
        .collect();
    for &(r, c) in &pockets {
        grid.remove(r, c, CellFlags::CORRIDOR);
    }
    report.filled = pockets.len();

    // Keyed by first cell: a region that cannot reach the main one is never
    // touched by a later join, so its first cell stays put.
    let mut stranded = BTreeSet::new();
    loop {
        let regions = Regions::scan(grid);
        let Some(main) = regions.largest() else {
            break;
        };
        let next = (0..regions.len()).find(|&id| id != main && !stranded.contains(&regions.firsts[id]));
        let Some(from) = next else {
            break;
        };
        match shortest_path(grid, &regions, from, main, connections) {
            Some(path) => {
                report.doorways += carve_path(grid, rooms, &path, connections, table, rng);
                report.joined += 1;
            }
            None => {
                trace!(first = ?regions.firsts[from], "region cannot reach the rest");
                stranded.insert(regions.firsts[from]);
                report.stranded += 1;
            }
        }
    }
    report
}

fn room_pair(a: u16, b: u16) -> (u16, u16) {
    (a.min(b), a.max(b))
}

/// Whether a joining path may step from hub `(i, j)` towards `dir`. The next
/// hub is in bounds.
fn crossable(grid: &Grid, i: usize, j: usize, dir: Direction, connections: &BTreeSet<(u16, u16)>) -> bool {
    let (r, c) = (hub(i) as isize, hub(j) as isize);
    let here = grid.at(r, c);
    let wall = grid.at(r + dir.di(), c + dir.dj());
    let there = grid.at(r + 2 * dir.di(), c + 2 * dir.dj());
    if wall.contains(CellFlags::BLOCKED) || there.contains(CellFlags::BLOCKED) {
        return false;
    }
    if !wall.contains(CellFlags::PERIMETER) || wall.intersects(CellFlags::DOOR_SPACE) {
        return true;
    }
    // A room wall is only broken once per room pair.
    match (here.contains(CellFlags::ROOM), there.contains(CellFlags::ROOM)) {
        (true, true) => {
            let pair = room_pair(here.room_id(), there.room_id());
            pair.0 != pair.1 && !connections.contains(&pair)
        }
        (false, false) => false,
        _ => true,
    }
}

/// Shortest hub path from region `from` to region `to`. Each step is the hub
/// reached and the heading taken to reach it.
fn shortest_path(
    grid: &Grid,
    regions: &Regions,
    from: usize,
    to: usize,
    connections: &BTreeSet<(u16, u16)>,
) -> Option<Vec<((usize, usize), Direction)>> {
    let n_j = grid.n_j();
    let hubs = grid.n_i() * n_j;
    let mut came: Vec<Option<(usize, Direction)>> = vec![None; hubs];
    let mut seen = vec![false; hubs];
    let mut queue = VecDeque::new();
    for i in 0..grid.n_i() {
        for j in 0..n_j {
            if regions.region(hub(i), hub(j)) == Some(from) {
                seen[i * n_j + j] = true;
                queue.push_back((i, j));
            }
        }
    }

    while let Some((i, j)) = queue.pop_front() {
        if regions.region(hub(i), hub(j)) == Some(to) {
            let mut path = Vec::new();
            let mut at = i * n_j + j;
            while let Some((prev, dir)) = came[at] {
                path.push(((at / n_j, at % n_j), dir));
                at = prev;
            }
            path.reverse();
            return Some(path);
        }
        for dir in Direction::ALL {
            let Some((ni, nj)) = step(grid, i, j, dir) else {
                continue;
            };
            let idx = ni * n_j + nj;
            if seen[idx] || !crossable(grid, i, j, dir, connections) {
                continue;
            }
            seen[idx] = true;
            came[idx] = Some((i * n_j + j, dir));
            queue.push_back((ni, nj));
        }
    }
    None
}

/// Carve a joining path. Returns the number of doorways opened.
fn carve_path<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    rooms: &mut [Room],
    path: &[((usize, usize), Direction)],
    connections: &mut BTreeSet<(u16, u16)>,
    table: DoorTable,
    rng: &mut R,
) -> usize {
    let mut doorways = 0;
    for &((ni, nj), dir) in path {
        let (nr, nc) = (hub(ni), hub(nj));
        let (mr, mc) = ((nr as isize - dir.di()) as usize, (nc as isize - dir.dj()) as usize);
        let (r, c) = ((mr as isize - dir.di()) as usize, (mc as isize - dir.dj()) as usize);

        let wall = grid.cell(mr, mc);
        if wall.contains(CellFlags::PERIMETER) && !wall.intersects(CellFlags::DOOR_SPACE) {
            let kind = table.pick(rng.next(table.roll));
            open_doorway(grid, rooms, connections, (mr, mc), dir, kind);
            doorways += 1;
        }
        for (r, c) in [(r, c), (mr, mc), (nr, nc)] {
            let cell = grid.cell_mut(r, c);
            if !cell.contains(CellFlags::ROOM) {
                cell.remove(CellFlags::ENTRANCE);
                cell.insert(CellFlags::CORRIDOR);
            }
        }
    }
    doorways
}

/// Break the room wall at `(r, c)`, crossed heading `dir`, and record the
/// door on the room whose edge it sits on.
fn open_doorway(
    grid: &mut Grid,
    rooms: &mut [Room],
    connections: &mut BTreeSet<(u16, u16)>,
    (r, c): (usize, usize),
    dir: Direction,
    kind: DoorKind,
) {
    let here = grid.at(r as isize - dir.di(), c as isize - dir.dj());
    let there = grid.at(r as isize + dir.di(), c as isize + dir.dj());
    let cell = grid.cell_mut(r, c);
    cell.remove(CellFlags::PERIMETER);
    cell.insert(CellFlags::ENTRANCE | kind.flag());
    if let Some(ch) = kind.label() {
        cell.set_label(ch);
    }

    let (owner, edge, out_id) = match (here.contains(CellFlags::ROOM), there.contains(CellFlags::ROOM)) {
        (true, true) => {
            connections.insert(room_pair(here.room_id(), there.room_id()));
            (here.room_id(), dir, Some(there.room_id()))
        }
        (true, false) => (here.room_id(), dir, None),
        _ => (there.room_id(), dir.opposite(), None),
    };
    let Some(room) = owner.checked_sub(1).and_then(|k| rooms.get_mut(k as usize)) else {
        return;
    };
    room.doors.entry(edge).or_default().push(Door {
        row: r,
        col: c,
        kind,
        room_id: owner,
        out_id,
    });
    trace!(row = r, col = c, room = owner, "doorway opened on joining path");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoorSet, RoomSize};
    use crate::dungeon::room::{RoomProto, emplace_room};
    use dv_rng::Isaac64;

    fn carve_row(grid: &mut Grid, r: usize, cols: std::ops::RangeInclusive<usize>) {
        for c in cols {
            grid.insert(r, c, CellFlags::CORRIDOR);
        }
    }

    fn place(grid: &mut Grid, rooms: &mut Vec<Room>, proto: RoomProto) {
        let mut rng = Isaac64::default();
        emplace_room(grid, rooms, proto, RoomSize::Medium.dims(), &mut rng);
    }

    #[test]
    fn test_scan_counts_pieces() {
        let mut grid = Grid::new(5, 5);
        carve_row(&mut grid, 1, 1..=9);
        carve_row(&mut grid, 9, 1..=3);
        let regions = Regions::scan(&grid);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions.largest(), Some(0));
        assert_eq!(regions.size(1), 3);
        assert_eq!(regions.region(9, 2), Some(1));
        assert_eq!(regions.region(5, 5), None);
        assert!(!regions.has_room(0));
    }

    #[test]
    fn test_corridor_pocket_filled() {
        let mut grid = Grid::new(5, 5);
        carve_row(&mut grid, 1, 1..=9);
        carve_row(&mut grid, 9, 1..=3);
        let mut rooms = Vec::new();
        let mut rng = Isaac64::from_bytes(b"pocket");
        let report = connect_regions(
            &mut grid,
            &mut rooms,
            &mut BTreeSet::new(),
            DoorSet::Basic.table(),
            &mut rng,
        );
        assert_eq!(report.filled, 3);
        assert_eq!(report.joined, 0);
        assert!(!grid.at(9, 2).is_open());
        assert!(grid.at(1, 5).is_open());
        assert_eq!(Regions::scan(&grid).len(), 1);
    }

    #[test]
    fn test_sealed_room_gets_doorway() {
        let mut grid = Grid::new(6, 6);
        let mut rooms = Vec::new();
        // Rows and columns 7..=9, walled by 6 and 10.
        place(&mut grid, &mut rooms, RoomProto::exact(3, 3, 2, 2));
        carve_row(&mut grid, 1, 1..=11);
        let mut connections = BTreeSet::new();
        let mut rng = Isaac64::from_bytes(b"sealed");
        let report = connect_regions(&mut grid, &mut rooms, &mut connections, DoorSet::Basic.table(), &mut rng);
        assert_eq!(report.joined, 1);
        assert_eq!(report.doorways, 1);
        assert_eq!(report.filled, 0);
        assert_eq!(Regions::scan(&grid).len(), 1);

        assert_eq!(rooms[0].door_count(), 1);
        let door = rooms[0].doors[&Direction::North][0];
        assert_eq!(door.row, 6);
        assert_eq!(door.out_id, None);
        assert_eq!(door.room_id, 1);
        let cell = grid.at(6, door.col as isize);
        assert!(cell.is_open());
        assert!(cell.intersects(CellFlags::DOOR_SPACE));
        assert!(!cell.contains(CellFlags::PERIMETER));
        assert!(connections.is_empty());
    }

    #[test]
    fn test_unreachable_room_left_alone() {
        let mut grid = Grid::new(6, 6);
        let mut rooms = Vec::new();
        place(&mut grid, &mut rooms, RoomProto::exact(3, 3, 1, 1));
        // Rock all around the perimeter ring at 6..=8.
        for r in 5..=9 {
            for c in 5..=9 {
                if !((6..=8).contains(&r) && (6..=8).contains(&c)) {
                    grid.insert(r, c, CellFlags::BLOCKED);
                }
            }
        }
        carve_row(&mut grid, 1, 1..=11);
        let mut rng = Isaac64::from_bytes(b"island");
        let report = connect_regions(
            &mut grid,
            &mut rooms,
            &mut BTreeSet::new(),
            DoorSet::Basic.table(),
            &mut rng,
        );
        assert_eq!(report.stranded, 1);
        assert_eq!(report.joined, 0);
        assert_eq!(rooms[0].door_count(), 0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_connected_rooms_keep_their_wall() {
        let mut grid = Grid::new(4, 4);
        let mut rooms = Vec::new();
        // Hubs (3,3) and (3,5), sharing the wall at column 4.
        place(&mut grid, &mut rooms, RoomProto::exact(1, 1, 1, 1));
        place(&mut grid, &mut rooms, RoomProto::exact(1, 2, 1, 1));
        assert!(grid.at(3, 4).contains(CellFlags::PERIMETER));
        let mut connections = BTreeSet::new();
        assert!(crossable(&grid, 1, 1, Direction::East, &connections));
        connections.insert((1, 2));
        assert!(!crossable(&grid, 1, 1, Direction::East, &connections));
        // Room to open ground is always allowed.
        assert!(crossable(&grid, 1, 1, Direction::South, &connections));
    }
}
