//! Doors: sill discovery, opening, and reconciliation

use std::collections::BTreeSet;

use dv_rng::NumberSource;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::trace;

use super::cell::{Cell, CellFlags};
use super::grid::{Direction, Grid};
use super::room::Room;
use crate::config::DoorTable;
use crate::rng::NumberSourceExt;

/// Door subtype
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DoorKind {
    Arch,
    Door,
    Locked,
    Trapped,
    Secret,
    Portcullis,
}

impl DoorKind {
    pub const fn flag(self) -> CellFlags {
        match self {
            DoorKind::Arch => CellFlags::ARCH,
            DoorKind::Door => CellFlags::DOOR,
            DoorKind::Locked => CellFlags::LOCKED,
            DoorKind::Trapped => CellFlags::TRAPPED,
            DoorKind::Secret => CellFlags::SECRET,
            DoorKind::Portcullis => CellFlags::PORTCULLIS,
        }
    }

    /// Label byte stamped on the door cell. Arches carry none.
    pub const fn label(self) -> Option<u8> {
        match self {
            DoorKind::Arch => None,
            DoorKind::Door => Some(b'o'),
            DoorKind::Locked => Some(b'x'),
            DoorKind::Trapped => Some(b't'),
            DoorKind::Secret => Some(b's'),
            DoorKind::Portcullis => Some(b'#'),
        }
    }

    /// Glyph used by the text rendering.
    pub const fn glyph(self) -> char {
        match self {
            DoorKind::Arch => '\'',
            DoorKind::Door => '+',
            DoorKind::Locked => 'x',
            DoorKind::Trapped => 't',
            DoorKind::Secret => 's',
            DoorKind::Portcullis => '|',
        }
    }

    /// Door kind of a cell, if any.
    pub fn from_cell(cell: Cell) -> Option<DoorKind> {
        [
            DoorKind::Arch,
            DoorKind::Door,
            DoorKind::Locked,
            DoorKind::Trapped,
            DoorKind::Secret,
            DoorKind::Portcullis,
        ]
        .into_iter()
        .find(|kind| cell.contains(kind.flag()))
    }
}

/// A door as recorded on one room's edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub row: usize,
    pub col: usize,
    pub kind: DoorKind,
    /// Room whose edge holds this record
    pub room_id: u16,
    /// Room on the far side, `None` when the door opens onto a corridor
    pub out_id: Option<u16>,
}

/// A candidate doorway on a room edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sill {
    /// Room-side edge cell
    pub sill_r: usize,
    pub sill_c: usize,
    pub dir: Direction,
    pub door_r: usize,
    pub door_c: usize,
    pub out_id: Option<u16>,
}

/// Sill candidate at edge cell `(r, c)` facing `dir`.
fn check_sill(grid: &Grid, room: &Room, r: usize, c: usize, dir: Direction) -> Option<Sill> {
    let door_r = (r as isize + dir.di()) as usize;
    let door_c = (c as isize + dir.dj()) as usize;
    let door = grid.get(door_r, door_c)?;
    if !door.contains(CellFlags::PERIMETER) || door.intersects(CellFlags::BLOCK_DOOR) {
        return None;
    }
    let out_r = door_r as isize + dir.di();
    let out_c = door_c as isize + dir.dj();
    if out_r < 0 || out_c < 0 {
        return None;
    }
    let out = grid.get(out_r as usize, out_c as usize)?;
    if out.contains(CellFlags::BLOCKED) {
        return None;
    }
    let out_id = out.contains(CellFlags::ROOM).then(|| out.room_id());
    if out_id == Some(room.id) {
        return None;
    }
    Some(Sill {
        sill_r: r,
        sill_c: c,
        dir,
        door_r,
        door_c,
        out_id,
    })
}

/// Every usable sill around `room`, in edge order. Edges within two cells of
/// the grid border have none.
pub fn door_sills(grid: &Grid, room: &Room) -> Vec<Sill> {
    let mut list = Vec::new();
    if room.north >= 3 {
        for c in (room.west..=room.east).step_by(2) {
            list.extend(check_sill(grid, room, room.north, c, Direction::North));
        }
    }
    if room.south + 3 <= grid.n_rows() {
        for c in (room.west..=room.east).step_by(2) {
            list.extend(check_sill(grid, room, room.south, c, Direction::South));
        }
    }
    if room.west >= 3 {
        for r in (room.north..=room.south).step_by(2) {
            list.extend(check_sill(grid, room, r, room.west, Direction::West));
        }
    }
    if room.east + 3 <= grid.n_cols() {
        for r in (room.north..=room.south).step_by(2) {
            list.extend(check_sill(grid, room, r, room.east, Direction::East));
        }
    }
    list
}

/// Base door count for a room: `floor(sqrt(w * h))` with `w` and `h` counted
/// in hubs. Taking `w` and `h` as the half-extents `(east - west) / 2` and
/// `(south - north) / 2` instead, the same count reads
/// `floor(sqrt((w + 1) * (h + 1)))`.
pub fn door_allowance(room: &Room) -> u32 {
    let h = (room.south - room.north) / 2 + 1;
    let w = (room.east - room.west) / 2 + 1;
    ((w * h) as f64).sqrt().floor() as u32
}

/// Open doors around one room. Returns how many were opened.
pub(crate) fn open_room<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    room: &mut Room,
    connections: &mut BTreeSet<(u16, u16)>,
    table: DoorTable,
    rng: &mut R,
) -> usize {
    let mut sills = door_sills(grid, room);
    if sills.is_empty() {
        return 0;
    }
    rng.shuffle(&mut sills);

    let flumph = door_allowance(room);
    let n_opens = (flumph + rng.next(flumph)) as usize;
    let mut opened = 0;

    while opened < n_opens && !sills.is_empty() {
        let idx = rng.pick_index(sills.len());
        let sill = sills.remove(idx);
        let door = grid.cell(sill.door_r, sill.door_c);
        if door.intersects(CellFlags::DOOR_SPACE) {
            continue;
        }
        if let Some(out_id) = sill.out_id {
            let pair = (room.id.min(out_id), room.id.max(out_id));
            if !connections.insert(pair) {
                trace!(room = room.id, out_id, "sill skipped: rooms already connected");
                continue;
            }
        }

        for x in 0..3isize {
            let r = (sill.sill_r as isize + sill.dir.di() * x) as usize;
            let c = (sill.sill_c as isize + sill.dir.dj() * x) as usize;
            if let Some(cell) = grid.get_mut(r, c) {
                cell.remove(CellFlags::PERIMETER);
                cell.insert(CellFlags::ENTRANCE);
            }
        }

        let kind = table.pick(rng.next(table.roll));
        let cell = grid.cell_mut(sill.door_r, sill.door_c);
        cell.insert(kind.flag());
        if let Some(ch) = kind.label() {
            cell.set_label(ch);
        }

        room.doors.entry(sill.dir).or_default().push(Door {
            row: sill.door_r,
            col: sill.door_c,
            kind,
            room_id: room.id,
            out_id: sill.out_id,
        });
        opened += 1;
    }
    opened
}

/// Outcome of [`fix_doors`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixReport {
    pub kept: usize,
    pub dropped: usize,
    pub mirrored: usize,
}

/// Reconcile door records with the finished grid.
///
/// Doors whose cell is no longer open space are erased back to perimeter.
/// Each surviving room-to-room door is copied onto the far room's opposite
/// edge the first time its cell is seen. Edges left with no doors get their
/// perimeter ring restored.
pub(crate) fn fix_doors(grid: &mut Grid, rooms: &mut [Room]) -> FixReport {
    let mut fixed: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut report = FixReport::default();

    for idx in 0..rooms.len() {
        for dir in Direction::ALL {
            let Some(doors) = rooms[idx].doors.remove(&dir) else {
                continue;
            };
            let mut shiny = Vec::with_capacity(doors.len());
            for door in doors {
                let cell = grid.cell_mut(door.row, door.col);
                if !cell.is_open() {
                    cell.remove(CellFlags::DOOR_SPACE | CellFlags::ENTRANCE);
                    cell.clear_label();
                    cell.insert(CellFlags::PERIMETER);
                    report.dropped += 1;
                    continue;
                }
                if fixed.insert((door.row, door.col)) {
                    if let Some(out_id) = door.out_id {
                        let far = out_id as usize - 1;
                        if let Some(out_room) = rooms.get_mut(far) {
                            out_room.doors.entry(dir.opposite()).or_default().push(Door {
                                room_id: out_id,
                                out_id: Some(door.room_id),
                                ..door
                            });
                            report.mirrored += 1;
                        }
                    }
                }
                shiny.push(door);
            }
            report.kept += shiny.len();
            if shiny.is_empty() {
                restore_edge(grid, &rooms[idx], dir);
            } else {
                rooms[idx].doors.insert(dir, shiny);
            }
        }
    }
    report
}

/// Re-stamp the perimeter along one edge of a room.
fn restore_edge(grid: &mut Grid, room: &Room, dir: Direction) {
    let ring: Vec<(usize, usize)> = match dir {
        Direction::North => (room.west - 1..=room.east + 1).map(|c| (room.north - 1, c)).collect(),
        Direction::South => (room.west - 1..=room.east + 1).map(|c| (room.south + 1, c)).collect(),
        Direction::West => (room.north - 1..=room.south + 1).map(|r| (r, room.west - 1)).collect(),
        Direction::East => (room.north - 1..=room.south + 1).map(|r| (r, room.east + 1)).collect(),
    };
    for (r, c) in ring {
        if let Some(cell) = grid.get_mut(r, c) {
            if !cell.intersects(CellFlags::OPEN_SPACE | CellFlags::DOOR_SPACE) {
                cell.insert(CellFlags::PERIMETER);
            }
        }
    }
}
