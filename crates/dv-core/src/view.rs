//! Read-only dungeon view
//!
//! A [`Dungeon`] is what a build hands out: the finished grid, per-room
//! metadata keyed by room id, the reconciled door list, and the stairs.
//! Nothing in it can be mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dungeon::{Cell, CellFlags, Direction, Door, DoorKind, Grid, Room, Stair, StairKind};

/// Room position and size in grid cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: u16,
    /// Left column (`2 * j + 1`)
    pub x: usize,
    /// Top row (`2 * i + 1`)
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub doors: BTreeMap<Direction, Vec<Door>>,
}

impl From<Room> for RoomInfo {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            x: room.west,
            y: room.north,
            width: room.east - room.west + 1,
            height: room.south - room.north + 1,
            doors: room.doors,
        }
    }
}

/// A generated dungeon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dungeon {
    name: String,
    config: Config,
    grid: Grid,
    rooms: BTreeMap<u16, RoomInfo>,
    doors: Vec<Door>,
    stairs: Vec<Stair>,
}

impl Dungeon {
    pub(crate) fn new(name: String, config: Config, grid: Grid, rooms: Vec<Room>, stairs: Vec<Stair>) -> Self {
        let mut seen = BTreeSet::new();
        let doors = rooms
            .iter()
            .flat_map(|room| room.doors.values().flatten())
            .filter(|door| seen.insert((door.row, door.col)))
            .copied()
            .collect();
        let rooms = rooms
            .into_iter()
            .map(|room| (room.id, RoomInfo::from(room)))
            .collect();
        Self {
            name,
            config,
            grid,
            rooms,
            doors,
            stairs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Columns of cells
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Rows of cells
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Cell at column `x`, row `y`.
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.grid.get(y, x)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.grid.rows()
    }

    pub fn rooms(&self) -> &BTreeMap<u16, RoomInfo> {
        &self.rooms
    }

    pub fn room(&self, id: u16) -> Option<&RoomInfo> {
        self.rooms.get(&id)
    }

    /// Every surviving door once, in room order.
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn stairs(&self) -> &[Stair] {
        &self.stairs
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Text map, one glyph per cell, followed by a legend.
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * (self.height() + 4));
        for row in self.rows() {
            out.extend(row.iter().map(|&cell| glyph(cell)));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(LEGEND);
        out
    }
}

const LEGEND: &str = "\
.  floor     #  wall      ' arch      + door\n\
x  locked    t  trapped   s secret    | portcullis\n\
>  stair down            <  stair up\n";

/// Map glyph for one cell.
pub fn glyph(cell: Cell) -> char {
    if cell.contains(CellFlags::STAIR_DOWN) {
        return StairKind::Down.glyph();
    }
    if cell.contains(CellFlags::STAIR_UP) {
        return StairKind::Up.glyph();
    }
    if let Some(kind) = DoorKind::from_cell(cell) {
        return kind.glyph();
    }
    if cell.contains(CellFlags::ROOM) {
        return match cell.label() {
            Some(ch) if ch.is_ascii_digit() => ch as char,
            _ => '.',
        };
    }
    if cell.contains(CellFlags::CORRIDOR) {
        return '.';
    }
    if cell.contains(CellFlags::BLOCKED) {
        return ' ';
    }
    '#'
}

impl fmt::Display for Dungeon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}
