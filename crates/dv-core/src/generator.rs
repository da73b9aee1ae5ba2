//! Generation pipeline
//!
//! A [`Generator`] owns the grid for the length of one build and exposes each
//! phase as a method, so a caller can stop between phases and inspect the
//! grid. [`build`] runs the whole pipeline:
//!
//! mask, rooms, doors, labels, corridors, regions, stairs, dead ends, door
//! fix-up.
//!
//! Every random draw goes through the injected [`NumberSource`], seeded once
//! from the dungeon name, so the same name and [`Config`] always produce the
//! same dungeon.

use std::collections::BTreeSet;

use dv_rng::{Isaac64, NumberSource};
use tracing::debug;

use crate::config::{Config, RoomLayout};
use crate::dungeon::{
    ARC_RULES, END_RULES, FixReport, Grid, RegionReport, Room, RoomProto, Stair, carve_corridors,
    collapse_tunnels, connect_regions, dense_rooms, emplace_room, fix_doors, label_rooms, open_room,
    place_stairs, scatter_rooms, stair_count,
};
use crate::view::Dungeon;

/// Build a dungeon with the default ISAAC64 number source.
pub fn build(name: &str, config: Config) -> Dungeon {
    build_with(name, config, Isaac64::default())
}

/// Build a dungeon with any number source. The source is reseeded from
/// `name` first.
pub fn build_with<R: NumberSource>(name: &str, config: Config, rng: R) -> Dungeon {
    Generator::new(name, config, rng).run()
}

/// Mutable state of one build
#[derive(Debug)]
pub struct Generator<R: NumberSource> {
    name: String,
    config: Config,
    rng: R,
    grid: Grid,
    rooms: Vec<Room>,
    connections: BTreeSet<(u16, u16)>,
    stairs: Vec<Stair>,
}

impl<R: NumberSource> Generator<R> {
    /// Seed `rng` from `name` and allocate an empty grid for `config`.
    pub fn new(name: &str, config: Config, mut rng: R) -> Self {
        rng.seed(name.as_bytes());
        let (n_i, n_j) = config.hub_dims();
        debug!(name, n_i, n_j, "allocated grid");
        Self {
            name: name.to_string(),
            config,
            rng,
            grid: Grid::new(n_i, n_j),
            rooms: Vec::new(),
            connections: BTreeSet::new(),
            stairs: Vec::new(),
        }
    }

    /// Run every phase in order.
    pub fn run(mut self) -> Dungeon {
        self.apply_mask();
        self.place_rooms();
        self.open_doors();
        self.label_rooms();
        self.carve_corridors();
        self.connect_regions();
        self.place_stairs();
        self.remove_deadends();
        self.fix_doors();
        self.finish()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn stairs(&self) -> &[Stair] {
        &self.stairs
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Block cells outside the layout's silhouette.
    pub fn apply_mask(&mut self) -> usize {
        let Some(silhouette) = self.config.dungeon_layout.silhouette() else {
            return 0;
        };
        let blocked = silhouette.apply(&mut self.grid);
        debug!(layout = %self.config.dungeon_layout, blocked, "applied mask");
        blocked
    }

    /// Place rooms per the configured room layout.
    pub fn place_rooms(&mut self) -> usize {
        let dims = self.config.room_size.dims();
        let placed = match self.config.room_layout {
            RoomLayout::Dense => dense_rooms(&mut self.grid, &mut self.rooms, dims, &mut self.rng),
            RoomLayout::Scattered => {
                scatter_rooms(&mut self.grid, &mut self.rooms, dims, false, &mut self.rng)
            }
            RoomLayout::Sparse => scatter_rooms(&mut self.grid, &mut self.rooms, dims, true, &mut self.rng),
        };
        debug!(layout = %self.config.room_layout, placed, "placed rooms");
        placed
    }

    /// Place a single room. Unset prototype fields are drawn as usual.
    pub fn try_place_room(&mut self, proto: RoomProto) -> Option<u16> {
        let dims = self.config.room_size.dims();
        emplace_room(&mut self.grid, &mut self.rooms, proto, dims, &mut self.rng)
    }

    /// Open doors around every room, in id order.
    pub fn open_doors(&mut self) -> usize {
        let table = self.config.doors.table();
        let mut opened = 0;
        for room in &mut self.rooms {
            opened += open_room(&mut self.grid, room, &mut self.connections, table, &mut self.rng);
        }
        debug!(opened, connections = self.connections.len(), "opened doors");
        opened
    }

    pub fn label_rooms(&mut self) {
        label_rooms(&mut self.grid, &self.rooms);
    }

    /// Tunnel from every uncarved hub.
    pub fn carve_corridors(&mut self) -> usize {
        let straightness = self.config.corridor_layout.straightness();
        let carved = carve_corridors(&mut self.grid, straightness, &mut self.rng);
        debug!(layout = %self.config.corridor_layout, carved, "carved corridors");
        carved
    }

    /// Fill in stray corridor pockets and join every room to the main body
    /// of open space.
    pub fn connect_regions(&mut self) -> RegionReport {
        let table = self.config.doors.table();
        let report = connect_regions(&mut self.grid, &mut self.rooms, &mut self.connections, table, &mut self.rng);
        debug!(
            filled = report.filled,
            joined = report.joined,
            doorways = report.doorways,
            stranded = report.stranded,
            "connected regions"
        );
        report
    }

    pub fn place_stairs(&mut self) -> usize {
        let count = stair_count(self.config.stairs, &self.grid, &mut self.rng);
        if count == 0 {
            return 0;
        }
        self.stairs = place_stairs(&mut self.grid, count, &mut self.rng);
        debug!(wanted = count, placed = self.stairs.len(), "placed stairs");
        self.stairs.len()
    }

    /// Collapse dead ends, then straighten detours for straight layouts.
    pub fn remove_deadends(&mut self) -> usize {
        let pct = self.config.remove_deadends.percent();
        if pct == 0 {
            return 0;
        }
        let mut closed = collapse_tunnels(&mut self.grid, pct, &END_RULES, &mut self.rng);
        if self.config.corridor_layout.closes_arcs() {
            closed += collapse_tunnels(&mut self.grid, pct, &ARC_RULES, &mut self.rng);
        }
        debug!(pct, closed, "removed dead ends");
        closed
    }

    pub fn fix_doors(&mut self) -> FixReport {
        let report = fix_doors(&mut self.grid, &mut self.rooms);
        debug!(kept = report.kept, dropped = report.dropped, mirrored = report.mirrored, "fixed doors");
        report
    }

    /// Freeze the grid into a read-only view.
    pub fn finish(self) -> Dungeon {
        Dungeon::new(self.name, self.config, self.grid, self.rooms, self.stairs)
    }
}
