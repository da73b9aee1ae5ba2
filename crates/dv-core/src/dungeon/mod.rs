//! Dungeon model and generation phases
//!
//! Cells, the hub/connector grid, and one module per generation phase.

mod cell;
mod corridor;
mod deadend;
mod door;
mod grid;
mod mask;
mod region;
mod room;
mod stairs;

pub use cell::{Cell, CellFlags, LABEL_MASK, LABEL_SHIFT, ROOM_ID_MASK, ROOM_ID_SHIFT};
pub use corridor::tunnel;
pub use deadend::{ARC_RULES, END_RULES, Pattern, Rule, collapse};
pub use door::{Door, DoorKind, FixReport, Sill, door_allowance, door_sills};
pub use grid::{Direction, Grid, Offset, hub, off};
pub use mask::Silhouette;
pub use region::{RegionReport, Regions};
pub use room::{Room, RoomProto, scatter_target};
pub use stairs::{Stair, StairKind, stair_count, stair_ends};

pub(crate) use corridor::carve_corridors;
pub(crate) use deadend::collapse_tunnels;
pub(crate) use door::{fix_doors, open_room};
pub(crate) use region::connect_regions;
pub(crate) use room::{dense_rooms, emplace_room, label_rooms, scatter_rooms};
pub(crate) use stairs::place_stairs;
