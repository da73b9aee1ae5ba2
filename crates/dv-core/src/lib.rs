//! dv-core: procedural dungeon generation
//!
//! Builds a 2D map of rooms, corridors and doors from a name and a
//! [`Config`]. The same name and configuration always give the same map.
//!
//! ```
//! use dv_core::{Config, build};
//!
//! let dungeon = build("The Sunless Vault", Config::default());
//! assert!(!dungeon.rooms().is_empty());
//! println!("{dungeon}");
//! ```

pub mod config;
pub mod dungeon;
pub mod error;
pub mod generator;
pub mod rng;
pub mod view;

mod consts;

pub use config::{
    Config, ConfigBuilder, CorridorLayout, DeadEnds, DoorSet, DoorTable, DungeonLayout, DungeonSize,
    RoomDims, RoomLayout, RoomSize, Stairs,
};
pub use consts::*;
pub use dungeon::{Cell, CellFlags, Direction, Door, DoorKind, Stair, StairKind};
pub use dv_rng::{Isaac64, NumberSource};
pub use error::ConfigError;
pub use generator::{Generator, build, build_with};
pub use rng::{ChaChaSource, NumberSourceExt};
pub use view::{Dungeon, RoomInfo};
