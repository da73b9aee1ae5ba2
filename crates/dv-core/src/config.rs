//! Generation options
//!
//! Every option is a closed enum whose lowercase name round-trips through
//! strings, so an unknown option fails when the [`Config`] is built and never
//! during generation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::consts::CELL_SIZE;
use crate::dungeon::{DoorKind, Silhouette};
use crate::error::ConfigError;

/// Overall dungeon size
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DungeonSize {
    Fine,
    Dimin,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl DungeonSize {
    /// Size in nominal units; divided by [`CELL_SIZE`] it gives hub rows.
    pub const fn size(self) -> u32 {
        match self {
            DungeonSize::Fine => 200,
            DungeonSize::Dimin => 252,
            DungeonSize::Tiny => 318,
            DungeonSize::Small => 400,
            DungeonSize::Medium => 504,
            DungeonSize::Large => 635,
            DungeonSize::Huge => 800,
            DungeonSize::Gargantuan => 1008,
            DungeonSize::Colossal => 1270,
        }
    }
}

/// Dungeon outline
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DungeonLayout {
    Square,
    #[default]
    Rectangle,
    Box,
    Cross,
    Dagger,
    Saltire,
    Keep,
    Hexagon,
    Round,
}

const BOX_MASK: &[&[u8]] = &[&[1, 1, 1], &[1, 0, 1], &[1, 1, 1]];
const CROSS_MASK: &[&[u8]] = &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]];
const DAGGER_MASK: &[&[u8]] = &[&[0, 1, 0, 0], &[1, 1, 1, 1], &[0, 1, 0, 0]];
const KEEP_MASK: &[&[u8]] = &[
    &[1, 1, 0, 0, 1, 1],
    &[1, 1, 1, 1, 1, 1],
    &[0, 1, 1, 1, 1, 0],
    &[0, 1, 1, 1, 1, 0],
    &[1, 1, 1, 1, 1, 1],
    &[1, 1, 0, 0, 1, 1],
];

impl DungeonLayout {
    /// Width-to-height ratio of the grid.
    pub const fn aspect(self) -> f64 {
        match self {
            DungeonLayout::Rectangle | DungeonLayout::Dagger => 1.3,
            DungeonLayout::Hexagon => 0.9,
            _ => 1.0,
        }
    }

    /// Outline stamped onto the grid before placement, if any.
    pub const fn silhouette(self) -> Option<Silhouette> {
        match self {
            DungeonLayout::Square | DungeonLayout::Rectangle => None,
            DungeonLayout::Box => Some(Silhouette::Bitmap(BOX_MASK)),
            DungeonLayout::Cross => Some(Silhouette::Bitmap(CROSS_MASK)),
            DungeonLayout::Dagger => Some(Silhouette::Bitmap(DAGGER_MASK)),
            DungeonLayout::Keep => Some(Silhouette::Bitmap(KEEP_MASK)),
            DungeonLayout::Saltire => Some(Silhouette::Saltire),
            DungeonLayout::Hexagon => Some(Silhouette::Hexagon),
            DungeonLayout::Round => Some(Silhouette::Round),
        }
    }
}

/// Room dimensions in hubs: sizes are drawn from `[base, base + radix)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomDims {
    pub base: usize,
    pub radix: usize,
    /// Large classes get a second scatter pass of medium rooms.
    pub huge: bool,
}

/// Room size class
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RoomSize {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl RoomSize {
    pub const fn dims(self) -> RoomDims {
        let (base, radix, huge) = match self {
            RoomSize::Small => (2, 2, false),
            RoomSize::Medium => (2, 5, false),
            RoomSize::Large => (5, 2, false),
            RoomSize::Huge => (5, 5, true),
            RoomSize::Gargantuan => (8, 5, true),
            RoomSize::Colossal => (8, 8, true),
        };
        RoomDims { base, radix, huge }
    }
}

/// Room placement policy
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RoomLayout {
    Sparse,
    #[default]
    Scattered,
    Dense,
}

/// Corridor style
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CorridorLayout {
    Maze,
    #[default]
    Errant,
    Straight,
}

impl CorridorLayout {
    /// Percent chance a tunnel keeps its previous heading.
    pub const fn straightness(self) -> u32 {
        match self {
            CorridorLayout::Maze => 0,
            CorridorLayout::Errant => 50,
            CorridorLayout::Straight => 90,
        }
    }

    /// Whether dead-end removal also straightens U-shaped detours.
    pub const fn closes_arcs(self) -> bool {
        matches!(self, CorridorLayout::Straight)
    }
}

/// How many dead ends to collapse
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum DeadEnds {
    #[strum(serialize = "none", ascii_case_insensitive)]
    #[serde(rename = "none")]
    Keep,
    #[default]
    #[strum(serialize = "some", ascii_case_insensitive)]
    #[serde(rename = "some")]
    Partial,
    #[strum(serialize = "all", ascii_case_insensitive)]
    #[serde(rename = "all")]
    Remove,
}

impl DeadEnds {
    pub const fn percent(self) -> u32 {
        match self {
            DeadEnds::Keep => 0,
            DeadEnds::Partial => 50,
            DeadEnds::Remove => 100,
        }
    }
}

/// Door frequency profile
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
pub enum DoorSet {
    #[strum(serialize = "none", ascii_case_insensitive)]
    #[serde(rename = "none")]
    ArchesOnly,
    #[strum(serialize = "basic", ascii_case_insensitive)]
    #[serde(rename = "basic")]
    Basic,
    #[strum(serialize = "secure", ascii_case_insensitive)]
    #[serde(rename = "secure")]
    Secure,
    #[default]
    #[strum(serialize = "standard", ascii_case_insensitive)]
    #[serde(rename = "standard")]
    Standard,
    #[strum(serialize = "deathtrap", ascii_case_insensitive)]
    #[serde(rename = "deathtrap")]
    Deathtrap,
}

/// Weighted door table: roll `[0, roll)` and take the first entry whose
/// bound the roll is below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTable {
    pub roll: u32,
    pub entries: &'static [(u32, DoorKind)],
}

impl DoorTable {
    /// Door kind for a roll. Rolls past the last bound fall back to the last
    /// entry.
    pub fn pick(&self, roll: u32) -> DoorKind {
        self.entries
            .iter()
            .find(|(bound, _)| roll < *bound)
            .or(self.entries.last())
            .map(|&(_, kind)| kind)
            .unwrap_or(DoorKind::Arch)
    }
}

impl DoorSet {
    pub const fn table(self) -> DoorTable {
        match self {
            DoorSet::ArchesOnly => DoorTable {
                roll: 1,
                entries: &[(1, DoorKind::Arch)],
            },
            DoorSet::Basic => DoorTable {
                roll: 60,
                entries: &[(15, DoorKind::Arch), (60, DoorKind::Door)],
            },
            DoorSet::Secure => DoorTable {
                roll: 110,
                entries: &[
                    (15, DoorKind::Arch),
                    (45, DoorKind::Door),
                    (90, DoorKind::Locked),
                    (110, DoorKind::Portcullis),
                ],
            },
            DoorSet::Standard => DoorTable {
                roll: 110,
                entries: &[
                    (15, DoorKind::Arch),
                    (60, DoorKind::Door),
                    (75, DoorKind::Locked),
                    (90, DoorKind::Trapped),
                    (100, DoorKind::Secret),
                    (110, DoorKind::Portcullis),
                ],
            },
            DoorSet::Deathtrap => DoorTable {
                roll: 100,
                entries: &[
                    (15, DoorKind::Arch),
                    (30, DoorKind::Locked),
                    (70, DoorKind::Trapped),
                    (100, DoorKind::Secret),
                ],
            },
        }
    }
}

/// Stair placement
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Stairs {
    No,
    #[default]
    Yes,
    Many,
}

/// Immutable generation input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dungeon_size: DungeonSize,
    pub dungeon_layout: DungeonLayout,
    pub room_size: RoomSize,
    pub room_layout: RoomLayout,
    pub corridor_layout: CorridorLayout,
    pub remove_deadends: DeadEnds,
    pub doors: DoorSet,
    pub stairs: Stairs,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a (possibly partial) JSON object; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hub rows and hub columns of the grid this configuration produces.
    pub fn hub_dims(&self) -> (usize, usize) {
        let size = self.dungeon_size.size();
        let n_i = (size / CELL_SIZE) as usize;
        let n_j = (size as f64 * self.dungeon_layout.aspect() / CELL_SIZE as f64).floor() as usize;
        (n_i, n_j)
    }
}

/// String-keyed construction of a [`Config`], failing on the first unknown
/// key or value.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::UnknownOption {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl ConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        let c = &mut self.config;
        match key.trim().replace('-', "_").as_str() {
            "dungeon_size" | "size" => c.dungeon_size = parse(key, value)?,
            "dungeon_layout" | "layout" => c.dungeon_layout = parse(key, value)?,
            "room_size" => c.room_size = parse(key, value)?,
            "room_layout" => c.room_layout = parse(key, value)?,
            "corridor_layout" | "corridors" => c.corridor_layout = parse(key, value)?,
            "remove_deadends" | "dead_ends" | "deadends" => c.remove_deadends = parse(key, value)?,
            "doors" | "door_set" => c.doors = parse(key, value)?,
            "stairs" | "add_stairs" => c.stairs = parse(key, value)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(self)
    }

    pub fn dungeon_size(&mut self, v: DungeonSize) -> &mut Self {
        self.config.dungeon_size = v;
        self
    }

    pub fn dungeon_layout(&mut self, v: DungeonLayout) -> &mut Self {
        self.config.dungeon_layout = v;
        self
    }

    pub fn room_size(&mut self, v: RoomSize) -> &mut Self {
        self.config.room_size = v;
        self
    }

    pub fn room_layout(&mut self, v: RoomLayout) -> &mut Self {
        self.config.room_layout = v;
        self
    }

    pub fn corridor_layout(&mut self, v: CorridorLayout) -> &mut Self {
        self.config.corridor_layout = v;
        self
    }

    pub fn remove_deadends(&mut self, v: DeadEnds) -> &mut Self {
        self.config.remove_deadends = v;
        self
    }

    pub fn doors(&mut self, v: DoorSet) -> &mut Self {
        self.config.doors = v;
        self
    }

    pub fn stairs(&mut self, v: Stairs) -> &mut Self {
        self.config.stairs = v;
        self
    }

    pub fn build(&self) -> Config {
        self.config
    }
}
