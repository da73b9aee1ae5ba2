//! Generator-wide constants

/// Nominal edge length of one hub in size units; a dungeon size divided by
/// this gives its hub count.
pub const CELL_SIZE: u32 = 18;

/// Hard cap on rooms per dungeon. Also bounds generation time.
pub const MAX_ROOMS: u16 = 999;

/// Largest id the room-id sub-field of a cell can hold.
pub const MAX_ROOM_ID: u16 = 0x3FF;

/// Grid cells of area per possible extra stair in the "many" stair setting.
pub const AREA_PER_EXTRA_STAIR: u32 = 1000;
