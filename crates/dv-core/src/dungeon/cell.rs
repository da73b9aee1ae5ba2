//! Bit-packed map cells
//!
//! A cell is a single `u32`: a set of boolean flags plus two embedded
//! sub-fields, a 10-bit room id (bits 6..16) and an 8-bit ASCII label
//! (bits 24..32). The label is cosmetic and never consulted by flag logic.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROOM_ID;

/// Room id sub-field position and mask
pub const ROOM_ID_SHIFT: u32 = 6;
pub const ROOM_ID_MASK: u32 = 0x0000_FFC0;

/// Label sub-field position and mask
pub const LABEL_SHIFT: u32 = 24;
pub const LABEL_MASK: u32 = 0xFF00_0000;

bitflags! {
    /// Cell flags. Composite constants name the masks generation tests against.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u32 {
        const BLOCKED = 0x0000_0001;
        const ROOM = 0x0000_0002;
        const CORRIDOR = 0x0000_0004;
        const PERIMETER = 0x0000_0010;
        const ENTRANCE = 0x0000_0020;
        const ARCH = 0x0001_0000;
        const DOOR = 0x0002_0000;
        const LOCKED = 0x0004_0000;
        const TRAPPED = 0x0008_0000;
        const SECRET = 0x0010_0000;
        const PORTCULLIS = 0x0020_0000;
        const STAIR_DOWN = 0x0040_0000;
        const STAIR_UP = 0x0080_0000;

        const OPEN_SPACE = Self::ROOM.bits() | Self::CORRIDOR.bits();
        const DOOR_SPACE = Self::ARCH.bits()
            | Self::DOOR.bits()
            | Self::LOCKED.bits()
            | Self::TRAPPED.bits()
            | Self::SECRET.bits()
            | Self::PORTCULLIS.bits();
        const STAIRS = Self::STAIR_DOWN.bits() | Self::STAIR_UP.bits();
        const BLOCK_ROOM = Self::BLOCKED.bits() | Self::ROOM.bits();
        const BLOCK_CORRIDOR = Self::BLOCKED.bits() | Self::PERIMETER.bits() | Self::CORRIDOR.bits();
        const BLOCK_DOOR = Self::BLOCKED.bits() | Self::DOOR_SPACE.bits();
    }
}

/// A single map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(u32);

impl Cell {
    /// Nothing at all: not blocked, not carved, no ids.
    pub const EMPTY: Cell = Cell(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Flag bits only; the room id and label sub-fields are dropped.
    pub const fn flags(self) -> CellFlags {
        CellFlags::from_bits_truncate(self.0)
    }

    pub const fn contains(self, flags: CellFlags) -> bool {
        self.0 & flags.bits() == flags.bits()
    }

    pub const fn intersects(self, flags: CellFlags) -> bool {
        self.0 & flags.bits() != 0
    }

    pub fn insert(&mut self, flags: CellFlags) {
        self.0 |= flags.bits();
    }

    pub fn remove(&mut self, flags: CellFlags) {
        self.0 &= !flags.bits();
    }

    /// Room id, 0 meaning "no room".
    pub const fn room_id(self) -> u16 {
        ((self.0 & ROOM_ID_MASK) >> ROOM_ID_SHIFT) as u16
    }

    /// Replace the room id. Ids above [`MAX_ROOM_ID`] are truncated to the
    /// sub-field width.
    pub fn set_room_id(&mut self, id: u16) {
        self.0 &= !ROOM_ID_MASK;
        self.0 |= ((id & MAX_ROOM_ID) as u32) << ROOM_ID_SHIFT;
    }

    /// Label byte, `None` when unset.
    pub const fn label(self) -> Option<u8> {
        match ((self.0 & LABEL_MASK) >> LABEL_SHIFT) as u8 {
            0 => None,
            ch => Some(ch),
        }
    }

    pub fn set_label(&mut self, ch: u8) {
        self.0 &= !LABEL_MASK;
        self.0 |= (ch as u32) << LABEL_SHIFT;
    }

    pub fn clear_label(&mut self) {
        self.0 &= !LABEL_MASK;
    }

    pub const fn is_open(self) -> bool {
        self.intersects(CellFlags::OPEN_SPACE)
    }

    /// Exactly a corridor: no room, door, stair, id or label bits.
    pub const fn is_bare_corridor(self) -> bool {
        self.0 == CellFlags::CORRIDOR.bits()
    }
}

impl From<u32> for Cell {
    fn from(bits: u32) -> Self {
        Cell(bits)
    }
}

impl From<Cell> for u32 {
    fn from(cell: Cell) -> Self {
        cell.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(CellFlags::BLOCKED.bits(), 0x1);
        assert_eq!(CellFlags::PERIMETER.bits(), 0x10);
        assert_eq!(CellFlags::PORTCULLIS.bits(), 0x20_0000);
        assert_eq!(CellFlags::STAIR_UP.bits(), 0x80_0000);
        assert_eq!(CellFlags::DOOR_SPACE.bits(), 0x3F_0000);
    }

    #[test]
    fn test_flags_do_not_overlap_subfields() {
        let all = CellFlags::all().bits();
        assert_eq!(all & ROOM_ID_MASK, 0);
        assert_eq!(all & LABEL_MASK, 0);
        assert_eq!(ROOM_ID_MASK & LABEL_MASK, 0);
    }

    #[test]
    fn test_room_id_roundtrip_keeps_flags() {
        let mut cell = Cell::EMPTY;
        cell.insert(CellFlags::ROOM | CellFlags::ENTRANCE);
        cell.set_room_id(999);
        assert_eq!(cell.room_id(), 999);
        cell.set_room_id(3);
        assert_eq!(cell.room_id(), 3);
        assert!(cell.contains(CellFlags::ROOM | CellFlags::ENTRANCE));
        assert_eq!(cell.flags(), CellFlags::ROOM | CellFlags::ENTRANCE);
    }

    #[test]
    fn test_label() {
        let mut cell = Cell::EMPTY;
        assert_eq!(cell.label(), None);
        cell.set_label(b'7');
        assert_eq!(cell.label(), Some(b'7'));
        assert_eq!(cell.flags(), CellFlags::empty());
        cell.clear_label();
        assert_eq!(cell, Cell::EMPTY);
    }

    #[test]
    fn test_bare_corridor() {
        let mut cell = Cell::EMPTY;
        cell.insert(CellFlags::CORRIDOR);
        assert!(cell.is_bare_corridor());
        cell.set_label(b'd');
        assert!(!cell.is_bare_corridor());
        let mut room = Cell::EMPTY;
        room.insert(CellFlags::CORRIDOR | CellFlags::ROOM);
        assert!(room.is_open());
        assert!(!room.is_bare_corridor());
    }

    proptest! {
        #[test]
        fn prop_subfields_are_independent(flags in any::<u32>(), id in 0u16..=MAX_ROOM_ID, label in any::<u8>()) {
            let flags = CellFlags::from_bits_truncate(flags);
            let mut cell = Cell::EMPTY;
            cell.insert(flags);
            cell.set_room_id(id);
            cell.set_label(label);
            prop_assert_eq!(cell.flags(), flags);
            prop_assert_eq!(cell.room_id(), id);
            prop_assert_eq!(cell.label().unwrap_or(0), label);
        }
    }
}
