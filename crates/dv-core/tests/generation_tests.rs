use std::collections::{BTreeMap, BTreeSet, VecDeque};

use dv_core::dungeon::{Grid, RoomProto};
use dv_core::{
    CellFlags, Config, CorridorLayout, DeadEnds, Direction, DoorSet, DungeonLayout, DungeonSize, Generator,
    Isaac64, MAX_ROOMS, RoomLayout, RoomSize, Stairs, build,
};
use proptest::prelude::*;
use strum::IntoEnumIterator;

fn config(size: DungeonSize, layout: DungeonLayout, rooms: RoomLayout) -> Config {
    Config {
        dungeon_size: size,
        dungeon_layout: layout,
        room_layout: rooms,
        ..Config::default()
    }
}

/// A spread of configurations that exercises every phase.
fn sample_configs() -> Vec<Config> {
    let mut out = Vec::new();
    for layout in [DungeonLayout::Rectangle, DungeonLayout::Cross, DungeonLayout::Round] {
        for rooms in RoomLayout::iter() {
            for corridors in CorridorLayout::iter() {
                let mut c = config(DungeonSize::Fine, layout, rooms);
                c.corridor_layout = corridors;
                c.remove_deadends = DeadEnds::Remove;
                out.push(c);
            }
        }
    }
    let mut c = config(DungeonSize::Small, DungeonLayout::Keep, RoomLayout::Scattered);
    c.room_size = RoomSize::Huge;
    c.doors = DoorSet::Deathtrap;
    c.stairs = Stairs::Many;
    out.push(c);
    out
}

#[test]
fn test_seed_a_is_reproducible() {
    let cfg = Config {
        dungeon_size: DungeonSize::Medium,
        dungeon_layout: DungeonLayout::Rectangle,
        room_layout: RoomLayout::Scattered,
        corridor_layout: CorridorLayout::Errant,
        remove_deadends: DeadEnds::Remove,
        doors: DoorSet::Standard,
        ..Config::default()
    };
    let a = build("seedA", cfg);
    let b = build("seedA", cfg);
    assert_eq!(a.grid(), b.grid());
    assert_eq!(a.rooms(), b.rooms());
    assert_eq!(a.doors(), b.doors());
    assert_eq!(a.render_text(), b.render_text());

    let c = build("seedB", cfg);
    assert_ne!(a.grid(), c.grid());
}

#[test]
fn test_no_deadend_removal_leaves_grid_alone() {
    let mut cfg = config(DungeonSize::Small, DungeonLayout::Rectangle, RoomLayout::Scattered);
    cfg.remove_deadends = DeadEnds::Keep;
    let mut generator = Generator::new("untouched", cfg, Isaac64::default());
    generator.apply_mask();
    generator.place_rooms();
    generator.open_doors();
    generator.label_rooms();
    generator.carve_corridors();
    generator.place_stairs();
    let before = generator.grid().clone();
    let draws = generator.rng().draws();
    assert_eq!(generator.remove_deadends(), 0);
    assert_eq!(generator.grid(), &before);
    assert_eq!(generator.rng().draws(), draws);
}

#[test]
fn test_cross_mask_respected() {
    let cfg = config(DungeonSize::Tiny, DungeonLayout::Cross, RoomLayout::Dense);
    let dungeon = build("crossroads", cfg);
    let (h, w) = (dungeon.height(), dungeon.width());
    let mut saw_blocked = false;
    for y in 0..h {
        for x in 0..w {
            let cell = dungeon.cell(x, y).unwrap();
            // Nearest-neighbour lookup into the 3x3 cross.
            let (mr, mc) = (y * 3 / h, x * 3 / w);
            let inside = mr == 1 || mc == 1;
            assert_eq!(cell.contains(CellFlags::BLOCKED), !inside, "({y},{x})");
            if !inside {
                saw_blocked = true;
                assert!(!cell.is_open(), "open cell outside mask at ({y},{x})");
            }
        }
    }
    assert!(saw_blocked);
}

#[test]
fn test_every_layout_respects_its_silhouette() {
    for layout in DungeonLayout::iter() {
        let dungeon = build("outline", config(DungeonSize::Fine, layout, RoomLayout::Scattered));
        let Some(silhouette) = layout.silhouette() else {
            assert!(dungeon.grid().iter().all(|(_, c)| !c.contains(CellFlags::BLOCKED)));
            continue;
        };
        let (h, w) = (dungeon.height(), dungeon.width());
        for ((r, c), cell) in dungeon.grid().iter() {
            if !silhouette.covers(r, c, h, w) {
                assert!(!cell.is_open(), "{layout}: open cell at ({r},{c})");
            }
        }
    }
}

#[test]
fn test_fine_dense_places_rooms() {
    for name in ["a", "b", "fine and dense", "0"] {
        let dungeon = build(name, config(DungeonSize::Fine, DungeonLayout::Rectangle, RoomLayout::Dense));
        assert!(!dungeon.rooms().is_empty(), "no rooms for {name}");
    }
}

#[test]
fn test_room_overlapping_two_rooms_rejected() {
    let cfg = config(DungeonSize::Fine, DungeonLayout::Square, RoomLayout::Scattered);
    let mut generator = Generator::new("overlap", cfg, Isaac64::default());
    assert_eq!(generator.try_place_room(RoomProto::exact(0, 0, 3, 3)), Some(1));
    assert_eq!(generator.try_place_room(RoomProto::exact(0, 4, 3, 3)), Some(2));
    // Columns 3..=11 reach into both rooms.
    assert_eq!(generator.try_place_room(RoomProto::exact(0, 1, 5, 3)), None);
    // Inside room 1 only.
    assert_eq!(generator.try_place_room(RoomProto::exact(1, 1, 2, 2)), Some(3));
    assert_eq!(generator.rooms().len(), 3);
}

#[test]
fn test_room_cap() {
    let cfg = config(DungeonSize::Colossal, DungeonLayout::Square, RoomLayout::Scattered);
    let mut generator = Generator::new("crowded", cfg, Isaac64::default());
    let n = generator.grid().n_i() - 1;
    let mut placed = 0;
    'outer: for i in 0..n {
        for j in 0..n {
            if generator.try_place_room(RoomProto::exact(i, j, 1, 1)).is_none() {
                break 'outer;
            }
            placed += 1;
        }
    }
    assert_eq!(placed, MAX_ROOMS as usize);
    assert_eq!(generator.rooms().last().map(|r| r.id), Some(MAX_ROOMS));
}

#[test]
fn test_no_double_connections() {
    for (k, cfg) in sample_configs().into_iter().enumerate() {
        let dungeon = build(&format!("pairs-{k}"), cfg);
        let mut pairs: BTreeMap<(u16, u16), BTreeSet<(usize, usize)>> = BTreeMap::new();
        for door in dungeon.doors() {
            if let Some(out) = door.out_id {
                let key = (door.room_id.min(out), door.room_id.max(out));
                pairs.entry(key).or_default().insert((door.row, door.col));
            }
        }
        for (pair, doors) in pairs {
            assert_eq!(doors.len(), 1, "rooms {pair:?} joined twice");
        }
    }
}

#[test]
fn test_rooms_are_sealed_by_perimeter_or_door() {
    for (k, cfg) in sample_configs().into_iter().enumerate() {
        let dungeon = build(&format!("walls-{k}"), cfg);
        let grid = dungeon.grid();
        for ((r, c), cell) in grid.iter() {
            if !cell.contains(CellFlags::ROOM) {
                continue;
            }
            for dir in Direction::ALL {
                let n = grid.at(r as isize + dir.di(), c as isize + dir.dj());
                assert!(
                    n.intersects(CellFlags::ROOM | CellFlags::PERIMETER | CellFlags::DOOR_SPACE),
                    "config {k}: room cell ({r},{c}) leaks {dir}"
                );
            }
        }
    }
}

#[test]
fn test_surviving_doors_join_open_space() {
    for (k, cfg) in sample_configs().into_iter().enumerate() {
        let dungeon = build(&format!("doors-{k}"), cfg);
        let grid = dungeon.grid();
        for room in dungeon.rooms().values() {
            for (dir, doors) in &room.doors {
                for door in doors {
                    let (r, c) = (door.row as isize, door.col as isize);
                    assert!(grid.at(r, c).is_open());
                    assert!(grid.at(r, c).intersects(CellFlags::DOOR_SPACE));
                    assert!(grid.at(r + dir.di(), c + dir.dj()).is_open());
                    assert!(grid.at(r - dir.di(), c - dir.dj()).is_open());
                    assert_eq!(door.room_id, room.id);
                }
            }
        }
    }
}

/// Number of 4-connected pieces of open space.
fn open_pieces(grid: &Grid) -> usize {
    let (h, w) = (grid.height(), grid.width());
    let mut seen = vec![false; h * w];
    let mut pieces = 0;
    for ((r, c), cell) in grid.iter() {
        if !cell.is_open() || seen[r * w + c] {
            continue;
        }
        pieces += 1;
        seen[r * w + c] = true;
        let mut queue = VecDeque::from([(r, c)]);
        while let Some((r, c)) = queue.pop_front() {
            for dir in Direction::ALL {
                let (nr, nc) = (r as isize + dir.di(), c as isize + dir.dj());
                if !grid.at(nr, nc).is_open() {
                    continue;
                }
                let idx = nr as usize * w + nc as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back((nr as usize, nc as usize));
                }
            }
        }
    }
    pieces
}

#[test]
fn test_open_space_is_one_piece() {
    let mut configs = sample_configs();
    let layouts = [
        DungeonLayout::Rectangle,
        DungeonLayout::Box,
        DungeonLayout::Cross,
        DungeonLayout::Keep,
        DungeonLayout::Hexagon,
        DungeonLayout::Round,
    ];
    for (k, layout) in layouts.into_iter().enumerate() {
        for rooms in RoomLayout::iter() {
            for dead_ends in DeadEnds::iter() {
                let mut c = config(DungeonSize::Fine, layout, rooms);
                c.corridor_layout = CorridorLayout::iter().nth(k % 3).unwrap_or_default();
                c.remove_deadends = dead_ends;
                c.stairs = Stairs::Many;
                configs.push(c);
            }
        }
    }
    for (k, cfg) in configs.into_iter().enumerate() {
        for name in ["north", "south"] {
            let dungeon = build(&format!("{name}-{k}"), cfg);
            assert_eq!(open_pieces(dungeon.grid()), 1, "{name}-{k}: {cfg:?}");
            for stair in dungeon.stairs() {
                assert!(dungeon.cell(stair.next_col, stair.next_row).unwrap().is_open());
            }
        }
    }
}

#[test]
fn test_stairs_survive_collapse() {
    let mut cfg = config(DungeonSize::Small, DungeonLayout::Square, RoomLayout::Sparse);
    cfg.corridor_layout = CorridorLayout::Maze;
    cfg.remove_deadends = DeadEnds::Remove;
    cfg.stairs = Stairs::Yes;
    let dungeon = build("stairwell", cfg);
    assert!(dungeon.stairs().len() <= 2);
    for stair in dungeon.stairs() {
        let cell = dungeon.cell(stair.col, stair.row).unwrap();
        assert!(cell.contains(stair.kind.flag()));
        assert!(cell.is_open());
    }
    let text = dungeon.render_text();
    if let Some(first) = dungeon.stairs().first() {
        assert_eq!(first.kind, dv_core::StairKind::Down);
        assert!(text.contains('>'));
    }
}

#[test]
fn test_room_info_matches_grid() {
    let dungeon = build("info", Config::default());
    for (id, info) in dungeon.rooms() {
        assert_eq!(*id, info.id);
        assert_eq!(info.x % 2, 1);
        assert_eq!(info.y % 2, 1);
        assert!(info.x + info.width < dungeon.width());
        assert!(info.y + info.height < dungeon.height());
    }
    let ids: Vec<u16> = dungeon.rooms().keys().copied().collect();
    let expected: Vec<u16> = (1..=ids.len() as u16).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_json_output() {
    let dungeon = build("json", config(DungeonSize::Fine, DungeonLayout::Box, RoomLayout::Scattered));
    let json = dungeon.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], "json");
    assert_eq!(value["config"]["dungeon_layout"], "box");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_same_name_same_dungeon(name in "[a-zA-Z0-9 ]{0,16}") {
        let cfg = config(DungeonSize::Fine, DungeonLayout::Rectangle, RoomLayout::Scattered);
        let a = build(&name, cfg);
        let b = build(&name, cfg);
        prop_assert_eq!(a.grid(), b.grid());
        prop_assert_eq!(a.stairs(), b.stairs());
    }
}
