//! Dead-end collapsing
//!
//! Collapse is driven by direction-indexed rule tables. A rule fires on a
//! cell when every `corridor` offset is a bare corridor and every `walled`
//! offset is solid; it then blanks the `close` offsets, carves `open` if
//! given, and continues from `recurse`.

use dv_rng::NumberSource;

use super::cell::{Cell, CellFlags};
use super::grid::{Direction, Grid, Offset, off};
use crate::rng::NumberSourceExt;

/// Neighbourhood test shared by collapse and stair rules
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub corridor: &'static [Offset],
    pub walled: &'static [Offset],
}

impl Pattern {
    pub fn matches(&self, grid: &Grid, r: usize, c: usize) -> bool {
        self.corridor.iter().all(|&o| grid.at_offset(r, c, o).is_bare_corridor())
            && self.walled.iter().all(|&o| !grid.at_offset(r, c, o).is_open())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub pattern: Pattern,
    pub close: &'static [Offset],
    pub open: Option<Offset>,
    pub recurse: Option<Offset>,
}

/// Rotate an offset given for north onto `dir` (clockwise in screen space).
const fn rotate(o: Offset, dir: Direction) -> Offset {
    match dir {
        Direction::North => o,
        Direction::East => off(o.dc, -o.dr),
        Direction::South => off(-o.dr, -o.dc),
        Direction::West => off(-o.dc, o.dr),
    }
}

const fn rotate_all<const N: usize>(src: [Offset; N], dir: Direction) -> [Offset; N] {
    let mut out = src;
    let mut k = 0;
    while k < N {
        out[k] = rotate(src[k], dir);
        k += 1;
    }
    out
}

const END_CLOSE: &[Offset] = &[off(0, 0)];

/// Stubs: a corridor cell walled on every side but the one it leads to.
pub const END_RULES: [(Direction, Rule); 4] = [
    (
        Direction::North,
        Rule {
            pattern: Pattern {
                corridor: &[],
                walled: &[off(0, -1), off(1, -1), off(1, 0), off(1, 1), off(0, 1)],
            },
            close: END_CLOSE,
            open: None,
            recurse: Some(off(-1, 0)),
        },
    ),
    (
        Direction::East,
        Rule {
            pattern: Pattern {
                corridor: &[],
                walled: &[off(-1, 0), off(-1, -1), off(0, -1), off(1, -1), off(1, 0)],
            },
            close: END_CLOSE,
            open: None,
            recurse: Some(off(0, 1)),
        },
    ),
    (
        Direction::South,
        Rule {
            pattern: Pattern {
                corridor: &[],
                walled: &[off(0, -1), off(-1, -1), off(-1, 0), off(-1, 1), off(0, 1)],
            },
            close: END_CLOSE,
            open: None,
            recurse: Some(off(1, 0)),
        },
    ),
    (
        Direction::West,
        Rule {
            pattern: Pattern {
                corridor: &[],
                walled: &[off(-1, 0), off(-1, 1), off(0, 1), off(1, 1), off(1, 0)],
            },
            close: END_CLOSE,
            open: None,
            recurse: Some(off(0, -1)),
        },
    ),
];

// U-shaped detour leaving north and coming back two columns east.
const ARC_CORRIDOR: [Offset; 7] = [
    off(0, 0),
    off(-1, 0),
    off(-2, 0),
    off(-2, 1),
    off(-2, 2),
    off(-1, 2),
    off(0, 2),
];
const ARC_WALLED: [Offset; 8] = [
    off(-1, 1),
    off(-1, -1),
    off(-2, -1),
    off(-3, 0),
    off(-3, 1),
    off(-3, 2),
    off(-2, 3),
    off(-1, 3),
];
const ARC_CLOSE: [Offset; 5] = [off(-1, 0), off(-2, 0), off(-2, 1), off(-2, 2), off(-1, 2)];
const ARC_OPEN: Offset = off(0, 1);

const ARC_CORRIDOR_E: [Offset; 7] = rotate_all(ARC_CORRIDOR, Direction::East);
const ARC_WALLED_E: [Offset; 8] = rotate_all(ARC_WALLED, Direction::East);
const ARC_CLOSE_E: [Offset; 5] = rotate_all(ARC_CLOSE, Direction::East);
const ARC_CORRIDOR_S: [Offset; 7] = rotate_all(ARC_CORRIDOR, Direction::South);
const ARC_WALLED_S: [Offset; 8] = rotate_all(ARC_WALLED, Direction::South);
const ARC_CLOSE_S: [Offset; 5] = rotate_all(ARC_CLOSE, Direction::South);
const ARC_CORRIDOR_W: [Offset; 7] = rotate_all(ARC_CORRIDOR, Direction::West);
const ARC_WALLED_W: [Offset; 8] = rotate_all(ARC_WALLED, Direction::West);
const ARC_CLOSE_W: [Offset; 5] = rotate_all(ARC_CLOSE, Direction::West);

const fn arc_rule(
    corridor: &'static [Offset],
    walled: &'static [Offset],
    close: &'static [Offset],
    dir: Direction,
) -> Rule {
    Rule {
        pattern: Pattern { corridor, walled },
        close,
        open: Some(rotate(ARC_OPEN, dir)),
        recurse: Some(off(0, 0)),
    }
}

/// Detours that can be replaced by the single connector between their ends.
pub const ARC_RULES: [(Direction, Rule); 4] = [
    (
        Direction::North,
        arc_rule(&ARC_CORRIDOR, &ARC_WALLED, &ARC_CLOSE, Direction::North),
    ),
    (
        Direction::East,
        arc_rule(&ARC_CORRIDOR_E, &ARC_WALLED_E, &ARC_CLOSE_E, Direction::East),
    ),
    (
        Direction::South,
        arc_rule(&ARC_CORRIDOR_S, &ARC_WALLED_S, &ARC_CLOSE_S, Direction::South),
    ),
    (
        Direction::West,
        arc_rule(&ARC_CORRIDOR_W, &ARC_WALLED_W, &ARC_CLOSE_W, Direction::West),
    ),
];

/// Cells that never collapse: stairs, and room floor crossed by a tunnel.
fn exempt(cell: Cell) -> bool {
    !cell.is_open() || cell.intersects(CellFlags::STAIRS | CellFlags::ROOM)
}

/// Whether a rule's shortcut cell, if it has one, can be carved. A detour is
/// only closed when its ends stay joined.
fn can_open(grid: &Grid, r: usize, c: usize, open: Option<Offset>) -> bool {
    let Some(o) = open else {
        return true;
    };
    let solid = CellFlags::BLOCKED | CellFlags::PERIMETER | CellFlags::ROOM;
    grid.shifted(r, c, o).is_some_and(|(or, oc)| !grid.cell(or, oc).intersects(solid))
}

/// Pending rules at one cell of the collapse chain
struct Frame {
    r: usize,
    c: usize,
    next_rule: usize,
}

/// Apply `rules` starting at `(r, c)` and follow every `recurse` chain.
/// Returns the number of open cells blanked.
///
/// Visiting order is depth first with each cell trying its remaining rules
/// after a chain returns, so a cell may fire more than one rule.
pub fn collapse(grid: &mut Grid, r: usize, c: usize, rules: &[(Direction, Rule)]) -> usize {
    let mut closed = 0;
    if exempt(grid.cell(r, c)) {
        return closed;
    }
    let mut stack = vec![Frame { r, c, next_rule: 0 }];

    while let Some(frame) = stack.last_mut() {
        let Some((_, rule)) = rules.get(frame.next_rule) else {
            stack.pop();
            continue;
        };
        frame.next_rule += 1;
        let (r, c) = (frame.r, frame.c);
        if !rule.pattern.matches(grid, r, c) || !can_open(grid, r, c, rule.open) {
            continue;
        }

        for &o in rule.close {
            if let Some((cr, cc)) = grid.shifted(r, c, o) {
                let cell = grid.cell_mut(cr, cc);
                if cell.is_open() {
                    closed += 1;
                }
                *cell = Cell::EMPTY;
            }
        }
        if let Some((or, oc)) = rule.open.and_then(|o| grid.shifted(r, c, o)) {
            grid.insert(or, oc, CellFlags::CORRIDOR);
        }
        if let Some((nr, nc)) = rule.recurse.and_then(|o| grid.shifted(r, c, o)) {
            if !exempt(grid.cell(nr, nc)) {
                stack.push(Frame {
                    r: nr,
                    c: nc,
                    next_rule: 0,
                });
            }
        }
    }
    closed
}

/// One pass over every corridor hub. Each hub is tried with probability
/// `pct` percent; at 100 no draw is made.
pub(crate) fn collapse_tunnels<R: NumberSource + ?Sized>(
    grid: &mut Grid,
    pct: u32,
    rules: &[(Direction, Rule)],
    rng: &mut R,
) -> usize {
    if pct == 0 {
        return 0;
    }
    let all = pct >= 100;
    let mut closed = 0;
    for (r, c) in grid.hubs() {
        let cell = grid.cell(r, c);
        if !cell.contains(CellFlags::CORRIDOR) || cell.intersects(CellFlags::ROOM | CellFlags::STAIRS) {
            continue;
        }
        if !all && !rng.percent(pct) {
            continue;
        }
        closed += collapse(grid, r, c, rules);
    }
    closed
}
