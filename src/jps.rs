//! Jump Point Search primitives: travel directions, successor pruning and
//! the jump locator.
//!
//! The movement model forbids corner cutting: a diagonal step is legal only
//! when both of its orthogonal components are traversable. Under that model
//! forced neighbours exist only for cardinal travel and are detected by a
//! blocked cell on the parent side of the orthogonal neighbour; diagonal
//! travel has none.
//!
//! Horizontal scans run over 64-bit row windows of the packed map. Vertical
//! scans reuse the same code on a rotated-by-90 copy of the map. Diagonal
//! scans step cell by cell, probing a cardinal scan from each cell.

use std::sync::Arc;

use crate::gridmap::{GridMap, Nbhd};
use crate::node::INF_ID;

/// Travel direction into a cell. `None` marks a start node (no pruning).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
    None = 8,
}

use Direction::*;

pub const CARDINALS: [Direction; 4] = [North, East, South, West];
pub const DIAGONALS: [Direction; 4] = [NorthEast, SouthEast, SouthWest, NorthWest];

impl Direction {
    /// (dx, dy) unit step; y grows southward.
    #[inline(always)]
    pub fn delta(self) -> (i32, i32) {
        match self {
            North => (0, -1),
            NorthEast => (1, -1),
            East => (1, 0),
            SouthEast => (1, 1),
            South => (0, 1),
            SouthWest => (-1, 1),
            West => (-1, 0),
            NorthWest => (-1, -1),
            None => (0, 0),
        }
    }

    #[inline(always)]
    pub fn from_delta(dx: i32, dy: i32) -> Direction {
        match (dx.signum(), dy.signum()) {
            (0, -1) => North,
            (1, -1) => NorthEast,
            (1, 0) => East,
            (1, 1) => SouthEast,
            (0, 1) => South,
            (-1, 1) => SouthWest,
            (-1, 0) => West,
            (-1, -1) => NorthWest,
            _ => None,
        }
    }

    /// Direction of the final step of a diagonal-then-straight jump from
    /// `(fx, fy)` to `(tx, ty)`: the major axis when the displacement is not
    /// an exact diagonal, the diagonal itself otherwise.
    pub fn between(fx: i32, fy: i32, tx: i32, ty: i32) -> Direction {
        let dx = tx - fx;
        let dy = ty - fy;
        if dx.abs() > dy.abs() {
            Direction::from_delta(dx, 0)
        } else if dy.abs() > dx.abs() {
            Direction::from_delta(0, dy)
        } else {
            Direction::from_delta(dx, dy)
        }
    }

    /// Direction of the first step of a straight or diagonal-then-straight
    /// segment: diagonal whenever both axes move.
    pub fn first_leg(fx: i32, fy: i32, tx: i32, ty: i32) -> Direction {
        Direction::from_delta(tx - fx, ty - fy)
    }

    #[inline(always)]
    pub fn is_diagonal(self) -> bool {
        matches!(self, NorthEast | SouthEast | SouthWest | NorthWest)
    }

    /// The two cardinal components of a diagonal direction.
    #[inline(always)]
    pub fn components(self) -> (Direction, Direction) {
        match self {
            NorthEast => (North, East),
            SouthEast => (South, East),
            SouthWest => (South, West),
            NorthWest => (North, West),
            _ => (self, self),
        }
    }
}

/// Small set of directions, one bit per `Direction` discriminant.
#[derive(Clone, Copy, Default, Debug)]
pub struct DirSet(u8);

impl DirSet {
    #[inline(always)]
    pub fn insert(&mut self, d: Direction) {
        self.0 |= 1 << d as u8;
    }

    #[inline(always)]
    pub fn contains(self, d: Direction) -> bool {
        self.0 >> d as u8 & 1 == 1
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        const ALL: [Direction; 8] = [
            North, NorthEast, East, SouthEast, South, SouthWest, West, NorthWest,
        ];
        ALL.into_iter().filter(move |&d| self.contains(d))
    }
}

/// Pruned successor directions for a cell entered travelling `d`, given its
/// 3x3 neighbourhood. Every returned direction is a legal first step.
pub fn successors(d: Direction, n: Nbhd) -> DirSet {
    let mut set = DirSet::default();
    let add_cardinal = |set: &mut DirSet, dir: Direction| {
        let (dx, dy) = dir.delta();
        if n.t(dx, dy) {
            set.insert(dir);
        }
    };
    let add_diagonal = |set: &mut DirSet, dir: Direction| {
        let (dx, dy) = dir.delta();
        if n.t(dx, dy) && n.t(dx, 0) && n.t(0, dy) {
            set.insert(dir);
        }
    };
    match d {
        None => {
            for dir in CARDINALS {
                add_cardinal(&mut set, dir);
            }
            for dir in DIAGONALS {
                add_diagonal(&mut set, dir);
            }
        }
        North | East | South | West => {
            let (dx, dy) = d.delta();
            add_cardinal(&mut set, d);
            // forced: the cell orthogonal to d is open while the cell
            // diagonally behind it (on the parent side) is blocked
            let (ox, oy) = (dy, dx); // one orthogonal of d
            for (sx, sy) in [(ox, oy), (-ox, -oy)] {
                if n.t(sx, sy) && !n.t(sx - dx, sy - dy) {
                    set.insert(Direction::from_delta(sx, sy));
                    add_diagonal(&mut set, Direction::from_delta(sx + dx, sy + dy));
                }
            }
        }
        _ => {
            let (dx, dy) = d.delta();
            add_cardinal(&mut set, Direction::from_delta(dx, 0));
            add_cardinal(&mut set, Direction::from_delta(0, dy));
            add_diagonal(&mut set, d);
        }
    }
    set
}

/// Outcome of one cardinal scan.
#[derive(Clone, Copy, Debug)]
pub struct CardinalScan {
    /// Steps to the jump point, when one exists before a wall.
    pub jump: Option<u32>,
    /// Steps to the last traversable cell of the corridor.
    pub free: u32,
}

const WINDOW: u32 = 57;
const WMASK: u64 = (1 << 57) - 1;

/// Shared scan core over (mid, above, below) row windows at increasing
/// offsets from the origin. `t_off` is the step count to the target when it
/// lies on this corridor, else `INF_ID`.
fn scan_windows<F: Fn(u32) -> (u64, u64, u64)>(windows: F, t_off: u32) -> CardinalScan {
    let mut base = 0u32;
    loop {
        let (m, a, b) = windows(base);
        let m = m & WMASK;
        let a = a & WMASK;
        let b = b & WMASK;
        // cells base..base+free-1 are traversable
        let free = (!m).trailing_zeros();
        debug_assert!(free >= 1, "scan origin must be traversable");
        // forced at step k: side cell open while the side cell one step
        // back (parent side) is blocked
        let forced = ((a & !(a << 1)) | (b & !(b << 1))) & WMASK & !1;
        let mut k = forced.trailing_zeros();
        if t_off != INF_ID {
            let rem = t_off - base;
            if rem < k {
                k = rem;
            }
        }
        if k >= 1 && k < free {
            return CardinalScan {
                jump: Some(base + k),
                free: base + free - 1,
            };
        }
        if free < WINDOW {
            return CardinalScan {
                jump: Option::None,
                free: base + free - 1,
            };
        }
        base += WINDOW - 1;
    }
}

/// A grid map paired with its rotated-by-90 copy for fast vertical scans.
pub struct JumpMap {
    map: Arc<GridMap>,
    rmap: GridMap,
}

impl JumpMap {
    pub fn new(map: Arc<GridMap>) -> Self {
        // rotate: (x, y) -> (height - y - 1, x)
        let mut rmap = GridMap::new(map.height(), map.width());
        for y in 0..map.height() {
            for x in 0..map.width() {
                if map.get(map.to_padded_id_xy(x, y)) {
                    let rid = rmap.to_padded_id_xy(map.height() - y - 1, x);
                    rmap.set_label(rid, true);
                }
            }
        }
        JumpMap { map, rmap }
    }

    #[inline(always)]
    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn map_id_to_rmap_id(&self, id: u32) -> u32 {
        if id == INF_ID {
            return INF_ID;
        }
        let (x, y) = self.map.to_unpadded_xy(id);
        self.rmap.to_padded_id_xy(self.map.height() - y - 1, x)
    }

    pub fn rmap_id_to_map_id(&self, rid: u32) -> u32 {
        if rid == INF_ID {
            return INF_ID;
        }
        let (rx, ry) = self.rmap.to_unpadded_xy(rid);
        self.map.to_padded_id_xy(ry, self.map.height() - rx - 1)
    }

    /// Is the diagonal step `d` legal out of `id`?
    #[inline(always)]
    pub fn diagonal_step_ok(&self, d: Direction, id: u32) -> bool {
        let (dx, dy) = d.delta();
        let pw = self.map.padded_width() as i64;
        let base = id as i64;
        self.map.get((base + dx as i64) as u32)
            && self.map.get((base + dy as i64 * pw) as u32)
            && self.map.get((base + dy as i64 * pw + dx as i64) as u32)
    }

    /// Full cardinal scan from `id` travelling `d`; reports both the jump
    /// point (if any) and the corridor length, which the table-driven
    /// policies need for their target adjustments.
    pub fn cardinal_scan(&self, d: Direction, id: u32, target: u32) -> CardinalScan {
        match d {
            East => Self::scan_east(&self.map, id, target),
            West => Self::scan_west(&self.map, id, target),
            North => Self::scan_east(
                &self.rmap,
                self.map_id_to_rmap_id(id),
                self.map_id_to_rmap_id(target),
            ),
            South => Self::scan_west(
                &self.rmap,
                self.map_id_to_rmap_id(id),
                self.map_id_to_rmap_id(target),
            ),
            _ => unreachable!("cardinal_scan given a diagonal direction"),
        }
    }

    /// Cardinal jump: padded id of the jump point and its step count.
    pub fn jump_cardinal(&self, d: Direction, id: u32, target: u32) -> Option<(u32, u32)> {
        let scan = self.cardinal_scan(d, id, target);
        scan.jump.map(|steps| (self.step_by(d, id, steps), steps))
    }

    /// Diagonal jump: stops at the target or at the first cell from which a
    /// component cardinal jump succeeds.
    pub fn jump_diagonal(&self, d: Direction, id: u32, target: u32) -> Option<(u32, u32)> {
        debug_assert!(d.is_diagonal());
        let (c1, c2) = d.components();
        let (dx, dy) = d.delta();
        let step = dy as i64 * self.map.padded_width() as i64 + dx as i64;
        let mut cur = id;
        let mut k = 0u32;
        loop {
            if !self.diagonal_step_ok(d, cur) {
                return Option::None;
            }
            cur = (cur as i64 + step) as u32;
            k += 1;
            if cur == target {
                return Some((cur, k));
            }
            if self.cardinal_scan(c1, cur, target).jump.is_some()
                || self.cardinal_scan(c2, cur, target).jump.is_some()
            {
                return Some((cur, k));
            }
        }
    }

    /// Padded id `steps` cells from `id` in direction `d`.
    #[inline(always)]
    pub fn step_by(&self, d: Direction, id: u32, steps: u32) -> u32 {
        let (dx, dy) = d.delta();
        let off = (dy as i64 * self.map.padded_width() as i64 + dx as i64) * steps as i64;
        (id as i64 + off) as u32
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>() + self.map.mem() + self.rmap.mem()
    }

    fn scan_east(map: &GridMap, id: u32, target: u32) -> CardinalScan {
        let pw = map.padded_width();
        let t_off = if target != INF_ID && target / pw == id / pw && target > id {
            target - id
        } else {
            INF_ID
        };
        scan_windows(
            |base| {
                let at = id + base;
                (
                    map.row_bits(at),
                    map.row_bits(at - pw),
                    map.row_bits(at + pw),
                )
            },
            t_off,
        )
    }

    fn scan_west(map: &GridMap, id: u32, target: u32) -> CardinalScan {
        let pw = map.padded_width();
        let t_off = if target != INF_ID && target / pw == id / pw && target < id {
            id - target
        } else {
            INF_ID
        };
        scan_windows(
            |base| {
                let at = id - base;
                (
                    map.row_bits_rev(at),
                    map.row_bits_rev(at - pw),
                    map.row_bits_rev(at + pw),
                )
            },
            t_off,
        )
    }
}
