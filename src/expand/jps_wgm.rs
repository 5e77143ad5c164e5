//! Jump Point Search over terrain-weighted grids.
//!
//! Scans stop wherever the 3x3 neighbourhood stops being terrain-uniform: a
//! change in terrain cost (or an adjacent obstacle) makes a jump point.
//! Stopping more often than strictly necessary never loses optimality, and
//! at non-uniform cells the octile pruning rules are unsound, so those
//! cells expand every legal direction.

use std::sync::Arc;

use crate::expand::ExpansionPolicy;
use crate::jps::{self, Direction, DirSet, CARDINALS, DIAGONALS};
use crate::node::{NodePool, SearchNode, INF_ID};
use crate::search::ProblemInstance;
use crate::weighted_gridmap::WeightedGridMap;

pub struct JpsWgmPolicy {
    map: Arc<WeightedGridMap>,
    succ: Vec<(u32, f64)>,
}

impl JpsWgmPolicy {
    pub fn new(map: Arc<WeightedGridMap>) -> Self {
        JpsWgmPolicy {
            map,
            succ: Vec::with_capacity(8),
        }
    }

    #[inline(always)]
    fn offset(&self, d: Direction) -> i64 {
        let (dx, dy) = d.delta();
        dy as i64 * self.map.padded_width() as i64 + dx as i64
    }

    fn step_legal(&self, d: Direction, from: u32) -> bool {
        let (dx, dy) = d.delta();
        let pw = self.map.padded_width() as i64;
        let to = (from as i64 + dy as i64 * pw + dx as i64) as u32;
        if !self.map.get(to) {
            return false;
        }
        if d.is_diagonal() {
            self.map.get((from as i64 + dx as i64) as u32)
                && self.map.get((from as i64 + dy as i64 * pw) as u32)
        } else {
            true
        }
    }

    /// Scan from `id` along `d`, accumulating weighted step costs, until
    /// the target, a terrain non-uniformity, or (diagonals) a cell aligned
    /// with the target. Returns the jump point and the path cost to it.
    fn jump(&self, d: Direction, id: u32, target: u32) -> Option<(u32, f64)> {
        let offset = self.offset(d);
        let diagonal = d.is_diagonal();
        let mut cur = id;
        let mut cost = 0.0;
        loop {
            if !self.step_legal(d, cur) {
                return None;
            }
            let next = (cur as i64 + offset) as u32;
            cost += self.map.step_cost(cur, next, diagonal);
            cur = next;
            if cur == target {
                return Some((cur, cost));
            }
            if !self.map.uniform_3x3(cur) {
                return Some((cur, cost));
            }
            if diagonal {
                if target != INF_ID {
                    let (x, y) = self.map.to_unpadded_xy(cur);
                    let (tx, ty) = self.map.to_unpadded_xy(target);
                    if x == tx || y == ty {
                        return Some((cur, cost));
                    }
                }
                let (c1, c2) = d.components();
                if self.jump(c1, cur, target).is_some() || self.jump(c2, cur, target).is_some() {
                    return Some((cur, cost));
                }
            }
        }
    }
}

impl ExpansionPolicy for JpsWgmPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let nbhd = self.map.neighbours(id);
        let dirs = if self.map.uniform_3x3(id) {
            jps::successors(pool.node(id).pdir(), nbhd)
        } else {
            // octile pruning assumes locally uniform costs; expand fully
            let mut set = DirSet::default();
            for d in CARDINALS.into_iter().chain(DIAGONALS) {
                let (dx, dy) = d.delta();
                let legal = if d.is_diagonal() {
                    nbhd.t(dx, dy) && nbhd.t(dx, 0) && nbhd.t(0, dy)
                } else {
                    nbhd.t(dx, dy)
                };
                if legal {
                    set.insert(d);
                }
            }
            set
        };
        for d in dirs.iter() {
            if let Some((jid, cost)) = self.jump(d, id, pi.target_id) {
                let n = pool.generate(jid, pi.instance_id);
                if !n.reached() {
                    n.set_pdir(d);
                }
                self.succ.push((jid, cost));
            }
        }
    }

    fn num_successors(&self) -> usize {
        self.succ.len()
    }

    fn successor(&self, i: usize) -> (u32, f64) {
        self.succ[i]
    }

    fn generate_start_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let id = self.map.to_padded_id(pi.start_id);
        self.map.get(id).then_some(id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let id = self.map.to_padded_id(pi.target_id);
        self.map.get(id).then_some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.map.to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        let parent = node.parent();
        if parent == INF_ID {
            node.set_pdir(Direction::None);
            return;
        }
        let (px, py) = self.map.to_unpadded_xy(parent);
        let (nx, ny) = self.map.to_unpadded_xy(node.id());
        node.set_pdir(Direction::between(
            px as i32, py as i32, nx as i32, ny as i32,
        ));
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.map.mem()
    }
}
