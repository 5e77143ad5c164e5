//! Online Jump Point Search policies.
//!
//! `JpsPolicy` yields individual jump points. `Jps2Policy` collapses the
//! intermediate diagonal jump points: its successors are the cardinal jump
//! targets reached after a diagonal prefix, so the stored arrival direction
//! is the last leg of the jump and must be refreshed by the on-relax hook
//! whenever a successor is relaxed through a different parent.

use std::sync::Arc;

use crate::expand::ExpansionPolicy;
use crate::gridmap::GridMap;
use crate::jps::{self, Direction, JumpMap};
use crate::node::{NodePool, SearchNode, INF_ID};
use crate::search::ProblemInstance;
use crate::SQRT2;

/// Recompute a node's arrival direction from its current parent: the final
/// leg of a straight or diagonal-then-straight jump.
pub(crate) fn refresh_pdir(map: &GridMap, node: &mut SearchNode) {
    let parent = node.parent();
    if parent == INF_ID {
        node.set_pdir(Direction::None);
        return;
    }
    let (px, py) = map.to_unpadded_xy(parent);
    let (nx, ny) = map.to_unpadded_xy(node.id());
    node.set_pdir(Direction::between(
        px as i32, py as i32, nx as i32, ny as i32,
    ));
}

pub struct JpsPolicy {
    jm: JumpMap,
    succ: Vec<(u32, f64)>,
}

impl JpsPolicy {
    pub fn new(map: Arc<GridMap>) -> Self {
        JpsPolicy {
            jm: JumpMap::new(map),
            succ: Vec::with_capacity(8),
        }
    }
}

impl ExpansionPolicy for JpsPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let pdir = pool.node(id).pdir();
        let dirs = jps::successors(pdir, self.jm.map().neighbours(id));
        for d in dirs.iter() {
            let jumped = if d.is_diagonal() {
                self.jm.jump_diagonal(d, id, pi.target_id)
            } else {
                self.jm.jump_cardinal(d, id, pi.target_id)
            };
            if let Some((jid, steps)) = jumped {
                let cost = steps as f64 * if d.is_diagonal() { SQRT2 } else { 1.0 };
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
        let id = self.jm.map().to_padded_id(pi.start_id);
        self.jm.map().get(id).then_some(id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let id = self.jm.map().to_padded_id(pi.target_id);
        self.jm.map().get(id).then_some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.jm.map().to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        refresh_pdir(self.jm.map(), node);
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.jm.mem()
    }
}

pub struct Jps2Policy {
    jm: JumpMap,
    succ: Vec<(u32, f64)>,
}

impl Jps2Policy {
    pub fn new(map: Arc<GridMap>) -> Self {
        Jps2Policy {
            jm: JumpMap::new(map),
            succ: Vec::with_capacity(16),
        }
    }

    fn tag(pool: &mut NodePool, epoch: u32, id: u32, d: Direction) {
        let n = pool.generate(id, epoch);
        if !n.reached() {
            n.set_pdir(d);
        }
    }
}

impl ExpansionPolicy for Jps2Policy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let pdir = pool.node(id).pdir();
        let dirs = jps::successors(pdir, self.jm.map().neighbours(id));
        for d in dirs.iter() {
            if !d.is_diagonal() {
                if let Some((jid, steps)) = self.jm.jump_cardinal(d, id, pi.target_id) {
                    Self::tag(pool, pi.instance_id, jid, d);
                    self.succ.push((jid, steps as f64));
                }
                continue;
            }
            // diagonal sweep: emit a successor for every cardinal jump that
            // succeeds from a cell on the diagonal
            let (c1, c2) = d.components();
            let mut cur = id;
            let mut k = 0u32;
            loop {
                if !self.jm.diagonal_step_ok(d, cur) {
                    break;
                }
                cur = self.jm.step_by(d, cur, 1);
                k += 1;
                if cur == pi.target_id {
                    Self::tag(pool, pi.instance_id, cur, d);
                    self.succ.push((cur, k as f64 * SQRT2));
                    break;
                }
                for cd in [c1, c2] {
                    if let Some((jid, steps)) = self.jm.jump_cardinal(cd, cur, pi.target_id) {
                        Self::tag(pool, pi.instance_id, jid, cd);
                        self.succ.push((jid, k as f64 * SQRT2 + steps as f64));
                    }
                }
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
        let id = self.jm.map().to_padded_id(pi.start_id);
        self.jm.map().get(id).then_some(id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let id = self.jm.map().to_padded_id(pi.target_id);
        self.jm.map().get(id).then_some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.jm.map().to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        refresh_pdir(self.jm.map(), node);
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.jm.mem()
    }
}
