//! Expansion policies over corner-point graphs.
//!
//! The search always generates the start node first; that call validates
//! both endpoints (still in unpadded id space) and splices them into the
//! graph for the duration of the query.

use rustc_hash::FxHashMap;

use crate::cpg::CornerPointGraph;
use crate::expand::ExpansionPolicy;
use crate::jps::{self, Direction};
use crate::node::{NodePool, SearchNode, INF_ID};
use crate::search::ProblemInstance;

fn insert_endpoints(g: &mut CornerPointGraph, pi: &ProblemInstance) -> Option<(u32, u32)> {
    let map = g.map();
    let start = map.to_padded_id(pi.start_id);
    let target = map.to_padded_id(pi.target_id);
    if !map.get(start) || !map.get(target) {
        return None;
    }
    g.insert(start, target);
    Some((start, target))
}

/// Plain corner-point-graph expansion: the visibility neighbours of the
/// current corner, with the query endpoints spliced in for one search.
pub struct CpgPolicy {
    g: CornerPointGraph,
    succ: Vec<(u32, f64)>,
    target: u32,
}

impl CpgPolicy {
    pub fn new(g: CornerPointGraph) -> Self {
        CpgPolicy {
            g,
            succ: Vec::new(),
            target: INF_ID,
        }
    }

    pub fn graph(&self) -> &CornerPointGraph {
        &self.g
    }
}

impl ExpansionPolicy for CpgPolicy {
    fn expand(&mut self, id: u32, _pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        self.succ.extend_from_slice(self.g.neighbours(id));
    }

    fn num_successors(&self) -> usize {
        self.succ.len()
    }

    fn successor(&self, i: usize) -> (u32, f64) {
        self.succ[i]
    }

    fn generate_start_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let (start, target) = insert_endpoints(&mut self.g, pi)?;
        self.target = target;
        Some(start)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        debug_assert_eq!(self.g.map().to_padded_id(pi.target_id), self.target);
        Some(self.target)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        self.g.get_xy(id)
    }

    fn clear(&mut self) {
        if self.target != INF_ID {
            self.g.clear();
            self.target = INF_ID;
        }
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.g.mem()
    }
}

/// Forward-driven CH search over a contracted corner-point graph. The rank
/// map covers the static corners; query endpoints sit below every rank, so
/// the search leaves the start ascending and reaches the target descending.
pub struct FchCpgPolicy {
    g: CornerPointGraph,
    rank: FxHashMap<u32, u32>,
    succ: Vec<(u32, f64)>,
    target: u32,
}

impl FchCpgPolicy {
    pub fn new(g: CornerPointGraph, rank: FxHashMap<u32, u32>) -> Self {
        FchCpgPolicy {
            g,
            rank,
            succ: Vec::new(),
            target: INF_ID,
        }
    }

    #[inline(always)]
    fn rank_of(&self, id: u32) -> u32 {
        self.rank.get(&id).copied().unwrap_or(0)
    }
}

impl ExpansionPolicy for FchCpgPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let my_rank = self.rank_of(id);
        let parent = pool.node(id).parent();
        let descending = parent != INF_ID && self.rank_of(parent) > my_rank;
        for &(head, cost) in self.g.neighbours(id) {
            if !descending || self.rank_of(head) < my_rank {
                self.succ.push((head, cost));
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
        let (start, target) = insert_endpoints(&mut self.g, pi)?;
        self.target = target;
        Some(start)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, _pi: &ProblemInstance) -> Option<u32> {
        Some(self.target)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        self.g.get_xy(id)
    }

    fn get_rank(&self, id: u32) -> u32 {
        self.rank_of(id)
    }

    fn clear(&mut self) {
        if self.target != INF_ID {
            self.g.clear();
            self.target = INF_ID;
        }
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.rank.len() * std::mem::size_of::<(u32, u32)>()
            + self.g.mem()
    }
}

/// Jump-point successors over a corner-point graph: edges are pruned by the
/// canonical direction set of the arrival direction. Two-leg edges are kept
/// whenever the diagonal of their displacement or either component cardinal
/// is allowed.
pub struct JpgPolicy {
    g: CornerPointGraph,
    succ: Vec<(u32, f64)>,
    target: u32,
}

impl JpgPolicy {
    pub fn new(g: CornerPointGraph) -> Self {
        JpgPolicy {
            g,
            succ: Vec::new(),
            target: INF_ID,
        }
    }
}

impl ExpansionPolicy for JpgPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let pdir = pool.node(id).pdir();
        let allowed = jps::successors(pdir, self.g.map().neighbours(id));
        let (x, y) = self.g.get_xy(id);
        for i in 0..self.g.neighbours(id).len() {
            let (head, cost) = self.g.neighbours(id)[i];
            let (hx, hy) = self.g.get_xy(head);
            let (dx, dy) = (hx - x, hy - y);
            let keep = if dx == 0 || dy == 0 {
                allowed.contains(Direction::from_delta(dx, dy))
            } else {
                allowed.contains(Direction::from_delta(dx, dy))
                    || allowed.contains(Direction::from_delta(dx, 0))
                    || allowed.contains(Direction::from_delta(0, dy))
            };
            if keep {
                let n = pool.generate(head, pi.instance_id);
                if !n.reached() {
                    n.set_pdir(Direction::between(x, y, hx, hy));
                }
                self.succ.push((head, cost));
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
        let (start, target) = insert_endpoints(&mut self.g, pi)?;
        self.target = target;
        Some(start)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, _pi: &ProblemInstance) -> Option<u32> {
        Some(self.target)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        self.g.get_xy(id)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        let parent = node.parent();
        if parent == INF_ID {
            node.set_pdir(Direction::None);
            return;
        }
        let (px, py) = self.g.get_xy(parent);
        let (nx, ny) = self.g.get_xy(node.id());
        node.set_pdir(Direction::between(px, py, nx, ny));
    }

    fn clear(&mut self) {
        if self.target != INF_ID {
            self.g.clear();
            self.target = INF_ID;
        }
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.g.mem()
    }
}
