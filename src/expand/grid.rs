//! Expansion over uniform-cost 8-connected grids, plus the time-expanded
//! variant used by `astar_timex`.

use std::sync::Arc;

use crate::expand::ExpansionPolicy;
use crate::gridmap::GridMap;
use crate::heuristic::{Heuristic, OctileHeuristic};
use crate::jps::{CARDINALS, DIAGONALS};
use crate::node::{NodePool, INF_ID};
use crate::search::ProblemInstance;
use crate::SQRT2;

/// Plain octile expansion: at most eight successors, diagonal steps only
/// when both orthogonal neighbours are open.
pub struct GridPolicy {
    map: Arc<GridMap>,
    succ: Vec<(u32, f64)>,
}

impl GridPolicy {
    pub fn new(map: Arc<GridMap>) -> Self {
        GridPolicy {
            map,
            succ: Vec::with_capacity(8),
        }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }
}

impl ExpansionPolicy for GridPolicy {
    fn expand(&mut self, id: u32, _pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let n = self.map.neighbours(id);
        let pw = self.map.padded_width() as i64;
        for d in CARDINALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) {
                let nid = (id as i64 + dy as i64 * pw + dx as i64) as u32;
                self.succ.push((nid, 1.0));
            }
        }
        for d in DIAGONALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) && n.t(dx, 0) && n.t(0, dy) {
                let nid = (id as i64 + dy as i64 * pw + dx as i64) as u32;
                self.succ.push((nid, SQRT2));
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

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.map.mem()
    }
}

/// Time-expanded octile grid: node id `t * padded_area + cell`, eight moves
/// plus a wait, all unit time. Stepping onto the target cell collapses onto
/// the canonical (t = 0) target node so the search terminates by id. The
/// time horizon equals the cell count: a reachable target is always
/// reachable by a simple path, so nothing optimal lies beyond it and an
/// unreachable one leaves a finite state space to exhaust.
pub struct TimexPolicy {
    map: Arc<GridMap>,
    succ: Vec<(u32, f64)>,
    target_cell: u32,
    horizon: u32,
}

impl TimexPolicy {
    pub fn new(map: Arc<GridMap>) -> Self {
        let horizon = map.width() * map.height();
        TimexPolicy {
            map,
            succ: Vec::with_capacity(9),
            target_cell: INF_ID,
            horizon,
        }
    }

    fn push(&mut self, cell: u32, t: u32, cost: f64) {
        let layered = if cell == self.target_cell {
            cell
        } else {
            t * self.map.padded_area() + cell
        };
        self.succ.push((layered, cost));
    }
}

impl ExpansionPolicy for TimexPolicy {
    fn expand(&mut self, id: u32, _pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let area = self.map.padded_area();
        let cell = id % area;
        let t = id / area;
        if t >= self.horizon {
            return;
        }
        let n = self.map.neighbours(cell);
        let pw = self.map.padded_width() as i64;
        for d in CARDINALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) {
                self.push((cell as i64 + dy as i64 * pw + dx as i64) as u32, t + 1, 1.0);
            }
        }
        for d in DIAGONALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) && n.t(dx, 0) && n.t(0, dy) {
                self.push(
                    (cell as i64 + dy as i64 * pw + dx as i64) as u32,
                    t + 1,
                    SQRT2,
                );
            }
        }
        // waiting in place costs one time step
        self.push(cell, t + 1, 1.0);
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
        if !self.map.get(id) {
            return None;
        }
        self.target_cell = id;
        Some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.map.to_unpadded_xy(id % self.map.padded_area());
        (x as i32, y as i32)
    }

    fn clear(&mut self) {
        self.target_cell = INF_ID;
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.map.mem()
    }
}

/// Octile heuristic over time-layered ids: estimate from the underlying
/// cells, ignoring the time component.
pub struct TimexOctileHeuristic {
    inner: OctileHeuristic,
    area: u32,
}

impl TimexOctileHeuristic {
    pub fn new(map: &GridMap) -> Self {
        TimexOctileHeuristic {
            inner: OctileHeuristic::new(map.padded_width()),
            area: map.padded_area(),
        }
    }
}

impl Heuristic for TimexOctileHeuristic {
    fn h(&self, from: u32, to: u32) -> f64 {
        self.inner.h(from % self.area, to % self.area)
    }
}
