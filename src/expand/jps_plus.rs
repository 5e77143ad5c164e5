//! Table-driven Jump Point Search.
//!
//! Per cell and per direction the table stores the online jump result:
//! positive entries are the distance to the next jump point, non-positive
//! entries are minus the distance to the last traversable cell before a
//! wall. Tables are built by running the online jump with no target, so
//! precomputation is consistent with the online algorithm by construction;
//! target adjustments happen at query time.

use std::sync::Arc;

use crate::expand::jps_policy::refresh_pdir;
use crate::expand::ExpansionPolicy;
use crate::gridmap::GridMap;
use crate::jps::{self, Direction, JumpMap, CARDINALS, DIAGONALS};
use crate::node::{NodePool, SearchNode, INF_ID};
use crate::search::ProblemInstance;
use crate::SQRT2;

struct JumpTables {
    jm: JumpMap,
    table: Vec<[i32; 8]>,
}

impl JumpTables {
    fn build(map: Arc<GridMap>) -> Self {
        let jm = JumpMap::new(map);
        let map = jm.map();
        let mut table = vec![[0i32; 8]; map.padded_area() as usize];
        for y in 0..map.height() {
            for x in 0..map.width() {
                let id = map.to_padded_id_xy(x, y);
                if !map.get(id) {
                    continue;
                }
                let entry = &mut table[id as usize];
                for d in CARDINALS {
                    let scan = jm.cardinal_scan(d, id, INF_ID);
                    entry[d as usize] = match scan.jump {
                        Some(steps) => steps as i32,
                        None => -(scan.free as i32),
                    };
                }
                for d in DIAGONALS {
                    entry[d as usize] = match jm.jump_diagonal(d, id, INF_ID) {
                        Some((_, steps)) => steps as i32,
                        None => {
                            let mut cur = id;
                            let mut steps = 0i32;
                            while jm.diagonal_step_ok(d, cur) {
                                cur = jm.step_by(d, cur, 1);
                                steps += 1;
                            }
                            -steps
                        }
                    };
                }
            }
        }
        JumpTables { jm, table }
    }

    #[inline(always)]
    fn entry(&self, id: u32, d: Direction) -> i32 {
        self.table[id as usize][d as usize]
    }

    /// Steps to the target along the ray `d` from `id`, when aligned.
    fn aligned_steps(&self, d: Direction, id: u32, target: u32) -> Option<u32> {
        if target == INF_ID {
            return None;
        }
        let map = self.jm.map();
        let (x, y) = map.to_unpadded_xy(id);
        let (tx, ty) = map.to_unpadded_xy(target);
        let (dx, dy) = d.delta();
        let ox = tx as i32 - x as i32;
        let oy = ty as i32 - y as i32;
        if ox * dy != oy * dx {
            // not on the ray's line (one of dx, dy is zero for cardinals)
            return None;
        }
        let steps = if dx != 0 { ox * dx } else { oy * dy };
        (steps > 0).then_some(steps as u32)
    }

    /// Steps along diagonal `d` until the target's row or column is
    /// crossed.
    fn crossing_steps(&self, d: Direction, id: u32, target: u32) -> Option<u32> {
        if target == INF_ID {
            return None;
        }
        let map = self.jm.map();
        let (x, y) = map.to_unpadded_xy(id);
        let (tx, ty) = map.to_unpadded_xy(target);
        let (dx, dy) = d.delta();
        let row = (ty as i32 - y as i32) * dy;
        let col = (tx as i32 - x as i32) * dx;
        let mut best = u32::MAX;
        if row > 0 {
            best = best.min(row as u32);
        }
        if col > 0 {
            best = best.min(col as u32);
        }
        (best != u32::MAX).then_some(best)
    }

    /// Cardinal table lookup with target adjustment: the successor cell and
    /// its step count, if the scan yields one.
    fn cardinal_successor(&self, d: Direction, id: u32, target: u32) -> Option<(u32, u32)> {
        let entry = self.entry(id, d);
        let avail = entry.unsigned_abs();
        if let Some(steps) = self.aligned_steps(d, id, target) {
            if steps <= avail && (entry <= 0 || steps <= entry as u32) {
                return Some((target, steps));
            }
        }
        (entry > 0).then(|| (self.jm.step_by(d, id, entry as u32), entry as u32))
    }

    fn mem(&self) -> usize {
        self.jm.mem() + self.table.capacity() * std::mem::size_of::<[i32; 8]>()
    }
}

/// JPS with precomputed jump tables; same successor structure as the
/// online `JpsPolicy`.
pub struct JpsPlusPolicy {
    tables: JumpTables,
    succ: Vec<(u32, f64)>,
}

impl JpsPlusPolicy {
    pub fn new(map: Arc<GridMap>) -> Self {
        JpsPlusPolicy {
            tables: JumpTables::build(map),
            succ: Vec::with_capacity(8),
        }
    }
}

impl ExpansionPolicy for JpsPlusPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let pdir = pool.node(id).pdir();
        let map = self.tables.jm.map();
        let dirs = jps::successors(pdir, map.neighbours(id));
        for d in dirs.iter() {
            if !d.is_diagonal() {
                if let Some((jid, steps)) = self.tables.cardinal_successor(d, id, pi.target_id) {
                    let n = pool.generate(jid, pi.instance_id);
                    if !n.reached() {
                        n.set_pdir(d);
                    }
                    self.succ.push((jid, steps as f64));
                }
                continue;
            }
            let entry = self.tables.entry(id, d);
            let avail = entry.unsigned_abs();
            let crossing = self.tables.crossing_steps(d, id, pi.target_id);
            let steps = match crossing {
                Some(m) if m <= avail && (entry <= 0 || m <= entry as u32) => Some(m),
                _ => (entry > 0).then_some(entry as u32),
            };
            if let Some(steps) = steps {
                let jid = self.tables.jm.step_by(d, id, steps);
                let n = pool.generate(jid, pi.instance_id);
                if !n.reached() {
                    n.set_pdir(d);
                }
                self.succ.push((jid, steps as f64 * SQRT2));
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
        let map = self.tables.jm.map();
        let id = map.to_padded_id(pi.start_id);
        map.get(id).then_some(id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let map = self.tables.jm.map();
        let id = map.to_padded_id(pi.target_id);
        map.get(id).then_some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.tables.jm.map().to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        refresh_pdir(self.tables.jm.map(), node);
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.tables.mem()
    }
}

/// JPS2 successor structure driven by the tables: diagonal prefixes hop
/// between tabulated diagonal jump points, cardinal legs come from table
/// lookups. Needs the on-relax hook, like `Jps2Policy`.
pub struct Jps2PlusPolicy {
    tables: JumpTables,
    succ: Vec<(u32, f64)>,
}

impl Jps2PlusPolicy {
    pub fn new(map: Arc<GridMap>) -> Self {
        Jps2PlusPolicy {
            tables: JumpTables::build(map),
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

impl ExpansionPolicy for Jps2PlusPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance) {
        self.succ.clear();
        let pdir = pool.node(id).pdir();
        let dirs = jps::successors(pdir, self.tables.jm.map().neighbours(id));
        for d in dirs.iter() {
            if !d.is_diagonal() {
                if let Some((jid, steps)) = self.tables.cardinal_successor(d, id, pi.target_id) {
                    Self::tag(pool, pi.instance_id, jid, d);
                    self.succ.push((jid, steps as f64));
                }
                continue;
            }
            let (c1, c2) = d.components();
            let mut cur = id;
            let mut prefix = 0u32;
            loop {
                let entry = self.tables.entry(cur, d);
                let avail = entry.unsigned_abs();
                if let Some(m) = self.tables.crossing_steps(d, cur, pi.target_id) {
                    if m <= avail && (entry <= 0 || m <= entry as u32) {
                        // stop at the cell level with the target; its own
                        // expansion carries on toward it
                        let jid = self.tables.jm.step_by(d, cur, m);
                        Self::tag(pool, pi.instance_id, jid, d);
                        self.succ.push((jid, (prefix + m) as f64 * SQRT2));
                        break;
                    }
                }
                if entry <= 0 {
                    break;
                }
                cur = self.tables.jm.step_by(d, cur, entry as u32);
                prefix += entry as u32;
                for cd in [c1, c2] {
                    if let Some((jid, steps)) =
                        self.tables.cardinal_successor(cd, cur, pi.target_id)
                    {
                        Self::tag(pool, pi.instance_id, jid, cd);
                        self.succ
                            .push((jid, prefix as f64 * SQRT2 + steps as f64));
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
        let map = self.tables.jm.map();
        let id = map.to_padded_id(pi.start_id);
        map.get(id).then_some(id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        let map = self.tables.jm.map();
        let id = map.to_padded_id(pi.target_id);
        map.get(id).then_some(id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.tables.jm.map().to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    fn on_relax(&mut self, node: &mut SearchNode) {
        refresh_pdir(self.tables.jm.map(), node);
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.tables.mem()
    }
}
