//! Octile expansion over terrain-weighted grids.

use std::sync::Arc;

use crate::expand::ExpansionPolicy;
use crate::jps::{CARDINALS, DIAGONALS};
use crate::node::NodePool;
use crate::search::ProblemInstance;
use crate::weighted_gridmap::WeightedGridMap;

pub struct WeightedGridPolicy {
    map: Arc<WeightedGridMap>,
    succ: Vec<(u32, f64)>,
}

impl WeightedGridPolicy {
    pub fn new(map: Arc<WeightedGridMap>) -> Self {
        WeightedGridPolicy {
            map,
            succ: Vec::with_capacity(8),
        }
    }
}

impl ExpansionPolicy for WeightedGridPolicy {
    fn expand(&mut self, id: u32, _pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let n = self.map.neighbours(id);
        let pw = self.map.padded_width() as i64;
        for d in CARDINALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) {
                let nid = (id as i64 + dy as i64 * pw + dx as i64) as u32;
                self.succ.push((nid, self.map.step_cost(id, nid, false)));
            }
        }
        for d in DIAGONALS {
            let (dx, dy) = d.delta();
            if n.t(dx, dy) && n.t(dx, 0) && n.t(0, dy) {
                let nid = (id as i64 + dy as i64 * pw + dx as i64) as u32;
                self.succ.push((nid, self.map.step_cost(id, nid, true)));
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
