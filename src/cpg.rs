//! Corner-point graph over a grid.
//!
//! Nodes are convex corner cells, identified by their padded grid id: a
//! traversable cell with a blocked diagonal neighbour whose two flanking
//! cells are open. Edges are taut one- or two-leg octile segments found by
//! corner-stopping scans; both leg orders (diagonal-then-straight and
//! straight-then-diagonal) are generated so every edge has a valid
//! reversal. Start and target cells are inserted per query and removed by
//! `clear()`.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::gridmap::GridMap;
use crate::jps::{Direction, CARDINALS, DIAGONALS};
use crate::node::INF_ID;
use crate::SQRT2;

pub struct CornerPointGraph {
    map: Arc<GridMap>,
    corners: FxHashSet<u32>,
    corner_list: Vec<u32>,
    adj: FxHashMap<u32, Vec<(u32, f64)>>,
    start: u32,
    target: u32,
    patched: Vec<u32>,
}

impl CornerPointGraph {
    pub fn new(map: Arc<GridMap>) -> Self {
        let mut g = CornerPointGraph {
            map,
            corners: FxHashSet::default(),
            corner_list: Vec::new(),
            adj: FxHashMap::default(),
            start: INF_ID,
            target: INF_ID,
            patched: Vec::new(),
        };
        g.find_corners();
        for i in 0..g.corner_list.len() {
            let c = g.corner_list[i];
            let mut edges = Vec::new();
            g.scans_from(c, |id, g| g.corners.contains(&id), &mut edges);
            g.adj.insert(c, edges);
        }
        g
    }

    pub fn map(&self) -> &Arc<GridMap> {
        &self.map
    }

    #[inline(always)]
    pub fn is_corner(&self, id: u32) -> bool {
        self.corners.contains(&id)
    }

    pub fn corner_ids(&self) -> &[u32] {
        &self.corner_list
    }

    pub fn num_corners(&self) -> usize {
        self.corner_list.len()
    }

    pub fn neighbours(&self, id: u32) -> &[(u32, f64)] {
        self.adj.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All static edges, for offline processing (e.g. contraction).
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.adj
            .iter()
            .flat_map(|(&tail, heads)| heads.iter().map(move |&(head, cost)| (tail, head, cost)))
    }

    /// Insert an extra edge (used when shortcuts are laid over the graph).
    pub fn add_edge(&mut self, tail: u32, head: u32, cost: f64) {
        self.adj.entry(tail).or_default().push((head, cost));
    }

    /// Make `start` and `target` nodes of the graph for one query.
    pub fn insert(&mut self, start: u32, target: u32) {
        debug_assert!(self.start == INF_ID && self.target == INF_ID);
        self.start = start;
        self.target = target;
        if !self.is_corner(target) {
            let mut reach = Vec::new();
            self.scans_from(target, |id, g| g.corners.contains(&id), &mut reach);
            for (s, cost) in reach {
                self.adj.entry(s).or_default().push((target, cost));
                self.patched.push(s);
            }
        }
        if !self.is_corner(start) {
            let mut edges = Vec::new();
            let target_cell = target;
            self.scans_from(
                start,
                move |id, g| id == target_cell || g.corners.contains(&id),
                &mut edges,
            );
            self.adj.insert(start, edges);
        }
    }

    /// Remove the per-query start/target nodes and their edges.
    pub fn clear(&mut self) {
        if self.start != INF_ID && !self.is_corner(self.start) {
            self.adj.remove(&self.start);
        }
        if self.target != INF_ID {
            let target = self.target;
            for s in self.patched.drain(..) {
                if let Some(edges) = self.adj.get_mut(&s) {
                    edges.retain(|e| e.0 != target);
                }
            }
        }
        self.start = INF_ID;
        self.target = INF_ID;
    }

    pub fn get_xy(&self, id: u32) -> (i32, i32) {
        let (x, y) = self.map.to_unpadded_xy(id);
        (x as i32, y as i32)
    }

    pub fn mem(&self) -> usize {
        let edges: usize = self
            .adj
            .values()
            .map(|v| v.capacity() * std::mem::size_of::<(u32, f64)>())
            .sum();
        std::mem::size_of::<Self>()
            + self.corner_list.capacity() * std::mem::size_of::<u32>() * 2
            + edges
            + self.map.mem()
    }

    fn find_corners(&mut self) {
        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let id = self.map.to_padded_id_xy(x, y);
                if !self.map.get(id) {
                    continue;
                }
                let n = self.map.neighbours(id);
                for d in DIAGONALS {
                    let (dx, dy) = d.delta();
                    if !n.t(dx, dy) && n.t(dx, 0) && n.t(0, dy) {
                        self.corners.insert(id);
                        self.corner_list.push(id);
                        break;
                    }
                }
            }
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
        if !self.map.get((from as i64 + dy as i64 * pw + dx as i64) as u32) {
            return false;
        }
        if d.is_diagonal() {
            self.map.get((from as i64 + dx as i64) as u32)
                && self.map.get((from as i64 + dy as i64 * pw) as u32)
        } else {
            true
        }
    }

    /// Walk from `origin` in `d` until a stop cell or a wall; the walk
    /// never continues past a stop.
    fn walk<F: Fn(u32, &Self) -> bool>(
        &self,
        origin: u32,
        d: Direction,
        stops: &F,
    ) -> Option<(u32, u32)> {
        let offset = self.offset(d);
        let mut cur = origin;
        let mut steps = 0u32;
        loop {
            if !self.step_legal(d, cur) {
                return None;
            }
            cur = (cur as i64 + offset) as u32;
            steps += 1;
            if stops(cur, self) {
                return Some((cur, steps));
            }
        }
    }

    /// Emit every taut one- or two-leg segment from `origin` that ends at a
    /// stop cell without crossing another one.
    fn scans_from<F: Fn(u32, &Self) -> bool>(
        &self,
        origin: u32,
        stops: F,
        out: &mut Vec<(u32, f64)>,
    ) {
        // diagonal first, then a straight leg
        for d in DIAGONALS {
            let (c1, c2) = d.components();
            let offset = self.offset(d);
            let mut cur = origin;
            let mut k = 0u32;
            loop {
                if !self.step_legal(d, cur) {
                    break;
                }
                cur = (cur as i64 + offset) as u32;
                k += 1;
                if stops(cur, self) {
                    out.push((cur, k as f64 * SQRT2));
                    break;
                }
                for cd in [c1, c2] {
                    if let Some((s, j)) = self.walk(cur, cd, &stops) {
                        out.push((s, k as f64 * SQRT2 + j as f64));
                    }
                }
            }
        }
        // straight first, then a diagonal leg
        for d in CARDINALS {
            let offset = self.offset(d);
            let mut cur = origin;
            let mut j = 0u32;
            loop {
                if !self.step_legal(d, cur) {
                    break;
                }
                cur = (cur as i64 + offset) as u32;
                j += 1;
                if stops(cur, self) {
                    out.push((cur, j as f64));
                    break;
                }
                for dd in DIAGONALS {
                    let (ddx, ddy) = dd.delta();
                    let (dx, dy) = d.delta();
                    // only diagonals that keep the heading taut
                    if ddx * dx + ddy * dy != 1 {
                        continue;
                    }
                    if let Some((s, k)) = self.walk(cur, dd, &stops) {
                        out.push((s, j as f64 + k as f64 * SQRT2));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpg(rows: &[&str]) -> CornerPointGraph {
        let text = format!(
            "type octile\nheight {}\nwidth {}\nmap\n{}\n",
            rows.len(),
            rows[0].len(),
            rows.join("\n")
        );
        CornerPointGraph::new(Arc::new(GridMap::parse(&text).unwrap()))
    }

    #[test]
    fn empty_map_has_no_corners() {
        let g = cpg(&["...", "...", "..."]);
        assert_eq!(g.num_corners(), 0);
    }

    #[test]
    fn single_block_yields_four_corners() {
        let g = cpg(&["...", ".@.", "..."]);
        // the four diagonal neighbours of the block are convex corners
        assert_eq!(g.num_corners(), 4);
        let m = g.map().clone();
        for (x, y) in [(0, 0), (2, 0), (0, 2), (2, 2)] {
            assert!(g.is_corner(m.to_padded_id_xy(x, y)), "({}, {})", x, y);
        }
    }

    #[test]
    fn query_insertion_is_reverted_by_clear() {
        let g = &mut cpg(&["...", ".@.", "..."]);
        let m = g.map().clone();
        let start = m.to_padded_id_xy(1, 0);
        let target = m.to_padded_id_xy(1, 2);
        let static_edges: usize = g.edges().count();
        g.insert(start, target);
        assert!(!g.neighbours(start).is_empty());
        g.clear();
        assert_eq!(g.edges().count(), static_edges);
        assert!(g.neighbours(start).is_empty());
    }

    #[test]
    fn direct_visibility_on_empty_map() {
        let g = &mut cpg(&[".....", ".....", ".....", ".....", "....."]);
        let m = g.map().clone();
        let start = m.to_padded_id_xy(0, 0);
        let target = m.to_padded_id_xy(3, 1);
        g.insert(start, target);
        let found = g
            .neighbours(start)
            .iter()
            .find(|e| e.0 == target)
            .copied()
            .expect("target should be directly reachable");
        assert!((found.1 - (SQRT2 + 2.0)).abs() < 1e-9);
    }
}
