//! Unidirectional best-first search, parameterised by a heuristic and an
//! expansion policy.

use std::time::Instant;

use tracing::debug;

use crate::expand::ExpansionPolicy;
use crate::heuristic::Heuristic;
use crate::node::{NodePool, INF_ID, NO_POS};
use crate::pqueue::Pqueue;
use crate::search::{ProblemInstance, Solution};

pub struct FlexibleAstar<H: Heuristic, E: ExpansionPolicy> {
    heuristic: H,
    policy: E,
    pool: NodePool,
    open: Pqueue,
    next_epoch: u32,
    last_epoch: u32,
    exhaustive: bool,
}

impl<H: Heuristic, E: ExpansionPolicy> FlexibleAstar<H, E> {
    pub fn new(heuristic: H, policy: E) -> Self {
        FlexibleAstar {
            heuristic,
            policy,
            pool: NodePool::new(),
            open: Pqueue::with_capacity(1024),
            next_epoch: 1,
            last_epoch: 0,
            exhaustive: false,
        }
    }

    /// Keep expanding after the target is reached, until the open list
    /// drains. With the zero heuristic this computes single-source
    /// distances to every reachable node.
    pub fn set_exhaustive(&mut self, exhaustive: bool) {
        self.exhaustive = exhaustive;
    }

    /// Distance assigned to `id` by the most recent query, if it was
    /// reached.
    pub fn g_value(&self, id: u32) -> Option<f64> {
        let node = self.pool.get(id)?;
        if node.search_epoch() == self.last_epoch && node.reached() {
            Some(node.g())
        } else {
            None
        }
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>() + self.pool.mem() + self.open.mem() + self.policy.mem()
    }

    pub fn get_path(&mut self, pi: &mut ProblemInstance, sol: &mut Solution) {
        let timer = Instant::now();
        pi.instance_id = self.next_epoch;
        self.next_epoch += 1;
        self.last_epoch = pi.instance_id;
        let epoch = pi.instance_id;

        self.open.clear(&mut self.pool);
        self.policy.clear();

        let Some(start) = self.policy.generate_start_node(&mut self.pool, pi) else {
            sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
            return;
        };
        pi.start_id = start;
        let target = if pi.target_id == INF_ID {
            INF_ID
        } else {
            match self.policy.generate_target_node(&mut self.pool, pi) {
                Some(t) => t,
                None => {
                    sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
                    return;
                }
            }
        };
        pi.target_id = target;

        let h0 = if target == INF_ID {
            0.0
        } else {
            self.heuristic.h(start, target)
        };
        self.pool.generate(start, epoch).init(INF_ID, 0.0, h0);
        self.open.push(&mut self.pool, start);

        let mut target_reached = false;
        while let Some(current) = self.open.pop(&mut self.pool) {
            if current == target {
                if !self.exhaustive {
                    self.conclude(target, pi, sol, timer);
                    return;
                }
                target_reached = true;
            }

            let (cur_g, cur_f) = {
                let n = self.pool.node_mut(current);
                n.set_expanded(true);
                (n.g(), n.f())
            };
            sol.nodes_expanded += 1;
            if pi.verbose {
                let (x, y) = self.policy.get_xy(current);
                debug!("expanding ({}, {}) g={:.6} f={:.6}", x, y, cur_g, cur_f);
            }

            self.policy.expand(current, &mut self.pool, pi);
            for i in 0..self.policy.num_successors() {
                let (nid, cost) = self.policy.successor(i);
                sol.nodes_touched += 1;
                let gval = cur_g + cost;
                let n = self.pool.generate(nid, epoch);
                if n.expanded() {
                    continue;
                }
                if n.reached() {
                    if gval < n.g() {
                        n.relax(gval, current);
                        self.policy.on_relax(n);
                        debug_assert!(n.priority() != NO_POS);
                        self.open.decrease_key(&mut self.pool, nid);
                        sol.nodes_updated += 1;
                        if pi.verbose {
                            let (x, y) = self.policy.get_xy(nid);
                            debug!("  relaxing ({}, {}) g={:.6}", x, y, gval);
                        }
                    }
                } else {
                    let h = if target == INF_ID {
                        0.0
                    } else {
                        self.heuristic.h(nid, target)
                    };
                    n.init(current, gval, gval + h);
                    self.open.push(&mut self.pool, nid);
                    sol.nodes_inserted += 1;
                    if pi.verbose {
                        let (x, y) = self.policy.get_xy(nid);
                        debug!("  generating ({}, {}) g={:.6}", x, y, gval);
                    }
                }
            }
        }

        if target_reached {
            self.conclude(target, pi, sol, timer);
        } else {
            sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
        }
    }

    fn conclude(&mut self, target: u32, pi: &ProblemInstance, sol: &mut Solution, timer: Instant) {
        sol.sum_of_edge_costs = self.pool.node(target).g();
        let mut current = target;
        while current != INF_ID {
            sol.path.push(current);
            current = self.pool.node(current).parent();
        }
        sol.path.reverse();
        if pi.verbose {
            debug!(
                "search complete; cost={:.6} path_len={}",
                sol.sum_of_edge_costs,
                sol.path.len()
            );
        }
        sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
    }
}
