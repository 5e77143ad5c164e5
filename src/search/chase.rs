//! Two-phase bidirectional search with deferred core expansion.
//!
//! The top 5% of the hierarchy by rank form the core. Phase 1 runs the
//! bidirectional search but never queues core nodes: they are parked in a
//! per-direction norelax list, their g-values still relaxed in place, and
//! the cheapest parked g is tracked as that direction's core lower bound.
//! When both queues have drained below the best meeting cost, the bounds
//! decide: either the current best is provably optimal, or no path exists,
//! or phase 2 reseeds the queues from the norelax lists and runs the plain
//! bidirectional search to completion.

use std::time::Instant;

use tracing::debug;

use crate::expand::ExpansionPolicy;
use crate::node::{NodePool, INF_ID, NO_POS};
use crate::pqueue::Pqueue;
use crate::search::bch::reconstruct;
use crate::search::{ProblemInstance, Solution};

pub struct ChaseSearch<E: ExpansionPolicy> {
    fpolicy: E,
    bpolicy: E,
    fpool: NodePool,
    bpool: NodePool,
    fopen: Pqueue,
    bopen: Pqueue,
    fwd_norelax: Vec<u32>,
    bwd_norelax: Vec<u32>,
    core_cutoff: u32,
    next_epoch: u32,
}

struct DirState<'a, E: ExpansionPolicy> {
    policy: &'a mut E,
    pool: &'a mut NodePool,
    open: &'a mut Pqueue,
    norelax: &'a mut Vec<u32>,
    core_lb: &'a mut f64,
    other_pool: &'a mut NodePool,
}

impl<E: ExpansionPolicy> ChaseSearch<E> {
    /// `num_nodes` sizes the core: nodes ranked at or above
    /// `0.95 * num_nodes` are deferred in phase 1.
    pub fn new(fpolicy: E, bpolicy: E, num_nodes: u32) -> Self {
        ChaseSearch {
            fpolicy,
            bpolicy,
            fpool: NodePool::new(),
            bpool: NodePool::new(),
            fopen: Pqueue::with_capacity(512),
            bopen: Pqueue::with_capacity(512),
            fwd_norelax: Vec::new(),
            bwd_norelax: Vec::new(),
            core_cutoff: (num_nodes as f64 * 0.95) as u32,
            next_epoch: 1,
        }
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.fpool.mem()
            + self.bpool.mem()
            + self.fopen.mem()
            + self.bopen.mem()
            + self.fwd_norelax.capacity() * std::mem::size_of::<u32>()
            + self.bwd_norelax.capacity() * std::mem::size_of::<u32>()
            + self.fpolicy.mem()
            + self.bpolicy.mem()
    }

    pub fn get_path(&mut self, pi: &mut ProblemInstance, sol: &mut Solution) {
        let timer = Instant::now();
        pi.instance_id = self.next_epoch;
        self.next_epoch += 1;
        let epoch = pi.instance_id;

        self.fopen.clear(&mut self.fpool);
        self.bopen.clear(&mut self.bpool);
        self.fwd_norelax.clear();
        self.bwd_norelax.clear();
        self.fpolicy.clear();
        self.bpolicy.clear();

        let Some(start) = self.fpolicy.generate_start_node(&mut self.fpool, pi) else {
            sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
            return;
        };
        let Some(target) = self.bpolicy.generate_target_node(&mut self.bpool, pi) else {
            sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
            return;
        };
        pi.start_id = start;
        pi.target_id = target;

        self.fpool.generate(start, epoch).init(INF_ID, 0.0, 0.0);
        self.fopen.push(&mut self.fpool, start);
        self.bpool.generate(target, epoch).init(INF_ID, 0.0, 0.0);
        self.bopen.push(&mut self.bpool, target);

        let mut best_cost = f64::INFINITY;
        let mut meet = INF_ID;
        let mut phase = 1u32;
        let mut fwd_core_lb = f64::INFINITY;
        let mut bwd_core_lb = f64::INFINITY;
        let mut forward_next = true;

        loop {
            let ftop = self.fopen.peek_f(&self.fpool);
            let btop = self.bopen.peek_f(&self.bpool);
            if ftop.min(btop) >= best_cost {
                if phase == 2 {
                    break;
                }
                // phase 1 has drained; decide from the lower bounds
                let fwd_lb = fwd_core_lb.min(ftop);
                let bwd_lb = bwd_core_lb.min(btop);
                if fwd_lb.min(bwd_lb) >= best_cost {
                    // optimal path avoids the core
                    if pi.verbose {
                        debug!("provably best solution; cost={:.6}", best_cost);
                    }
                    break;
                }
                if fwd_core_lb.is_infinite() || bwd_core_lb.is_infinite() {
                    // one side cannot reach the core: no improvement left
                    break;
                }
                self.fopen.clear(&mut self.fpool);
                self.bopen.clear(&mut self.bpool);
                for id in self.fwd_norelax.drain(..) {
                    self.fopen.push(&mut self.fpool, id);
                }
                for id in self.bwd_norelax.drain(..) {
                    self.bopen.push(&mut self.bpool, id);
                }
                phase = 2;
                fwd_core_lb = f64::INFINITY;
                bwd_core_lb = f64::INFINITY;
                forward_next = true;
                if pi.verbose {
                    debug!("entering phase 2; best_cost={:.6}", best_cost);
                }
                continue;
            }

            let use_fwd = if forward_next {
                ftop < best_cost
            } else {
                btop >= best_cost
            };
            forward_next = !forward_next;
            let dir = if use_fwd {
                DirState {
                    policy: &mut self.fpolicy,
                    pool: &mut self.fpool,
                    open: &mut self.fopen,
                    norelax: &mut self.fwd_norelax,
                    core_lb: &mut fwd_core_lb,
                    other_pool: &mut self.bpool,
                }
            } else {
                DirState {
                    policy: &mut self.bpolicy,
                    pool: &mut self.bpool,
                    open: &mut self.bopen,
                    norelax: &mut self.bwd_norelax,
                    core_lb: &mut bwd_core_lb,
                    other_pool: &mut self.fpool,
                }
            };
            Self::expand_one(
                dir,
                phase,
                self.core_cutoff,
                epoch,
                pi,
                sol,
                &mut best_cost,
                &mut meet,
            );
        }

        if best_cost.is_finite() {
            sol.sum_of_edge_costs = best_cost;
            reconstruct(&self.fpool, &self.bpool, meet, sol);
        }
        sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_one(
        dir: DirState<'_, E>,
        phase: u32,
        core_cutoff: u32,
        epoch: u32,
        pi: &ProblemInstance,
        sol: &mut Solution,
        best_cost: &mut f64,
        meet: &mut u32,
    ) {
        let DirState {
            policy,
            pool,
            open,
            norelax,
            core_lb,
            other_pool,
        } = dir;
        let Some(current) = open.pop(pool) else {
            return;
        };
        let cur_g = {
            let n = pool.node_mut(current);
            n.set_expanded(true);
            n.g()
        };
        sol.nodes_expanded += 1;
        if pi.verbose {
            let (x, y) = policy.get_xy(current);
            debug!("expanding ({}, {}) g={:.6}", x, y, cur_g);
        }

        policy.expand(current, pool, pi);
        for i in 0..policy.num_successors() {
            let (nid, cost) = policy.successor(i);
            sol.nodes_touched += 1;
            let gval = cur_g + cost;
            let n = pool.generate(nid, epoch);
            if !n.expanded() {
                if n.reached() {
                    if gval < n.g() {
                        n.relax(gval, current);
                        if n.priority() != NO_POS {
                            open.decrease_key(pool, nid);
                        } else if phase == 1 {
                            // parked in the norelax list: keep the bound tight
                            if gval < *core_lb {
                                *core_lb = gval;
                            }
                        } else {
                            // reached in phase 1 but dropped when the queues
                            // were reseeded; queue it again
                            open.push(pool, nid);
                        }
                        sol.nodes_updated += 1;
                    }
                } else {
                    n.init(current, gval, gval);
                    sol.nodes_inserted += 1;
                    if phase == 1 && policy.get_rank(nid) >= core_cutoff {
                        norelax.push(nid);
                        if gval < *core_lb {
                            *core_lb = gval;
                        }
                    } else {
                        open.push(pool, nid);
                    }
                }
            }

            let other = other_pool.generate(nid, epoch);
            if other.reached() {
                let mu = gval + other.g();
                if mu < *best_cost {
                    *best_cost = mu;
                    *meet = nid;
                    if pi.verbose {
                        debug!("new best meeting cost {:.6} at node {}", mu, nid);
                    }
                }
            }
        }
    }
}
