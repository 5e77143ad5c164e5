//! Bidirectional search over a contraction hierarchy.
//!
//! Forward and backward searches run concurrently with strict alternation
//! (forward first), each popping upward in the hierarchy. Every relaxation
//! probes the opposite direction's node for the same id and tightens the
//! best known meeting cost; the search stops once neither queue's best
//! f-value can beat it.

use std::time::Instant;

use tracing::debug;

use crate::expand::ExpansionPolicy;
use crate::node::{NodePool, INF_ID, NO_POS};
use crate::pqueue::Pqueue;
use crate::search::{ProblemInstance, Solution};

pub struct BchSearch<E: ExpansionPolicy> {
    fpolicy: E,
    bpolicy: E,
    fpool: NodePool,
    bpool: NodePool,
    fopen: Pqueue,
    bopen: Pqueue,
    next_epoch: u32,
}

impl<E: ExpansionPolicy> BchSearch<E> {
    pub fn new(fpolicy: E, bpolicy: E) -> Self {
        BchSearch {
            fpolicy,
            bpolicy,
            fpool: NodePool::new(),
            bpool: NodePool::new(),
            fopen: Pqueue::with_capacity(512),
            bopen: Pqueue::with_capacity(512),
            next_epoch: 1,
        }
    }

    pub fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.fpool.mem()
            + self.bpool.mem()
            + self.fopen.mem()
            + self.bopen.mem()
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
        let mut forward_next = true;

        loop {
            let ftop = self.fopen.peek_f(&self.fpool);
            let btop = self.bopen.peek_f(&self.bpool);
            if ftop.min(btop) >= best_cost {
                break;
            }
            let use_fwd = if forward_next {
                ftop < best_cost
            } else {
                btop >= best_cost
            };
            forward_next = !forward_next;
            if use_fwd {
                expand_step(
                    &mut self.fpolicy,
                    &mut self.fpool,
                    &mut self.fopen,
                    &mut self.bpool,
                    epoch,
                    pi,
                    sol,
                    &mut best_cost,
                    &mut meet,
                );
            } else {
                expand_step(
                    &mut self.bpolicy,
                    &mut self.bpool,
                    &mut self.bopen,
                    &mut self.fpool,
                    epoch,
                    pi,
                    sol,
                    &mut best_cost,
                    &mut meet,
                );
            }
        }

        if best_cost.is_finite() {
            sol.sum_of_edge_costs = best_cost;
            reconstruct(&self.fpool, &self.bpool, meet, sol);
        }
        if pi.verbose {
            debug!(
                "bidirectional search done; cost={:.6} expanded={}",
                sol.sum_of_edge_costs, sol.nodes_expanded
            );
        }
        sol.time_elapsed_micro = timer.elapsed().as_micros() as u64;
    }
}

/// Pop and expand one node of direction `d`, relaxing its successors and
/// probing the opposite pool for a meeting point.
#[allow(clippy::too_many_arguments)]
pub(crate) fn expand_step<E: ExpansionPolicy>(
    policy: &mut E,
    pool: &mut NodePool,
    open: &mut Pqueue,
    other_pool: &mut NodePool,
    epoch: u32,
    pi: &ProblemInstance,
    sol: &mut Solution,
    best_cost: &mut f64,
    meet: &mut u32,
) {
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
                    policy.on_relax(n);
                    debug_assert!(n.priority() != NO_POS);
                    open.decrease_key(pool, nid);
                    sol.nodes_updated += 1;
                }
            } else {
                n.init(current, gval, gval);
                open.push(pool, nid);
                sol.nodes_inserted += 1;
            }
        }

        // meeting probe: has the other direction reached this node?
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

/// Concatenate the forward chain to the meeting node with the reversed
/// backward chain.
pub(crate) fn reconstruct(fpool: &NodePool, bpool: &NodePool, meet: u32, sol: &mut Solution) {
    debug_assert!(meet != INF_ID);
    let mut current = meet;
    while current != INF_ID {
        sol.path.push(current);
        current = fpool.node(current).parent();
    }
    sol.path.reverse();
    let mut current = bpool.node(meet).parent();
    while current != INF_ID {
        sol.path.push(current);
        current = bpool.node(current).parent();
    }
}
