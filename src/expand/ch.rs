//! Expansion policies over contracted graphs.
//!
//! The graph comes prepared (shortcuts inserted) together with a rank array
//! giving the contraction order. `BchPolicy` drives one direction of the
//! bidirectional search; the adjacency list it scans (outgoing vs incoming)
//! is selected once at construction through a function pointer, so the hot
//! loop carries no direction branch.

use std::sync::Arc;

use crate::expand::ExpansionPolicy;
use crate::node::{NodePool, INF_ID};
use crate::search::ProblemInstance;
use crate::xy_graph::XyGraph;

type AdjFn = fn(&XyGraph, u32) -> &[(u32, f64)];

fn outgoing_adj(g: &XyGraph, id: u32) -> &[(u32, f64)] {
    g.outgoing(id)
}

fn incoming_adj(g: &XyGraph, id: u32) -> &[(u32, f64)] {
    g.incoming(id)
}

/// Upward search in a contraction hierarchy: successors are the adjacent
/// nodes of strictly higher rank.
pub struct BchPolicy {
    g: Arc<XyGraph>,
    rank: Arc<Vec<u32>>,
    adj: AdjFn,
    succ: Vec<(u32, f64)>,
}

impl BchPolicy {
    pub fn forward(g: Arc<XyGraph>, rank: Arc<Vec<u32>>) -> Self {
        debug_assert_eq!(g.num_nodes() as usize, rank.len());
        BchPolicy {
            g,
            rank,
            adj: outgoing_adj,
            succ: Vec::with_capacity(8),
        }
    }

    pub fn backward(g: Arc<XyGraph>, rank: Arc<Vec<u32>>) -> Self {
        debug_assert_eq!(g.num_nodes() as usize, rank.len());
        BchPolicy {
            g,
            rank,
            adj: incoming_adj,
            succ: Vec::with_capacity(8),
        }
    }

    pub fn num_nodes(&self) -> u32 {
        self.g.num_nodes()
    }
}

impl ExpansionPolicy for BchPolicy {
    fn expand(&mut self, id: u32, _pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let my_rank = self.rank[id as usize];
        for &(head, cost) in (self.adj)(&self.g, id) {
            if self.rank[head as usize] > my_rank {
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
        (pi.start_id < self.g.num_nodes()).then_some(pi.start_id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        (pi.target_id < self.g.num_nodes()).then_some(pi.target_id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        self.g.get_xy(id)
    }

    fn get_rank(&self, id: u32) -> u32 {
        self.rank[id as usize]
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.g.mem()
            + self.rank.len() * std::mem::size_of::<u32>()
    }
}

/// Forward-driven search in a contraction hierarchy: while ascending, every
/// outgoing edge is considered; once a down-edge has been taken, only
/// down-edges follow. Paths therefore take the shape up*-down*.
pub struct FchPolicy {
    g: Arc<XyGraph>,
    rank: Arc<Vec<u32>>,
    succ: Vec<(u32, f64)>,
}

impl FchPolicy {
    pub fn new(g: Arc<XyGraph>, rank: Arc<Vec<u32>>) -> Self {
        debug_assert_eq!(g.num_nodes() as usize, rank.len());
        FchPolicy {
            g,
            rank,
            succ: Vec::with_capacity(8),
        }
    }
}

impl ExpansionPolicy for FchPolicy {
    fn expand(&mut self, id: u32, pool: &mut NodePool, _pi: &ProblemInstance) {
        self.succ.clear();
        let my_rank = self.rank[id as usize];
        let parent = pool.node(id).parent();
        let descending = parent != INF_ID && self.rank[parent as usize] > my_rank;
        for &(head, cost) in self.g.outgoing(id) {
            if !descending || self.rank[head as usize] < my_rank {
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
        (pi.start_id < self.g.num_nodes()).then_some(pi.start_id)
    }

    fn generate_target_node(&mut self, _pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32> {
        (pi.target_id < self.g.num_nodes()).then_some(pi.target_id)
    }

    fn get_xy(&self, id: u32) -> (i32, i32) {
        self.g.get_xy(id)
    }

    fn get_rank(&self, id: u32) -> u32 {
        self.rank[id as usize]
    }

    fn mem(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.succ.capacity() * std::mem::size_of::<(u32, f64)>()
            + self.g.mem()
            + self.rank.len() * std::mem::size_of::<u32>()
    }
}
