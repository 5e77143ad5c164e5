//! Gridroute: best-first pathfinding on grid maps and contracted graphs
//!
//! The engine is a pluggable best-first search harness plus a family of
//! expansion policies that drive it:
//! - uniform-cost and weighted-terrain octile grids
//! - Jump Point Search (JPS, JPS2, JPS+, JPS2+) and its weighted-grid variant
//! - contraction-hierarchy policies (BCH forward/backward, FCH) over
//!   prepared contracted graphs with an external rank array
//! - corner-point graphs derived from grids (CPG, FCH-CPG, JPG)
//!
//! Searches: a unidirectional flexible A*, a bidirectional contraction
//! hierarchy search, and a two-phase core-aware variant.
//!
//! Key principle: per-node search state lives in an id-indexed pool and is
//! invalidated lazily by a per-query epoch counter, so no per-query O(n)
//! reset is ever paid.

pub mod cli;
pub mod cpg;
pub mod expand;
pub mod gridmap;
pub mod heuristic;
pub mod jps;
pub mod node;
pub mod pqueue;
pub mod scenario;
pub mod search;
pub mod weighted_gridmap;
pub mod xy_graph;

pub use gridmap::GridMap;
pub use heuristic::{Heuristic, OctileHeuristic, ZeroHeuristic};
pub use node::{NodePool, SearchNode, INF_ID};
pub use pqueue::Pqueue;
pub use search::{ProblemInstance, Solution};
pub use weighted_gridmap::WeightedGridMap;
pub use xy_graph::XyGraph;

/// Cost of a diagonal grid step.
pub const SQRT2: f64 = std::f64::consts::SQRT_2;
