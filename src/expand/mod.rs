//! The expansion-policy contract and its implementations.
//!
//! A policy owns the map or graph it wraps and, per expansion, fills an
//! internal buffer of (successor id, edge cost) pairs which the search then
//! iterates by index. Policies never own open-set state; per-node search
//! state lives in the `NodePool` the search passes in, which policies use
//! only to tag freshly generated successors (the JPS family stores the
//! arrival direction there).

mod ch;
mod cpg_policy;
mod grid;
mod jps_plus;
mod jps_policy;
mod jps_wgm;
mod wgrid;

pub use ch::{BchPolicy, FchPolicy};
pub use cpg_policy::{CpgPolicy, FchCpgPolicy, JpgPolicy};
pub use grid::{GridPolicy, TimexOctileHeuristic, TimexPolicy};
pub use jps_plus::{Jps2PlusPolicy, JpsPlusPolicy};
pub use jps_policy::{Jps2Policy, JpsPolicy};
pub use jps_wgm::JpsWgmPolicy;
pub use wgrid::WeightedGridPolicy;

use crate::node::{NodePool, SearchNode};
use crate::search::ProblemInstance;

pub trait ExpansionPolicy {
    /// Compute the successors of `id` for the current query into the
    /// internal buffer.
    fn expand(&mut self, id: u32, pool: &mut NodePool, pi: &ProblemInstance);

    fn num_successors(&self) -> usize;

    /// The i-th buffered (successor id, edge cost) pair.
    fn successor(&self, i: usize) -> (u32, f64);

    /// Translate the instance's start into this policy's id space; `None`
    /// when the instance is trivially unsolvable (e.g. a blocked cell).
    fn generate_start_node(&mut self, pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32>;

    fn generate_target_node(&mut self, pool: &mut NodePool, pi: &ProblemInstance) -> Option<u32>;

    /// Inverse id map, for tracing and reporting.
    fn get_xy(&self, id: u32) -> (i32, i32);

    /// Contraction rank; only meaningful for the CH policies.
    fn get_rank(&self, _id: u32) -> u32 {
        0
    }

    /// Invoked by the search after every successful relaxation. The JPS2
    /// policies refresh the stored arrival direction here; everyone else
    /// ignores it.
    fn on_relax(&mut self, _node: &mut SearchNode) {}

    /// Release per-query scratch state.
    fn clear(&mut self) {}

    fn mem(&self) -> usize;
}
