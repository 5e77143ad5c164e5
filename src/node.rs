//! Per-node search state and the id-indexed node pool.
//!
//! One `SearchNode` exists per graph-node id per pool. Freshness across
//! queries comes from an epoch stamp, not from reallocation: `generate`
//! lazily resets any node whose `search_epoch` does not match the current
//! query. The pool allocates in fixed-size chunks so node storage is never
//! moved or shrunk while a query runs.

use crate::jps::Direction;

/// Sentinel node id meaning "absent" (no parent, no target).
pub const INF_ID: u32 = u32::MAX;

/// Sentinel heap position meaning "not on the open list".
pub const NO_POS: u32 = u32::MAX;

/// Mutable search state for a single graph node.
#[derive(Debug, Clone)]
pub struct SearchNode {
    id: u32,
    g: f64,
    f: f64,
    parent: u32,
    priority: u32,
    search_epoch: u32,
    expanded: bool,
    pdir: Direction,
}

impl SearchNode {
    fn new(id: u32) -> Self {
        SearchNode {
            id,
            g: f64::INFINITY,
            f: f64::INFINITY,
            parent: INF_ID,
            priority: NO_POS,
            search_epoch: 0,
            expanded: false,
            pdir: Direction::None,
        }
    }

    #[inline(always)]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline(always)]
    pub fn g(&self) -> f64 {
        self.g
    }

    #[inline(always)]
    pub fn f(&self) -> f64 {
        self.f
    }

    #[inline(always)]
    pub fn parent(&self) -> u32 {
        self.parent
    }

    #[inline(always)]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    #[inline(always)]
    pub fn set_priority(&mut self, pos: u32) {
        self.priority = pos;
    }

    #[inline(always)]
    pub fn search_epoch(&self) -> u32 {
        self.search_epoch
    }

    #[inline(always)]
    pub fn expanded(&self) -> bool {
        self.expanded
    }

    #[inline(always)]
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    #[inline(always)]
    pub fn pdir(&self) -> Direction {
        self.pdir
    }

    #[inline(always)]
    pub fn set_pdir(&mut self, d: Direction) {
        self.pdir = d;
    }

    /// True once the node has been assigned a tentative distance this query.
    #[inline(always)]
    pub fn reached(&self) -> bool {
        self.g.is_finite()
    }

    /// First touch this query: assign parent, g and f.
    #[inline(always)]
    pub fn init(&mut self, parent: u32, g: f64, f: f64) {
        debug_assert!(!self.expanded);
        self.parent = parent;
        self.g = g;
        self.f = f;
    }

    /// Improve g via a cheaper parent; f keeps its heuristic component.
    #[inline(always)]
    pub fn relax(&mut self, g: f64, parent: u32) {
        debug_assert!(g < self.g);
        self.f = (self.f - self.g) + g;
        self.g = g;
        self.parent = parent;
    }

    /// Heap order: smaller f wins; ties broken in favour of larger g.
    #[inline(always)]
    pub fn is_better_than(&self, other: &SearchNode) -> bool {
        if self.f < other.f {
            return true;
        }
        if self.f > other.f {
            return false;
        }
        self.g > other.g
    }

    fn reset(&mut self, epoch: u32) {
        self.g = f64::INFINITY;
        self.f = f64::INFINITY;
        self.parent = INF_ID;
        self.priority = NO_POS;
        self.search_epoch = epoch;
        self.expanded = false;
        self.pdir = Direction::None;
    }
}

const CHUNK_BITS: u32 = 12;
const CHUNK_SIZE: usize = 1 << CHUNK_BITS;

/// Lazily allocated, chunked storage of one `SearchNode` per node id.
#[derive(Default)]
pub struct NodePool {
    chunks: Vec<Option<Box<[SearchNode]>>>,
}

impl NodePool {
    pub fn new() -> Self {
        NodePool { chunks: Vec::new() }
    }

    /// Fetch the node for `id`, allocating its chunk on first touch and
    /// resetting stale state when the epoch stamp does not match.
    pub fn generate(&mut self, id: u32, epoch: u32) -> &mut SearchNode {
        debug_assert!(id != INF_ID);
        let chunk_idx = (id >> CHUNK_BITS) as usize;
        if chunk_idx >= self.chunks.len() {
            self.chunks.resize_with(chunk_idx + 1, || None);
        }
        let chunk = self.chunks[chunk_idx].get_or_insert_with(|| {
            let base = (chunk_idx as u32) << CHUNK_BITS;
            (0..CHUNK_SIZE as u32)
                .map(|i| SearchNode::new(base + i))
                .collect::<Vec<_>>()
                .into_boxed_slice()
        });
        let node = &mut chunk[id as usize & (CHUNK_SIZE - 1)];
        if node.search_epoch != epoch {
            node.reset(epoch);
        }
        node
    }

    /// Read-only lookup without allocation or reset.
    pub fn get(&self, id: u32) -> Option<&SearchNode> {
        let chunk = self.chunks.get((id >> CHUNK_BITS) as usize)?.as_deref()?;
        Some(&chunk[id as usize & (CHUNK_SIZE - 1)])
    }

    /// Access a node known to be allocated (it was generated earlier this
    /// query; the open list only ever holds such ids).
    #[inline(always)]
    pub(crate) fn node(&self, id: u32) -> &SearchNode {
        let chunk = self.chunks[(id >> CHUNK_BITS) as usize]
            .as_deref()
            .expect("node id was never generated");
        &chunk[id as usize & (CHUNK_SIZE - 1)]
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, id: u32) -> &mut SearchNode {
        let chunk = self.chunks[(id >> CHUNK_BITS) as usize]
            .as_deref_mut()
            .expect("node id was never generated");
        &mut chunk[id as usize & (CHUNK_SIZE - 1)]
    }

    pub fn mem(&self) -> usize {
        let allocated = self.chunks.iter().filter(|c| c.is_some()).count();
        std::mem::size_of::<Self>()
            + self.chunks.len() * std::mem::size_of::<Option<Box<[SearchNode]>>>()
            + allocated * CHUNK_SIZE * std::mem::size_of::<SearchNode>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_mismatch_resets_state() {
        let mut pool = NodePool::new();
        {
            let n = pool.generate(17, 1);
            n.init(INF_ID, 3.0, 4.5);
            n.set_expanded(true);
        }
        let n = pool.generate(17, 2);
        assert!(!n.reached());
        assert!(!n.expanded());
        assert_eq!(n.parent(), INF_ID);
        assert_eq!(n.search_epoch(), 2);
    }

    #[test]
    fn same_epoch_preserves_state() {
        let mut pool = NodePool::new();
        pool.generate(5, 7).init(INF_ID, 1.0, 2.0);
        let n = pool.generate(5, 7);
        assert!(n.reached());
        assert_eq!(n.g(), 1.0);
    }

    #[test]
    fn tie_break_prefers_larger_g() {
        let mut pool = NodePool::new();
        pool.generate(0, 1).init(INF_ID, 2.0, 6.0);
        pool.generate(1, 1).init(INF_ID, 5.0, 6.0);
        assert!(pool.node(1).is_better_than(pool.node(0)));
        assert!(!pool.node(0).is_better_than(pool.node(1)));
    }
}
