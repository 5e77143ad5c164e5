//! Directed graph with per-node coordinates and explicit outgoing and
//! incoming adjacency, as the contraction-hierarchy searches need both
//! directions. The on-disk form is bincode of the whole structure.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct XyGraph {
    xy: Vec<(i32, i32)>,
    out: Vec<Vec<(u32, f64)>>,
    inc: Vec<Vec<(u32, f64)>>,
}

impl XyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, x: i32, y: i32) -> u32 {
        let id = self.xy.len() as u32;
        self.xy.push((x, y));
        self.out.push(Vec::new());
        self.inc.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, tail: u32, head: u32, cost: f64) {
        debug_assert!(cost >= 0.0);
        self.out[tail as usize].push((head, cost));
        self.inc[head as usize].push((tail, cost));
    }

    #[inline(always)]
    pub fn num_nodes(&self) -> u32 {
        self.xy.len() as u32
    }

    #[inline(always)]
    pub fn outgoing(&self, id: u32) -> &[(u32, f64)] {
        &self.out[id as usize]
    }

    #[inline(always)]
    pub fn incoming(&self, id: u32) -> &[(u32, f64)] {
        &self.inc[id as usize]
    }

    #[inline(always)]
    pub fn get_xy(&self, id: u32) -> (i32, i32) {
        self.xy[id as usize]
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("failed to create graph file {}", path.as_ref().display()))?;
        bincode::serialize_into(BufWriter::new(file), self).context("failed to serialize graph")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open graph file {}", path.as_ref().display()))?;
        bincode::deserialize_from(BufReader::new(file)).context("failed to deserialize graph")
    }

    pub fn mem(&self) -> usize {
        let edges: usize = self
            .out
            .iter()
            .chain(self.inc.iter())
            .map(|adj| adj.capacity() * std::mem::size_of::<(u32, f64)>())
            .sum();
        std::mem::size_of::<Self>() + self.xy.capacity() * std::mem::size_of::<(i32, i32)>() + edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_mirrored() {
        let mut g = XyGraph::new();
        let a = g.add_node(0, 0);
        let b = g.add_node(1, 0);
        g.add_edge(a, b, 2.5);
        assert_eq!(g.outgoing(a), &[(b, 2.5)]);
        assert_eq!(g.incoming(b), &[(a, 2.5)]);
        assert!(g.outgoing(b).is_empty());
    }
}
