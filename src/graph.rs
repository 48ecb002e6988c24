//! Labeled graphs and subgraph enumeration.
//!
//! The extraction engine only depends on [`SubgraphEnumerator`]; [`LexSubgraphs`]
//! is the enumerator used for dependency-style graphs whose nodes carry words
//! and whose edges carry relation names.

use std::collections::{BTreeSet, VecDeque};

use bitflags::bitflags;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// A directed graph with a word on every node and a relation on every edge
pub type LexGraph = DiGraph<String, String>;

bitflags! {
    /// Kinds of subgraphs emitted by [`LexSubgraphs`]
    pub struct Emit: u32 {
        /// Single nodes (subgraphs with no edges)
        const NODES = 0x01;
        /// Connected edge sets of one edge or more
        const EDGES = 0x02;
        const ALL = 0x03;
    }
}

impl Default for Emit {
    fn default() -> Self {
        Emit::ALL
    }
}

/// A subgraph of a [`LexGraph`], given by the indices it spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    /// Nodes in ascending index order
    pub nodes: Vec<NodeIndex>,
    /// Edges in ascending index order
    pub edges: Vec<EdgeIndex>,
}

/// Produces the canonical keys of the substructures of a graph.
///
/// The returned sequence is lazy, finite and consumed once. Its order must be
/// stable for a given graph since feature ids are assigned in that order.
pub trait SubgraphEnumerator {
    /// Graph type being enumerated
    type Graph: ?Sized;
    /// Canonical key identifying a substructure
    type Key;
    /// Substructure payload
    type Subgraph;

    /// Enumerate substructures with at most `max_edges` edges
    fn enumerate<'g>(
        &'g self,
        graph: &'g Self::Graph,
        max_edges: usize,
    ) -> Box<dyn Iterator<Item = (Self::Key, Self::Subgraph)> + 'g>;
}

/// Enumerates the single nodes and connected edge sets of a [`LexGraph`].
///
/// Edge connectivity ignores direction. Node keys look like `(dog)`, edge-set
/// keys list their `src -rel-> dst` triples in sorted order, e.g.
/// `(bark -nsubj-> dog; bark -obl-> tree)`, so two edge sets get the same key
/// exactly when they carry the same multiset of labeled edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexSubgraphs {
    emit: Emit,
}

impl LexSubgraphs {
    /// Create an enumerator emitting the given kinds of subgraphs
    pub fn new(emit: Emit) -> Self {
        Self { emit }
    }

    /// Kinds of subgraphs this enumerator emits
    pub fn emit(&self) -> Emit {
        self.emit
    }
}

impl SubgraphEnumerator for LexSubgraphs {
    type Graph = LexGraph;
    type Key = String;
    type Subgraph = Subgraph;

    fn enumerate<'g>(
        &'g self,
        graph: &'g LexGraph,
        max_edges: usize,
    ) -> Box<dyn Iterator<Item = (String, Subgraph)> + 'g> {
        let nodes = if self.emit.contains(Emit::NODES) {
            graph.node_indices().collect()
        } else {
            VecDeque::new()
        };
        let max_edges = if self.emit.contains(Emit::EDGES) {
            max_edges
        } else {
            0
        };
        Box::new(LexSubgraphIter {
            graph,
            max_edges,
            nodes,
            level: Vec::new(),
            cursor: 0,
            size: 0,
        })
    }
}

/// Lazy iterator behind [`LexSubgraphs`].
///
/// Edge sets are grown one level at a time: all connected sets with `k + 1`
/// edges are derived from the sets with `k` edges only once the latter are
/// exhausted.
struct LexSubgraphIter<'g> {
    graph: &'g LexGraph,
    max_edges: usize,
    nodes: VecDeque<NodeIndex>,
    /// Edge sets of the current level, each sorted
    level: Vec<Vec<EdgeIndex>>,
    cursor: usize,
    /// Edge count of the sets in `level`
    size: usize,
}

impl<'g> LexSubgraphIter<'g> {
    fn grow(&self) -> Vec<Vec<EdgeIndex>> {
        if self.size == 0 {
            return self.graph.edge_indices().map(|e| vec![e]).collect();
        }
        let mut next = BTreeSet::new();
        for edges in &self.level {
            for endpoint in endpoints(self.graph, edges) {
                let incident = self
                    .graph
                    .edges_directed(endpoint, Direction::Outgoing)
                    .chain(self.graph.edges_directed(endpoint, Direction::Incoming));
                for edge in incident {
                    let id = edge.id();
                    if let Err(pos) = edges.binary_search(&id) {
                        let mut grown = edges.clone();
                        grown.insert(pos, id);
                        next.insert(grown);
                    }
                }
            }
        }
        next.into_iter().collect()
    }

    fn materialize(&self, edges: Vec<EdgeIndex>) -> (String, Subgraph) {
        let mut triples: Vec<String> = edges
            .iter()
            .filter_map(|&e| {
                let (src, dst) = self.graph.edge_endpoints(e)?;
                Some(format!(
                    "{} -{}-> {}",
                    self.graph[src], self.graph[e], self.graph[dst]
                ))
            })
            .collect();
        triples.sort();
        let key = format!("({})", triples.join("; "));
        let nodes = endpoints(self.graph, &edges).into_iter().collect();
        (key, Subgraph { nodes, edges })
    }
}

impl<'g> Iterator for LexSubgraphIter<'g> {
    type Item = (String, Subgraph);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.nodes.pop_front() {
            let key = format!("({})", self.graph[node]);
            return Some((
                key,
                Subgraph {
                    nodes: vec![node],
                    edges: Vec::new(),
                },
            ));
        }
        loop {
            if self.cursor < self.level.len() {
                let edges = self.level[self.cursor].clone();
                self.cursor += 1;
                return Some(self.materialize(edges));
            }
            if self.size >= self.max_edges {
                return None;
            }
            self.level = self.grow();
            self.size += 1;
            self.cursor = 0;
            if self.level.is_empty() {
                self.max_edges = self.size;
                return None;
            }
        }
    }
}

fn endpoints(graph: &LexGraph, edges: &[EdgeIndex]) -> BTreeSet<NodeIndex> {
    edges
        .iter()
        .filter_map(|&e| graph.edge_endpoints(e))
        .flat_map(|(src, dst)| [src, dst])
        .collect()
}
