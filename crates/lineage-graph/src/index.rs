//! Petgraph view over a [`LineageGraph`].
//!
//! The arena keeps nodes and edges in plain vectors; traversal and layout
//! need adjacency. [`DependencyIndex`] borrows the arena and builds a
//! `DiGraph` whose node weights are node ids and whose edge weights are the
//! positions of the edges in [`LineageGraph::edges`], so parallel edges and
//! self-loops stay distinguishable.
//!
//! ## Edge Direction Convention
//!
//! Edges point **upstream -> downstream** (data flows from source to target):
//! - `Direction::Outgoing` from a node yields what it feeds (downstream)
//! - `Direction::Incoming` to a node yields what feeds it (upstream)

use crate::model::{LineageGraph, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Adjacency index borrowed from a [`LineageGraph`].
#[derive(Debug)]
pub struct DependencyIndex<'a> {
    graph: DiGraph<&'a NodeId, usize>,
    node_map: HashMap<&'a NodeId, NodeIndex>,
}

impl<'a> DependencyIndex<'a> {
    /// Build the index. Node indices follow input order.
    #[must_use]
    pub fn build(lineage: &'a LineageGraph) -> Self {
        let mut graph = DiGraph::with_capacity(lineage.node_count(), lineage.edge_count());
        let mut node_map = HashMap::with_capacity(lineage.node_count());

        for node in lineage.nodes() {
            node_map.insert(&node.id, graph.add_node(&node.id));
        }

        for (position, edge) in lineage.edges().iter().enumerate() {
            if let (Some(&from), Some(&to)) = (node_map.get(&edge.source), node_map.get(&edge.target)) {
                graph.add_edge(from, to, position);
            }
        }

        Self { graph, node_map }
    }

    /// Petgraph index of a node.
    #[must_use]
    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Node id behind a petgraph index.
    #[must_use]
    pub fn id_of(&self, index: NodeIndex) -> &'a NodeId {
        self.graph[index]
    }

    /// Edges touching `node` in the given direction as
    /// `(edge position, neighbor)` pairs, in edge input order.
    ///
    /// For `Outgoing` the neighbor is the edge target, for `Incoming` the
    /// edge source.
    #[must_use]
    pub fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(usize, NodeIndex)> {
        // Petgraph yields the most recently added edge first.
        let mut neighbors: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| {
                let neighbor = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (*edge.weight(), neighbor)
            })
            .collect();
        neighbors.sort_unstable_by_key(|&(position, _)| position);
        neighbors
    }

    /// Underlying petgraph graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<&'a NodeId, usize> {
        &self.graph
    }
}
