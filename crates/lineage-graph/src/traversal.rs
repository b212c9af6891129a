//! Lineage isolation and impact propagation.
//!
//! Both traversals are breadth-first searches over a [`DependencyIndex`]:
//!
//! | Operation | Directions | Used for |
//! |-----------|------------|----------|
//! | [`isolate_lineage`] | upstream + downstream | focus filtering |
//! | [`propagate_impact`] | downstream only | visual weighting |
//!
//! Termination on cyclic graphs is structural: every edge is consumed at
//! most once per direction and a node is enqueued at most once.

use crate::index::DependencyIndex;
use crate::model::{EdgeId, LineageGraph, NodeId};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// A node reached by a traversal, with its hop distance from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reached {
    /// The reached node
    pub id: NodeId,
    /// Number of edges on the shortest path from the start
    pub depth: usize,
}

/// Result of bidirectional lineage isolation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    /// The focus node; `None` if it was not in the graph
    pub focus: Option<NodeId>,
    /// Nodes feeding the focus, in BFS order (focus excluded)
    pub upstream: Vec<Reached>,
    /// Nodes fed by the focus, in BFS order (focus excluded)
    pub downstream: Vec<Reached>,
}

impl Lineage {
    /// The isolation set: focus, upstream and downstream nodes.
    ///
    /// Empty when the focus was not in the graph.
    #[must_use]
    pub fn node_set(&self) -> HashSet<NodeId> {
        self.focus
            .iter()
            .cloned()
            .chain(self.upstream.iter().map(|r| r.id.clone()))
            .chain(self.downstream.iter().map(|r| r.id.clone()))
            .collect()
    }

    /// Returns `true` if the focus node was not found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.focus.is_none()
    }
}

/// Result of downstream impact propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactSet {
    /// The selected node; `None` if it was not in the graph
    pub source: Option<NodeId>,
    /// Impacted nodes in BFS order, source first at depth 0
    pub reached: Vec<Reached>,
    /// Impacted node ids
    pub nodes: HashSet<NodeId>,
    /// Edges whose source and target are both impacted
    pub active_edges: HashSet<EdgeId>,
}

impl ImpactSet {
    /// Returns `true` if the node is impacted.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Returns `true` if the edge is highlighted.
    #[must_use]
    pub fn is_active(&self, id: &EdgeId) -> bool {
        self.active_edges.contains(id)
    }

    /// Returns `true` if nothing is impacted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Everything that feeds `focus` and everything `focus` feeds.
///
/// A focus absent from `graph` yields an empty [`Lineage`].
#[must_use]
pub fn isolate_lineage(graph: &LineageGraph, focus: &NodeId) -> Lineage {
    let index = DependencyIndex::build(graph);
    let Some(start) = index.index_of(focus) else {
        tracing::debug!(%focus, "Focus node not in graph, isolation is empty");
        return Lineage::default();
    };

    Lineage {
        focus: Some(focus.clone()),
        upstream: breadth_first(&index, start, Direction::Incoming),
        downstream: breadth_first(&index, start, Direction::Outgoing),
    }
}

/// Everything downstream of `source`, plus the edges among those nodes.
///
/// A source absent from `graph` yields an empty [`ImpactSet`].
#[must_use]
pub fn propagate_impact(graph: &LineageGraph, source: &NodeId) -> ImpactSet {
    let index = DependencyIndex::build(graph);
    let Some(start) = index.index_of(source) else {
        tracing::debug!(%source, "Impact source not in graph, impact is empty");
        return ImpactSet::default();
    };

    let mut reached = vec![Reached {
        id: source.clone(),
        depth: 0,
    }];
    reached.extend(breadth_first(&index, start, Direction::Outgoing));

    let nodes: HashSet<NodeId> = reached.iter().map(|r| r.id.clone()).collect();
    let active_edges = graph
        .edges()
        .iter()
        .filter(|e| nodes.contains(&e.source) && nodes.contains(&e.target))
        .map(|e| e.id.clone())
        .collect();

    ImpactSet {
        source: Some(source.clone()),
        reached,
        nodes,
        active_edges,
    }
}

/// BFS in one direction, excluding the start node from the result.
fn breadth_first(index: &DependencyIndex<'_>, start: NodeIndex, direction: Direction) -> Vec<Reached> {
    let mut result = Vec::new();
    let mut visited_nodes: HashSet<NodeIndex> = HashSet::from([start]);
    let mut consumed_edges: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        for (edge, neighbor) in index.neighbors(current, direction) {
            if !consumed_edges.insert(edge) {
                continue;
            }
            if visited_nodes.insert(neighbor) {
                result.push(Reached {
                    id: index.id_of(neighbor).clone(),
                    depth: depth + 1,
                });
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> LineageGraph {
        LineageGraph::from_parts(
            nodes.iter().map(|id| Node::new(*id, "TABLE", *id)).collect(),
            edges
                .iter()
                .enumerate()
                .map(|(i, (s, t))| Edge::new(format!("e{i}"), *s, *t))
                .collect(),
        )
        .unwrap()
    }

    fn ids(reached: &[Reached]) -> Vec<&str> {
        reached.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn lineage_splits_upstream_and_downstream() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("b", "d")]);
        let lineage = isolate_lineage(&g, &NodeId::new("b"));

        assert_eq!(ids(&lineage.upstream), vec!["a"]);
        assert_eq!(ids(&lineage.downstream), vec!["c", "d"]);
        assert_eq!(lineage.node_set().len(), 4);
    }

    #[test]
    fn depth_is_shortest_hop_count() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let lineage = isolate_lineage(&g, &NodeId::new("a"));

        let c = lineage.downstream.iter().find(|r| r.id.as_str() == "c").unwrap();
        assert_eq!(c.depth, 1);
    }

    #[test]
    fn self_loop_is_not_revisited() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        let impact = propagate_impact(&g, &NodeId::new("a"));

        assert_eq!(ids(&impact.reached), vec!["a", "b"]);
        assert!(impact.is_active(&EdgeId::new("e0")));
    }

    #[test]
    fn missing_focus_is_empty() {
        let g = graph(&["a"], &[]);
        let lineage = isolate_lineage(&g, &NodeId::new("zzz"));
        assert!(lineage.is_empty());
        assert!(lineage.node_set().is_empty());

        let impact = propagate_impact(&g, &NodeId::new("zzz"));
        assert!(impact.is_empty());
        assert!(impact.active_edges.is_empty());
    }

    #[test]
    fn diamond_reaches_join_once() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let impact = propagate_impact(&g, &NodeId::new("a"));
        assert_eq!(ids(&impact.reached), vec!["a", "b", "c", "d"]);
        assert_eq!(impact.active_edges.len(), 4);
    }

    #[test]
    fn edges_back_into_impact_set_are_active() {
        let g = graph(&["x", "y", "z"], &[("x", "y"), ("y", "x"), ("z", "x")]);
        let impact = propagate_impact(&g, &NodeId::new("x"));

        assert_eq!(impact.nodes.len(), 2);
        assert!(impact.is_active(&EdgeId::new("e0")));
        assert!(impact.is_active(&EdgeId::new("e1")));
        assert!(!impact.is_active(&EdgeId::new("e2")), "z is upstream, not impacted");
    }
}
