//! Backend wire format and lenient normalization.
//!
//! The lineage backend answers graph queries with
//! `{ nodes: [{id, data: {type, label, parent_id, ...}}], edges: [{id, source, target, label, data}] }`.
//! Type strings arrive in inconsistent casing and prefixing, and the data is
//! not guaranteed to be referentially sound. [`LineageGraph::normalize`]
//! turns such a payload into a valid [`LineageGraph`], skipping or repairing
//! what it cannot use and reporting each repair as a [`NormalizeWarning`].

use crate::model::{Edge, EdgeData, EdgeId, LineageGraph, Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Graph payload as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    /// Raw nodes
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    /// Raw edges
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

/// Node as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Node id
    pub id: String,
    /// Node payload
    #[serde(default)]
    pub data: RawNodeData,
}

/// Payload of a backend node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNodeData {
    /// Type string in any casing, possibly `component_`-prefixed
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Display label
    #[serde(default)]
    pub label: Option<String>,
    /// Enclosing group
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,
    /// Everything else
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Edge as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    /// Edge id; synthesized from the endpoints when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Upstream node id
    pub source: String,
    /// Downstream node id
    pub target: String,
    /// Optional label
    #[serde(default)]
    pub label: Option<String>,
    /// Payload (confidence, rationale, hypothesis flag)
    #[serde(default)]
    pub data: Option<EdgeData>,
}

impl RawNode {
    /// Convenience constructor used by tests and sources.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: RawNodeData {
                node_type: node_type.into(),
                ..RawNodeData::default()
            },
        }
    }

    /// Builder-style helper to set the parent id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.data.parent_id = Some(parent.into());
        self
    }

    /// Builder-style helper to set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = Some(label.into());
        self
    }
}

impl RawEdge {
    /// Convenience constructor used by tests and sources.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            source: source.into(),
            target: target.into(),
            label: None,
            data: None,
        }
    }
}

/// Non-fatal data-integrity problems found during normalization.
///
/// The graph is still produced; each variant documents what was repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeWarning {
    /// Node references a parent that is not in the payload.
    ///
    /// **Effect**: parent link dropped; the node is laid out as a root.
    OrphanedParent {
        /// The child node
        node: NodeId,
        /// The missing parent
        parent: NodeId,
    },

    /// Parent links loop back to this node.
    ///
    /// **Effect**: this node's parent link is dropped, breaking the loop.
    ParentCycle {
        /// Node whose link was dropped
        node: NodeId,
        /// The parent it pointed to
        parent: NodeId,
    },

    /// A node id appears more than once.
    ///
    /// **Effect**: later occurrences are skipped.
    DuplicateNode {
        /// The repeated id
        node: NodeId,
    },

    /// An edge id appears more than once.
    ///
    /// **Effect**: later occurrences are skipped.
    DuplicateEdge {
        /// The repeated id
        edge: EdgeId,
    },

    /// Edge endpoint is not in the payload.
    ///
    /// **Effect**: the edge is skipped.
    DanglingEdge {
        /// The skipped edge
        edge: EdgeId,
        /// The missing endpoint
        node: NodeId,
    },
}

impl fmt::Display for NormalizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanedParent { node, parent } => {
                write!(f, "node {node} references unknown parent {parent}; treated as root")
            }
            Self::ParentCycle { node, parent } => {
                write!(f, "parent link {node} -> {parent} closes a cycle; link dropped")
            }
            Self::DuplicateNode { node } => write!(f, "duplicate node {node}; later copy skipped"),
            Self::DuplicateEdge { edge } => write!(f, "duplicate edge {edge}; later copy skipped"),
            Self::DanglingEdge { edge, node } => {
                write!(f, "edge {edge} references unknown node {node}; edge skipped")
            }
        }
    }
}

/// Output of [`LineageGraph::normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// The repaired graph
    pub graph: LineageGraph,
    /// Everything that had to be repaired, in discovery order
    pub warnings: Vec<NormalizeWarning>,
}

impl LineageGraph {
    /// Normalize a backend payload into a valid graph.
    ///
    /// Never fails. Every repair is logged at `warn` level and returned in
    /// [`Normalized::warnings`].
    #[must_use]
    pub fn normalize(raw: RawGraph) -> Normalized {
        let mut warnings = Vec::new();

        let mut nodes: Vec<Node> = Vec::with_capacity(raw.nodes.len());
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(raw.nodes.len());
        for raw_node in raw.nodes {
            let id = NodeId::new(raw_node.id);
            if !seen.insert(id.clone()) {
                warnings.push(NormalizeWarning::DuplicateNode { node: id });
                continue;
            }
            let data = raw_node.data;
            nodes.push(Node {
                label: data
                    .label
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| id.to_string()),
                id,
                node_type: NodeType::from(data.node_type),
                parent_id: data.parent_id.filter(|p| !p.is_empty()).map(NodeId::new),
                attributes: data.attributes,
            });
        }

        for node in &mut nodes {
            if let Some(parent) = &node.parent_id
                && !seen.contains(parent)
            {
                warnings.push(NormalizeWarning::OrphanedParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
                node.parent_id = None;
            }
        }

        let mut edges = Vec::with_capacity(raw.edges.len());
        let mut seen_edges = HashSet::with_capacity(raw.edges.len());
        let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
        for raw_edge in raw.edges {
            let id = match raw_edge.id {
                Some(id) if !id.is_empty() => EdgeId::new(id),
                _ => {
                    let n = pair_counts
                        .entry((raw_edge.source.clone(), raw_edge.target.clone()))
                        .or_insert(0);
                    *n += 1;
                    EdgeId::new(format!("{}->{}#{}", raw_edge.source, raw_edge.target, n))
                }
            };
            if !seen_edges.insert(id.clone()) {
                warnings.push(NormalizeWarning::DuplicateEdge { edge: id });
                continue;
            }

            let source = NodeId::new(raw_edge.source);
            let target = NodeId::new(raw_edge.target);
            if let Some(missing) = [&source, &target].into_iter().find(|n| !seen.contains(*n)) {
                warnings.push(NormalizeWarning::DanglingEdge {
                    edge: id,
                    node: missing.clone(),
                });
                continue;
            }

            edges.push(Edge {
                id,
                source,
                target,
                label: raw_edge.label,
                data: raw_edge.data.unwrap_or_default(),
            });
        }

        let mut graph = LineageGraph::from_trusted(nodes, edges);
        for i in 0..graph.node_count() {
            let id = graph.nodes()[i].id.clone();
            if graph.parent_chain_loops(&id)
                && let Some(parent) = graph.detach_parent(i)
            {
                warnings.push(NormalizeWarning::ParentCycle { node: id, parent });
            }
        }

        for warning in &warnings {
            tracing::warn!(%warning, "Lineage data integrity problem");
        }

        Normalized { graph, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &LineageGraph) -> Vec<&str> {
        graph.nodes().iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn parses_backend_payload() {
        let json = r#"{
            "nodes": [
                {"id": "pkg", "data": {"type": "package", "label": "Load Sales"}},
                {"id": "t1", "data": {"type": "component_transform", "label": "Derive", "parent_id": "pkg", "rowcount": 4}},
                {"id": "orders", "data": {"type": "TABLE"}}
            ],
            "edges": [
                {"id": "e1", "source": "orders", "target": "t1", "label": "reads",
                 "data": {"confidence": 0.9, "rationale": "SELECT", "is_hypothesis": true}}
            ]
        }"#;
        let raw: RawGraph = serde_json::from_str(json).unwrap();
        let Normalized { graph, warnings } = LineageGraph::normalize(raw);

        assert!(warnings.is_empty());
        assert_eq!(ids(&graph), vec!["pkg", "t1", "orders"]);

        let t1 = graph.node(&NodeId::new("t1")).unwrap();
        assert_eq!(t1.node_type, NodeType::Transform);
        assert_eq!(t1.parent_id, Some(NodeId::new("pkg")));
        assert_eq!(t1.attributes.get("rowcount"), Some(&Value::from(4)));

        let orders = graph.node(&NodeId::new("orders")).unwrap();
        assert_eq!(orders.label, "orders", "label falls back to id");

        let edge = &graph.edges()[0];
        assert_eq!(edge.data.confidence, Some(0.9));
        assert!(edge.data.is_hypothesis);
        assert_eq!(edge.label.as_deref(), Some("reads"));
    }

    #[test]
    fn orphaned_parent_becomes_root_with_warning() {
        let raw = RawGraph {
            nodes: vec![RawNode::new("a", "table").with_parent("gone")],
            edges: vec![],
        };
        let result = LineageGraph::normalize(raw);

        assert!(result.graph.nodes()[0].parent_id.is_none());
        assert_eq!(
            result.warnings,
            vec![NormalizeWarning::OrphanedParent {
                node: NodeId::new("a"),
                parent: NodeId::new("gone"),
            }]
        );
    }

    #[test]
    fn parent_cycle_is_broken_at_first_node() {
        let raw = RawGraph {
            nodes: vec![
                RawNode::new("a", "package").with_parent("b"),
                RawNode::new("b", "package").with_parent("a"),
                RawNode::new("c", "table").with_parent("a"),
            ],
            edges: vec![],
        };
        let result = LineageGraph::normalize(raw);

        assert_eq!(
            result.warnings,
            vec![NormalizeWarning::ParentCycle {
                node: NodeId::new("a"),
                parent: NodeId::new("b"),
            }]
        );
        let graph = result.graph;
        assert!(graph.node(&NodeId::new("a")).unwrap().parent_id.is_none());
        assert_eq!(
            graph.node(&NodeId::new("b")).unwrap().parent_id,
            Some(NodeId::new("a"))
        );
        assert!(LineageGraph::from_parts(graph.nodes().to_vec(), vec![]).is_ok());
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let raw = RawGraph {
            nodes: vec![RawNode::new("a", "package").with_parent("a")],
            edges: vec![],
        };
        let result = LineageGraph::normalize(raw);
        assert!(result.graph.nodes()[0].parent_id.is_none());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn duplicates_and_dangling_edges_are_skipped() {
        let raw = RawGraph {
            nodes: vec![
                RawNode::new("a", "table").with_label("first"),
                RawNode::new("a", "view").with_label("second"),
                RawNode::new("b", "table"),
            ],
            edges: vec![
                RawEdge::new("e1", "a", "b"),
                RawEdge::new("e1", "b", "a"),
                RawEdge::new("e2", "a", "ghost"),
            ],
        };
        let result = LineageGraph::normalize(raw);

        assert_eq!(result.graph.node_count(), 2);
        assert_eq!(result.graph.nodes()[0].label, "first");
        assert_eq!(result.graph.edge_count(), 1);
        assert_eq!(result.warnings.len(), 3);
        assert!(matches!(
            result.warnings[2],
            NormalizeWarning::DanglingEdge { ref node, .. } if node.as_str() == "ghost"
        ));
    }

    #[test]
    fn missing_edge_ids_are_synthesized_per_pair() {
        let mut first = RawEdge::new("", "a", "b");
        first.id = None;
        let mut second = first.clone();
        second.label = Some("column mapping".to_string());

        let raw = RawGraph {
            nodes: vec![RawNode::new("a", "table"), RawNode::new("b", "table")],
            edges: vec![first, second],
        };
        let result = LineageGraph::normalize(raw);

        let ids: Vec<_> = result.graph.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a->b#1", "a->b#2"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn warning_display_mentions_effect() {
        let warning = NormalizeWarning::OrphanedParent {
            node: NodeId::new("a"),
            parent: NodeId::new("p"),
        };
        assert!(warning.to_string().contains("treated as root"));
    }
}
