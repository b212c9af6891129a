//! Domain types for lineage graphs.
//!
//! A [`LineageGraph`] is an arena: nodes live in a `Vec` in input order and
//! are indexed by id. Group membership is a `parent_id` back-reference, never
//! an owning structure, so a node can be re-parented or dropped without
//! touching its former parent.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Prefix some backends put in front of component types (`component_transform`).
const COMPONENT_PREFIX: &str = "COMPONENT_";

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Canonical asset type of a node.
///
/// Parsing always goes through [`normalize_type`], so `"component_transform"`,
/// `"Transform"` and `"TRANSFORM"` all land on [`NodeType::Transform`].
/// Types this crate does not know keep their normalized name in
/// [`NodeType::Other`] so type filters can still address them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Database table
    Table,
    /// Database view
    View,
    /// Orchestrated pipeline
    Pipeline,
    /// Process grouping several steps
    Process,
    /// Script or notebook
    Script,
    /// File on disk or object storage
    File,
    /// Database
    Database,
    /// Package grouping internal components
    Package,
    /// External data source
    Source,
    /// External data sink
    Sink,
    /// Generic container
    Container,
    /// Transformation step inside a package
    Transform,
    /// Column-level asset
    Column,
    /// Scheduled job
    Job,
    /// Anything else, by normalized name
    Other(String),
}

impl NodeType {
    /// All known (non-`Other`) types, in display order.
    pub const KNOWN: [NodeType; 14] = [
        NodeType::Table,
        NodeType::View,
        NodeType::Pipeline,
        NodeType::Process,
        NodeType::Script,
        NodeType::File,
        NodeType::Database,
        NodeType::Package,
        NodeType::Source,
        NodeType::Sink,
        NodeType::Container,
        NodeType::Transform,
        NodeType::Column,
        NodeType::Job,
    ];

    /// Normalized, uppercase name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Table => "TABLE",
            NodeType::View => "VIEW",
            NodeType::Pipeline => "PIPELINE",
            NodeType::Process => "PROCESS",
            NodeType::Script => "SCRIPT",
            NodeType::File => "FILE",
            NodeType::Database => "DATABASE",
            NodeType::Package => "PACKAGE",
            NodeType::Source => "SOURCE",
            NodeType::Sink => "SINK",
            NodeType::Container => "CONTAINER",
            NodeType::Transform => "TRANSFORM",
            NodeType::Column => "COLUMN",
            NodeType::Job => "JOB",
            NodeType::Other(name) => name,
        }
    }

    /// Rendering role of this type.
    #[must_use]
    pub fn visual_kind(&self) -> VisualKind {
        match self {
            NodeType::Package | NodeType::Container | NodeType::Process => VisualKind::Group,
            NodeType::Pipeline | NodeType::Script | NodeType::Transform | NodeType::Job => {
                VisualKind::Transform
            }
            _ => VisualKind::DataAsset,
        }
    }

    /// Returns `true` if nodes of this type act as compound groups.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.visual_kind() == VisualKind::Group
    }
}

/// Normalize a raw type string: trim, uppercase, strip `COMPONENT_`.
///
/// An empty type normalizes to `FILE`, the generic data-asset kind.
#[must_use]
pub fn normalize_type(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let stripped = upper.strip_prefix(COMPONENT_PREFIX).unwrap_or(&upper);
    if stripped.is_empty() {
        NodeType::File.as_str().to_string()
    } else {
        stripped.to_string()
    }
}

impl From<&str> for NodeType {
    fn from(raw: &str) -> Self {
        let normalized = normalize_type(raw);
        NodeType::KNOWN
            .iter()
            .find(|known| known.as_str() == normalized)
            .cloned()
            .unwrap_or(NodeType::Other(normalized))
    }
}

impl From<String> for NodeType {
    fn from(raw: String) -> Self {
        NodeType::from(raw.as_str())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering template selector. Never changes data semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualKind {
    /// Pipelines, scripts and other transformation steps
    Transform,
    /// Tables, files and other data assets (the default)
    DataAsset,
    /// Compound nodes that contain other nodes
    Group,
}

/// A node of the lineage graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Normalized asset type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Enclosing group, if any
    pub parent_id: Option<NodeId>,
    /// Display label
    pub label: String,
    /// Opaque backend attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Node {
    /// Create a root node with an empty attribute map.
    pub fn new(id: impl Into<String>, node_type: impl Into<NodeType>, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            node_type: node_type.into(),
            parent_id: None,
            label: label.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style helper to place this node inside a group.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(NodeId::new(parent));
        self
    }

    /// Rendering role of this node.
    #[must_use]
    pub fn visual_kind(&self) -> VisualKind {
        self.node_type.visual_kind()
    }
}

/// Edge payload from the lineage backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    /// Confidence score of the inferred dependency (0.0 - 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Why the backend believes this dependency exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Unconfirmed dependency
    #[serde(default, alias = "is_hypothesis")]
    pub is_hypothesis: bool,
    /// Any other backend keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed dependency edge: data flows from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,
    /// Upstream node
    pub source: NodeId,
    /// Downstream node
    pub target: NodeId,
    /// Optional display label
    pub label: Option<String>,
    /// Backend payload
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    /// Create an unlabeled edge with empty data.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: EdgeId::new(id),
            source: NodeId::new(source),
            target: NodeId::new(target),
            label: None,
            data: EdgeData::default(),
        }
    }

    /// Returns `true` if the edge starts and ends at the same node.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Arena of nodes and edges with an id index.
///
/// Every `LineageGraph` upholds:
/// - node and edge ids are unique
/// - every `parent_id` references a node of the same graph
/// - parent links form a forest
/// - every edge endpoint references a node of the same graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
}

impl LineageGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph, rejecting any structural defect.
    ///
    /// Use [`LineageGraph::normalize`](crate::normalize) for backend data that
    /// should degrade gracefully instead.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicateNode` / `Error::DuplicateEdge` on repeated ids
    /// - `Error::UnknownParent` if a `parent_id` does not resolve
    /// - `Error::ParentCycle` if parent links loop
    /// - `Error::DanglingEdge` if an edge endpoint does not resolve
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(Error::DuplicateNode(node.id.clone()));
            }
        }

        for node in &nodes {
            if let Some(parent) = &node.parent_id
                && !index.contains_key(parent)
            {
                return Err(Error::UnknownParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let graph = Self {
            nodes,
            edges: Vec::new(),
            index,
        };
        for node in &graph.nodes {
            if graph.parent_chain_loops(&node.id) {
                return Err(Error::ParentCycle(node.id.clone()));
            }
        }

        let mut seen_edges = HashSet::with_capacity(edges.len());
        for edge in &edges {
            if !seen_edges.insert(edge.id.clone()) {
                return Err(Error::DuplicateEdge(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !graph.contains(endpoint) {
                    return Err(Error::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        Ok(Self { edges, ..graph })
    }

    /// Assemble a graph from parts already known to be valid.
    pub(crate) fn from_trusted(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        Self {
            nodes,
            edges,
            index,
        }
    }

    /// Nodes in input order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in input order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if a node with this id exists.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Position of a node in input order.
    #[must_use]
    pub fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Parent of a node, if it has one.
    #[must_use]
    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        self.node(id)
            .and_then(|n| n.parent_id.as_ref())
            .and_then(|p| self.node(p))
    }

    /// Direct children of a node, in input order.
    pub fn children_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_ref() == Some(id))
    }

    /// Nodes without a parent, in input order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.parent_id.is_none())
    }

    /// Outermost ancestor of a node (the node itself for roots).
    #[must_use]
    pub fn root_of<'a>(&'a self, id: &'a NodeId) -> &'a NodeId {
        let mut current = id;
        // Bounded by node count: parent links form a forest.
        for _ in 0..=self.nodes.len() {
            match self.node(current).and_then(|n| n.parent_id.as_ref()) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Returns `true` if following parent links from `id` reaches `id` again.
    pub(crate) fn parent_chain_loops(&self, id: &NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.node(id).and_then(|n| n.parent_id.as_ref());
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            current = self.node(parent).and_then(|n| n.parent_id.as_ref());
        }
        false
    }

    /// Drop the parent link of the node at `position`, returning the old parent.
    pub(crate) fn detach_parent(&mut self, position: usize) -> Option<NodeId> {
        self.nodes.get_mut(position).and_then(|n| n.parent_id.take())
    }

    /// Build a new graph keeping only the given nodes.
    ///
    /// Edges survive iff both endpoints survive. A surviving node whose
    /// parent did not survive becomes a root.
    #[must_use]
    pub fn retain_nodes(&self, keep: &HashSet<NodeId>) -> Self {
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| keep.contains(&n.id))
            .map(|n| {
                let mut node = n.clone();
                if let Some(parent) = &node.parent_id
                    && !keep.contains(parent)
                {
                    tracing::debug!(
                        node = %node.id,
                        parent = %parent,
                        "Parent filtered out, promoting node to root"
                    );
                    node.parent_id = None;
                }
                node
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|e| keep.contains(&e.source) && keep.contains(&e.target))
            .cloned()
            .collect();

        Self::from_trusted(nodes, edges)
    }
}
