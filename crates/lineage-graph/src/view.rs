//! Render-model derivation.
//!
//! [`derive_view`] is the whole presentation pipeline as one pure function:
//! filter, lay out, then weight by impact. The result is everything a
//! renderer needs and serializes to camelCase JSON.

use crate::filter::{FilterState, apply_filters};
use crate::layout::{LayoutConfig, LayoutMode, Position, Side, Size, SizeClass, compute_layout};
use crate::model::{EdgeId, LineageGraph, NodeId, NodeType, VisualKind};
use crate::traversal::{ImpactSet, propagate_impact};
use serde::{Deserialize, Serialize};

/// Opacity of anything not dimmed.
pub const FULL_OPACITY: f64 = 1.0;
/// Opacity of nodes outside the impact set.
pub const DIMMED_NODE_OPACITY: f64 = 0.25;
/// Opacity of inactive edges while an impact source is selected.
pub const DIMMED_EDGE_OPACITY: f64 = 0.15;
/// Stroke width of regular edges.
pub const EDGE_STROKE: f64 = 1.5;
/// Stroke width of active impact edges.
pub const ACTIVE_EDGE_STROKE: f64 = 3.0;
/// Regular edge color.
pub const EDGE_COLOR: &str = "#94a3b8";
/// Active impact edge color.
pub const ACTIVE_EDGE_COLOR: &str = "#ef4444";
/// Hypothesis edge color.
pub const HYPOTHESIS_EDGE_COLOR: &str = "#f59e0b";

/// Whether there is anything to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewStatus {
    /// At least one node is visible
    Ready,
    /// Nothing survived filtering (or nothing was fetched)
    NoData,
}

/// A node as the renderer receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Node id
    pub id: NodeId,
    /// Normalized type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display label
    pub label: String,
    /// Template selector
    pub kind: VisualKind,
    /// Top-left corner, relative to `parent_id` when set; the point on the
    /// circle in circular mode
    pub position: Position,
    /// Enclosing group frame (never set in circular mode)
    pub parent_id: Option<NodeId>,
    /// Footprint class
    pub size_class: SizeClass,
    /// Declared footprint; constant per size class
    pub size: Size,
    /// Space reserved for the node; for groups this holds their children
    pub frame: Size,
    /// Side where outgoing edges leave
    pub source_side: Side,
    /// Side where incoming edges enter
    pub target_side: Side,
    /// Impact weighting
    pub opacity: f64,
}

/// Visual weighting of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Impact weighting
    pub opacity: f64,
    /// Line thickness
    pub stroke_width: f64,
    /// CSS color
    pub color: String,
    /// Drawn dashed (hypothesis edges)
    pub dashed: bool,
}

/// An edge as the renderer receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    /// Edge id
    pub id: EdgeId,
    /// Upstream node
    pub source: NodeId,
    /// Downstream node
    pub target: NodeId,
    /// Optional label
    pub label: Option<String>,
    /// Visual weighting
    pub style: EdgeStyle,
    /// Backend confidence score
    pub confidence: Option<f64>,
    /// Backend rationale
    pub rationale: Option<String>,
    /// Unconfirmed dependency
    pub is_hypothesis: bool,
}

/// Summary of the highlighted impact, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    /// Selected node
    pub source: NodeId,
    /// Impacted nodes, source included
    pub impacted_nodes: usize,
    /// Highlighted edges
    pub active_edges: usize,
}

/// Everything needed to paint the current view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    /// Ready or no-data
    pub status: ViewStatus,
    /// Layout that produced the positions
    pub layout_mode: LayoutMode,
    /// Visible nodes in input order
    pub nodes: Vec<RenderNode>,
    /// Visible edges in input order
    pub edges: Vec<RenderEdge>,
    /// Highlighted impact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactSummary>,
}

impl RenderModel {
    /// A model with nothing to draw.
    #[must_use]
    pub fn no_data(layout_mode: LayoutMode) -> Self {
        Self {
            status: ViewStatus::NoData,
            layout_mode,
            nodes: Vec::new(),
            edges: Vec::new(),
            impact: None,
        }
    }

    /// Rendered node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Rendered edge by id.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }
}

/// Derive the render model for `raw` under `state`.
///
/// Impact weighting is computed on the filtered graph, so it never
/// highlights anything that is not rendered, and it never moves a node.
#[must_use]
pub fn derive_view(raw: &LineageGraph, state: &FilterState, config: &LayoutConfig) -> RenderModel {
    let visible = apply_filters(raw, state);
    if visible.is_empty() {
        return RenderModel::no_data(state.layout_mode);
    }

    let layout = compute_layout(&visible, state.layout_mode, config);
    let impact = state.active_impact_source().map(|source| propagate_impact(&visible, source));
    let (target_side, source_side) = layout.connection_sides();
    let flat = !state.layout_mode.is_layered();

    let nodes = visible
        .nodes()
        .iter()
        .zip(layout.placements())
        .map(|(node, placement)| RenderNode {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            label: node.label.clone(),
            kind: node.visual_kind(),
            position: placement.position,
            parent_id: if flat { None } else { placement.parent_id.clone() },
            size_class: placement.size_class,
            size: placement.size,
            frame: placement.extent,
            source_side,
            target_side,
            opacity: node_opacity(impact.as_ref(), &node.id),
        })
        .collect();

    let edges = visible
        .edges()
        .iter()
        .map(|edge| {
            let active = impact.as_ref().map(|i| i.is_active(&edge.id));
            RenderEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
                style: edge_style(active, edge.data.is_hypothesis),
                confidence: edge.data.confidence,
                rationale: edge.data.rationale.clone(),
                is_hypothesis: edge.data.is_hypothesis,
            }
        })
        .collect();

    RenderModel {
        status: ViewStatus::Ready,
        layout_mode: state.layout_mode,
        nodes,
        edges,
        impact: impact.and_then(|i| {
            Some(ImpactSummary {
                impacted_nodes: i.nodes.len(),
                active_edges: i.active_edges.len(),
                source: i.source?,
            })
        }),
    }
}

fn node_opacity(impact: Option<&ImpactSet>, id: &NodeId) -> f64 {
    match impact {
        Some(set) if !set.contains(id) => DIMMED_NODE_OPACITY,
        _ => FULL_OPACITY,
    }
}

/// `active` is `None` when no impact source is selected.
fn edge_style(active: Option<bool>, hypothesis: bool) -> EdgeStyle {
    let (opacity, stroke_width, color) = match active {
        Some(true) => (FULL_OPACITY, ACTIVE_EDGE_STROKE, ACTIVE_EDGE_COLOR),
        Some(false) => (DIMMED_EDGE_OPACITY, EDGE_STROKE, EDGE_COLOR),
        None if hypothesis => (FULL_OPACITY, EDGE_STROKE, HYPOTHESIS_EDGE_COLOR),
        None => (FULL_OPACITY, EDGE_STROKE, EDGE_COLOR),
    };
    EdgeStyle {
        opacity,
        stroke_width,
        color: color.to_string(),
        dashed: hypothesis,
    }
}
