//! Visible-subgraph derivation.
//!
//! [`apply_filters`] reduces a raw graph to what the user currently sees, in
//! a fixed order: type filter, then focus isolation over the type-filtered
//! graph, then edge and parent sync (both handled by
//! [`LineageGraph::retain_nodes`]). The raw graph is never touched, so
//! flipping a filter off and on again yields exactly the prior subgraph.

use crate::layout::LayoutMode;
use crate::model::{LineageGraph, NodeId, NodeType};
use crate::traversal::isolate_lineage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Client-side view state. Nothing here is persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Explicit per-type visibility; types not listed are visible
    #[serde(default)]
    pub type_visibility: BTreeMap<NodeType, bool>,
    /// Node whose lineage the view is restricted to
    #[serde(default)]
    pub focus_node_id: Option<NodeId>,
    /// Active layout algorithm
    #[serde(default)]
    pub layout_mode: LayoutMode,
    /// Whether node clicks select an impact source
    #[serde(default)]
    pub impact_mode_enabled: bool,
    /// Node whose downstream impact is highlighted
    #[serde(default)]
    pub impact_source: Option<NodeId>,
}

impl FilterState {
    /// Returns `true` unless the type was explicitly hidden.
    #[must_use]
    pub fn is_type_visible(&self, node_type: &NodeType) -> bool {
        self.type_visibility.get(node_type).copied().unwrap_or(true)
    }

    /// Set the visibility of one type.
    pub fn set_type_visible(&mut self, node_type: NodeType, visible: bool) {
        self.type_visibility.insert(node_type, visible);
    }

    /// Flip the visibility of one type and return the new value.
    pub fn toggle_type(&mut self, node_type: NodeType) -> bool {
        let visible = !self.is_type_visible(&node_type);
        self.type_visibility.insert(node_type, visible);
        visible
    }

    /// Focus on a node, or unfocus if it already is the focus.
    pub fn toggle_focus(&mut self, id: NodeId) {
        if self.focus_node_id.as_ref() == Some(&id) {
            self.focus_node_id = None;
        } else {
            self.focus_node_id = Some(id);
        }
    }

    /// Select an impact source, or clear it if it is already selected.
    /// Does nothing while impact mode is off.
    pub fn toggle_impact_source(&mut self, id: NodeId) {
        if !self.impact_mode_enabled {
            return;
        }
        if self.impact_source.as_ref() == Some(&id) {
            self.impact_source = None;
        } else {
            self.impact_source = Some(id);
        }
    }

    /// Turn impact mode on or off. Turning it off drops the selection.
    pub fn set_impact_mode(&mut self, enabled: bool) {
        self.impact_mode_enabled = enabled;
        if !enabled {
            self.impact_source = None;
        }
    }

    /// Impact source that should actually be highlighted.
    #[must_use]
    pub fn active_impact_source(&self) -> Option<&NodeId> {
        self.impact_source.as_ref().filter(|_| self.impact_mode_enabled)
    }

    /// Drop selections that refer to a specific graph (focus and impact
    /// source). Type visibility and layout survive.
    pub fn clear_selection(&mut self) {
        self.focus_node_id = None;
        self.impact_source = None;
    }
}

/// Derive the visible subgraph of `graph` under `state`.
///
/// Focus isolation runs on the type-filtered graph, so lineage never passes
/// through hidden nodes. A focus that is not visible yields an empty graph.
#[must_use]
pub fn apply_filters(graph: &LineageGraph, state: &FilterState) -> LineageGraph {
    let visible: HashSet<NodeId> = graph
        .nodes()
        .iter()
        .filter(|n| state.is_type_visible(&n.node_type))
        .map(|n| n.id.clone())
        .collect();

    let mut filtered = if visible.len() == graph.node_count() {
        graph.clone()
    } else {
        graph.retain_nodes(&visible)
    };

    if let Some(focus) = &state.focus_node_id {
        let lineage = isolate_lineage(&filtered, focus);
        filtered = filtered.retain_nodes(&lineage.node_set());
    }

    tracing::debug!(
        nodes = filtered.node_count(),
        edges = filtered.edge_count(),
        hidden = graph.node_count() - filtered.node_count(),
        "Applied filters"
    );
    filtered
}
