//! Layout engine: node set + edges -> 2-D positions.
//!
//! Two interchangeable algorithms are selected by [`LayoutMode`]:
//!
//! | Mode | Algorithm | Nesting |
//! |------|-----------|---------|
//! | `LayeredLr` / `LayeredTb` | rank / order / position (Sugiyama-style) | groups contain their children |
//! | `Circular` | evenly spaced on a circle | flat, parent links ignored |
//!
//! ## Coordinate Convention
//!
//! In layered modes every [`NodePlacement::position`] is the node's top-left
//! corner. For a node whose placement carries a `parent_id` the position is
//! relative to the parent's top-left corner; otherwise it is global. The
//! absolute position of any node is therefore the sum of positions along its
//! parent chain, which [`LayoutResult::absolute_position`] computes.
//!
//! Circular mode differs: the position is the node's anchor point on the
//! circle (the circle center for a lone node), not a corner, and no
//! placement has a parent.
//!
//! Both algorithms are pure: the same graph and config always produce the
//! same result, including on cyclic or disconnected input.

mod circular;
mod layered;

use crate::model::{LineageGraph, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Which layout algorithm to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    /// Layered, ranks flow left to right
    #[default]
    LayeredLr,
    /// Layered, ranks flow top to bottom
    LayeredTb,
    /// Nodes evenly spaced around a circle
    Circular,
}

impl LayoutMode {
    /// Returns `true` for the two layered modes.
    #[must_use]
    pub fn is_layered(self) -> bool {
        matches!(self, LayoutMode::LayeredLr | LayoutMode::LayeredTb)
    }

    /// Preferred connection sides as `(target side, source side)`:
    /// edges enter a node on the first and leave it on the second.
    #[must_use]
    pub fn connection_sides(self) -> (Side, Side) {
        match self {
            LayoutMode::LayeredLr => (Side::Left, Side::Right),
            LayoutMode::LayeredTb | LayoutMode::Circular => (Side::Top, Side::Bottom),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutMode::LayeredLr => "LAYERED_LR",
            LayoutMode::LayeredTb => "LAYERED_TB",
            LayoutMode::Circular => "CIRCULAR",
        };
        f.write_str(name)
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "LAYERED_LR" | "LR" => Ok(LayoutMode::LayeredLr),
            "LAYERED_TB" | "TB" => Ok(LayoutMode::LayeredTb),
            "CIRCULAR" | "CIRCLE" => Ok(LayoutMode::Circular),
            _ => Err(format!(
                "invalid layout mode '{s}'; expected layered-lr, layered-tb or circular"
            )),
        }
    }
}

/// A point in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height of a node box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Size {
    /// Create a size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Side of a node box where edges attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left edge of the box
    Left,
    /// Right edge of the box
    Right,
    /// Top edge of the box
    Top,
    /// Bottom edge of the box
    Bottom,
}

/// Footprint class handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// Regular node
    Leaf,
    /// Compound group node
    Group,
}

/// Layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Declared size of leaf nodes
    pub node_size: Size,
    /// Declared (constant) size of group nodes
    pub group_size: Size,
    /// Minimum gap between nodes of the same rank
    pub node_sep: f64,
    /// Minimum gap between ranks
    pub rank_sep: f64,
    /// Inner margin between a group's frame and its children
    pub group_padding: f64,
    /// Space reserved at the top of a group for its label
    pub group_header: f64,
    /// Smallest circle radius before padding
    pub circular_min_radius: f64,
    /// Radius growth per node
    pub circular_radius_per_node: f64,
    /// Added to the computed circle radius
    pub circular_padding: f64,
    /// Shared center of the circular layout
    pub circular_center: Position,
    /// Barycenter ordering iterations (one down and one up sweep each)
    pub ordering_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_size: Size::new(180.0, 60.0),
            group_size: Size::new(320.0, 200.0),
            node_sep: 50.0,
            rank_sep: 100.0,
            group_padding: 20.0,
            group_header: 40.0,
            circular_min_radius: 200.0,
            circular_radius_per_node: 20.0,
            circular_padding: 50.0,
            circular_center: Position::new(0.0, 0.0),
            ordering_iterations: 4,
        }
    }
}

/// Where one node goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    /// The placed node
    pub id: NodeId,
    /// Top-left corner, relative to the parent's top-left if `parent_id` is
    /// set; the anchor point on the circle in circular mode
    pub position: Position,
    /// Frame this position is relative to
    pub parent_id: Option<NodeId>,
    /// Declared size of the node box
    pub size: Size,
    /// Space the layout reserved for the node, including nested children
    pub extent: Size,
    /// Footprint class
    pub size_class: SizeClass,
}

/// Positions for every node of a graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    mode: LayoutMode,
    placements: Vec<NodePlacement>,
    index: HashMap<NodeId, usize>,
}

impl LayoutResult {
    fn new(mode: LayoutMode, placements: Vec<NodePlacement>) -> Self {
        let index = placements
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        Self {
            mode,
            placements,
            index,
        }
    }

    /// Mode that produced this result.
    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Placements in graph input order.
    #[must_use]
    pub fn placements(&self) -> &[NodePlacement] {
        &self.placements
    }

    /// Number of placed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Returns `true` if nothing was placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Placement of a node.
    #[must_use]
    pub fn placement(&self, id: &NodeId) -> Option<&NodePlacement> {
        self.index.get(id).map(|&i| &self.placements[i])
    }

    /// Frame-relative position of a node.
    #[must_use]
    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.placement(id).map(|p| p.position)
    }

    /// Absolute top-left of a node: its position plus every ancestor's.
    #[must_use]
    pub fn absolute_position(&self, id: &NodeId) -> Option<Position> {
        let mut placement = self.placement(id)?;
        let mut absolute = placement.position;
        // Bounded by placement count: parent links form a forest.
        for _ in 0..self.placements.len() {
            let Some(parent) = placement.parent_id.as_ref() else {
                break;
            };
            placement = self.placement(parent)?;
            absolute = absolute + placement.position;
        }
        Some(absolute)
    }

    /// Preferred `(target side, source side)` for every node.
    #[must_use]
    pub fn connection_sides(&self) -> (Side, Side) {
        self.mode.connection_sides()
    }
}

/// Lay out `graph` with the selected algorithm.
#[must_use]
pub fn compute_layout(graph: &LineageGraph, mode: LayoutMode, config: &LayoutConfig) -> LayoutResult {
    let placements = match mode {
        LayoutMode::LayeredLr => layered::layout(graph, layered::Flow::LeftToRight, config),
        LayoutMode::LayeredTb => layered::layout(graph, layered::Flow::TopToBottom, config),
        LayoutMode::Circular => circular::layout(graph, config),
    };
    debug_assert_eq!(placements.len(), graph.node_count());
    tracing::debug!(
        %mode,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Computed layout"
    );
    LayoutResult::new(mode, placements)
}

/// Declared size and class of a node in the layered layout.
fn declared_size(graph: &LineageGraph, position: usize, config: &LayoutConfig) -> (Size, SizeClass) {
    if graph.nodes()[position].node_type.is_group() {
        (config.group_size, SizeClass::Group)
    } else {
        (config.node_size, SizeClass::Leaf)
    }
}
