//! Circular "survey" layout.
//!
//! Every node goes on one circle around a shared center, ignoring edges and
//! nesting. Node *i* of *n* sits at angle `i * 2π / n` on a circle of radius
//! `max(n * per_node, min_radius) + padding`. Positions are the points on
//! the circle themselves; a lone node sits on the center.

use super::{LayoutConfig, NodePlacement, Position, declared_size};
use crate::model::LineageGraph;
use std::f64::consts::TAU;

pub(super) fn layout(graph: &LineageGraph, config: &LayoutConfig) -> Vec<NodePlacement> {
    let count = graph.node_count();
    let radius = circle_radius(count, config);
    let center = config.circular_center;

    graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let position = if count == 1 {
                center
            } else {
                #[allow(clippy::cast_precision_loss)]
                let angle = i as f64 * TAU / count as f64;
                Position::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            };
            let (size, size_class) = declared_size(graph, i, config);
            NodePlacement {
                id: node.id.clone(),
                position,
                parent_id: None,
                size,
                extent: size,
                size_class,
            }
        })
        .collect()
}

/// Radius of the circle for `count` nodes, padding included.
#[allow(clippy::cast_precision_loss)]
pub(super) fn circle_radius(count: usize, config: &LayoutConfig) -> f64 {
    (count as f64 * config.circular_radius_per_node).max(config.circular_min_radius)
        + config.circular_padding
}
