//! Layered layout for compound graphs.
//!
//! The parent forest splits the graph into *levels*: the roots form one
//! level and the children of each group form another. Every level is laid
//! out with the classic pipeline:
//!
//! 1. **Cycle breaking**: DFS in input order, back edges reversed
//! 2. **Ranking**: longest path over a topological order
//! 3. **Ordering**: barycenter sweeps, keeping the ordering with the fewest
//!    crossings between adjacent ranks
//! 4. **Positioning**: ranks separated by `rank_sep`, same-rank blocks by
//!    `node_sep`, each node pulled toward the mean of its predecessors
//!
//! Weakly-connected components of a level are laid out independently and
//! stacked along the cross axis.
//!
//! Levels are processed bottom-up so a group's block is known before its
//! own level is laid out: a group reserves the larger of its constant
//! footprint and its nested content. Edges between descendants of two
//! different siblings are lifted onto those siblings, so a group ranks
//! consistently with everything inside it.

#![allow(clippy::cast_precision_loss)]

use super::{LayoutConfig, NodePlacement, Position, Size, declared_size};
use crate::model::LineageGraph;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use std::collections::{HashMap, HashSet};

/// Direction in which ranks advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    /// Rank axis is x
    LeftToRight,
    /// Rank axis is y
    TopToBottom,
}

impl Flow {
    /// Split a size into `(rank-axis extent, cross-axis extent)`.
    fn split(self, size: Size) -> (f64, f64) {
        match self {
            Flow::LeftToRight => (size.width, size.height),
            Flow::TopToBottom => (size.height, size.width),
        }
    }

    /// Build a point from rank-axis and cross-axis coordinates.
    fn point(self, rank: f64, cross: f64) -> Position {
        match self {
            Flow::LeftToRight => Position::new(rank, cross),
            Flow::TopToBottom => Position::new(cross, rank),
        }
    }

    /// Build a size from rank-axis and cross-axis extents.
    fn size(self, rank: f64, cross: f64) -> Size {
        match self {
            Flow::LeftToRight => Size::new(rank, cross),
            Flow::TopToBottom => Size::new(cross, rank),
        }
    }
}

/// Parent forest over node positions.
struct Hierarchy {
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Every node after all of its descendants
    post_order: Vec<usize>,
    /// Ancestor chain of every node, outermost first, node itself last
    chains: Vec<Vec<usize>>,
}

impl Hierarchy {
    fn build(graph: &LineageGraph) -> Self {
        let count = graph.node_count();
        let mut parent = vec![None; count];
        let mut children = vec![Vec::new(); count];
        let mut roots = Vec::new();

        for (i, node) in graph.nodes().iter().enumerate() {
            match node.parent_id.as_ref().and_then(|p| graph.position_of(p)) {
                Some(p) => {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
                None => roots.push(i),
            }
        }

        let mut post_order = Vec::with_capacity(count);
        for &root in &roots {
            let mut stack = vec![(root, false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    post_order.push(node);
                } else {
                    stack.push((node, true));
                    stack.extend(children[node].iter().rev().map(|&c| (c, false)));
                }
            }
        }

        let mut chains: Vec<Vec<usize>> = vec![Vec::new(); count];
        for &node in post_order.iter().rev() {
            let mut chain = parent[node].map(|p| chains[p].clone()).unwrap_or_default();
            chain.push(node);
            chains[node] = chain;
        }

        Self {
            parent,
            children,
            roots,
            post_order,
            chains,
        }
    }
}

/// Result of laying out one level.
struct LevelLayout {
    /// Block centers, parallel to the level's members
    centers: Vec<Position>,
    /// Bounding box of the level, top-left at the origin
    size: Size,
}

/// One laid-out weakly-connected component.
struct PlacedComponent {
    /// `(rank coordinate, cross coordinate)` of each block center,
    /// parallel to the component's members
    coords: Vec<(f64, f64)>,
    rank_extent: f64,
    cross_extent: f64,
}

/// Lay out `graph` in layers flowing in the given direction.
pub(super) fn layout(graph: &LineageGraph, flow: Flow, config: &LayoutConfig) -> Vec<NodePlacement> {
    let count = graph.node_count();
    if count == 0 {
        return Vec::new();
    }

    let hierarchy = Hierarchy::build(graph);
    let mut level_edges = lift_edges(graph, &hierarchy);

    let mut extents = vec![Size::default(); count];
    let mut nested: HashMap<usize, LevelLayout> = HashMap::new();
    for &node in &hierarchy.post_order {
        let (declared, _) = declared_size(graph, node, config);
        let children = &hierarchy.children[node];
        if children.is_empty() {
            extents[node] = declared;
            continue;
        }

        let edges = level_edges.remove(&Some(node)).unwrap_or_default();
        let level = layout_level(children, &edges, &extents, flow, config);
        extents[node] = Size::new(
            declared
                .width
                .max(level.size.width + 2.0 * config.group_padding),
            declared
                .height
                .max(level.size.height + config.group_header + 2.0 * config.group_padding),
        );
        nested.insert(node, level);
    }

    let root_edges = level_edges.remove(&None).unwrap_or_default();
    let root_level = layout_level(&hierarchy.roots, &root_edges, &extents, flow, config);

    // Global top-left corners, parents before children.
    let mut global = vec![Position::default(); count];
    for (i, &root) in hierarchy.roots.iter().enumerate() {
        global[root] = top_left(root_level.centers[i], extents[root]);
    }
    let inset = Position::new(config.group_padding, config.group_header + config.group_padding);
    for &node in hierarchy.post_order.iter().rev() {
        if let Some(level) = nested.get(&node) {
            let origin = global[node] + inset;
            for (i, &child) in hierarchy.children[node].iter().enumerate() {
                global[child] = origin + top_left(level.centers[i], extents[child]);
            }
        }
    }

    graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let (size, size_class) = declared_size(graph, i, config);
            let position = match hierarchy.parent[i] {
                Some(parent) => global[i] - global[parent],
                None => global[i],
            };
            NodePlacement {
                id: node.id.clone(),
                position,
                parent_id: hierarchy.parent[i].map(|p| graph.nodes()[p].id.clone()),
                size,
                extent: extents[i],
                size_class,
            }
        })
        .collect()
}

fn top_left(center: Position, extent: Size) -> Position {
    Position::new(center.x - extent.width / 2.0, center.y - extent.height / 2.0)
}

/// Assign every non-nesting edge to the level where its endpoints'
/// ancestor chains diverge, as an edge between the diverging siblings.
///
/// Keys are the enclosing group (`None` for the root level). Self-loops and
/// edges between a group and its own descendants do not affect ranking and
/// are dropped.
fn lift_edges(graph: &LineageGraph, hierarchy: &Hierarchy) -> HashMap<Option<usize>, Vec<(usize, usize)>> {
    let mut levels: HashMap<Option<usize>, Vec<(usize, usize)>> = HashMap::new();
    for edge in graph.edges() {
        let (Some(source), Some(target)) = (
            graph.position_of(&edge.source),
            graph.position_of(&edge.target),
        ) else {
            continue;
        };
        if source == target {
            continue;
        }

        let (source_chain, target_chain) = (&hierarchy.chains[source], &hierarchy.chains[target]);
        let shared = source_chain
            .iter()
            .zip(target_chain)
            .take_while(|(a, b)| a == b)
            .count();
        if shared == source_chain.len() || shared == target_chain.len() {
            continue;
        }

        let level = shared.checked_sub(1).map(|i| source_chain[i]);
        levels
            .entry(level)
            .or_default()
            .push((source_chain[shared], target_chain[shared]));
    }
    levels
}

/// Lay out sibling blocks. `edges` use node positions; `extents` holds the
/// block size of every node already processed.
fn layout_level(
    members: &[usize],
    edges: &[(usize, usize)],
    extents: &[Size],
    flow: Flow,
    config: &LayoutConfig,
) -> LevelLayout {
    let count = members.len();
    let local: HashMap<usize, usize> = members.iter().enumerate().map(|(i, &m)| (m, i)).collect();

    let mut seen = HashSet::new();
    let local_edges: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|(s, t)| Some((*local.get(s)?, *local.get(t)?)))
        .filter(|(s, t)| s != t)
        .filter(|e| seen.insert(*e))
        .collect();

    let dims: Vec<(f64, f64)> = members.iter().map(|&m| flow.split(extents[m])).collect();
    let acyclic = break_cycles(count, &local_edges);
    let ranks = assign_ranks(count, &acyclic);

    let mut preds = vec![Vec::new(); count];
    let mut succs = vec![Vec::new(); count];
    for &(u, w) in &acyclic {
        preds[w].push(u);
        succs[u].push(w);
    }
    let adjacency = Adjacency {
        edges: &acyclic,
        preds: &preds,
        succs: &succs,
        ranks: &ranks,
    };

    let mut centers = vec![Position::default(); count];
    let mut cross_offset = 0.0;
    let mut rank_extent: f64 = 0.0;
    for component in weak_components(count, &local_edges) {
        let placed = place_component(&component, &adjacency, &dims, config);
        for (&v, &(rank, cross)) in component.iter().zip(&placed.coords) {
            centers[v] = flow.point(rank, cross + cross_offset);
        }
        cross_offset += placed.cross_extent + config.node_sep;
        rank_extent = rank_extent.max(placed.rank_extent);
    }

    LevelLayout {
        centers,
        size: flow.size(rank_extent, (cross_offset - config.node_sep).max(0.0)),
    }
}

/// Level-local adjacency after cycle breaking.
struct Adjacency<'a> {
    edges: &'a [(usize, usize)],
    preds: &'a [Vec<usize>],
    succs: &'a [Vec<usize>],
    ranks: &'a [usize],
}

/// Reverse every DFS back edge so the result is acyclic.
///
/// DFS starts from nodes in input order and follows edges in input order,
/// so which edge of a cycle gets reversed depends only on first discovery.
fn break_cycles(count: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    const UNVISITED: u8 = 0;
    const ON_STACK: u8 = 1;
    const DONE: u8 = 2;

    let mut out: Vec<Vec<(usize, usize)>> = vec![Vec::new(); count];
    for (e, &(u, w)) in edges.iter().enumerate() {
        out[u].push((e, w));
    }

    let mut state = vec![UNVISITED; count];
    let mut reversed = vec![false; edges.len()];
    for start in 0..count {
        if state[start] != UNVISITED {
            continue;
        }
        state[start] = ON_STACK;
        let mut stack = vec![(start, 0usize)];
        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            if let Some(&(e, target)) = out[node].get(*next) {
                *next += 1;
                match state[target] {
                    UNVISITED => {
                        state[target] = ON_STACK;
                        stack.push((target, 0));
                    }
                    ON_STACK => reversed[e] = true,
                    _ => {}
                }
            } else {
                state[node] = DONE;
                stack.pop();
            }
        }
    }

    let mut seen = HashSet::new();
    edges
        .iter()
        .zip(&reversed)
        .map(|(&(u, w), &flip)| if flip { (w, u) } else { (u, w) })
        .filter(|e| seen.insert(*e))
        .collect()
}

/// Longest-path ranks: sources get rank 0, every edge spans at least one rank.
fn assign_ranks(count: usize, acyclic: &[(usize, usize)]) -> Vec<usize> {
    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(count, acyclic.len());
    for _ in 0..count {
        dag.add_node(());
    }
    for &(u, w) in acyclic {
        dag.add_edge(NodeIndex::new(u), NodeIndex::new(w), ());
    }

    let mut ranks = vec![0usize; count];
    match toposort(&dag, None) {
        Ok(order) => {
            for node in order {
                let rank = ranks[node.index()];
                for next in dag.neighbors(node) {
                    ranks[next.index()] = ranks[next.index()].max(rank + 1);
                }
            }
        }
        Err(cycle) => {
            tracing::warn!(
                node = cycle.node_id().index(),
                "Cycle survived cycle breaking, placing level in a single rank"
            );
        }
    }
    ranks
}

/// Weakly-connected components, each listed in input order, ordered by
/// their first member.
fn weak_components(count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut sets = UnionFind::<usize>::new(count);
    for &(u, w) in edges {
        sets.union(u, w);
    }

    let mut by_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for node in 0..count {
        let root = sets.find(node);
        let slot = *by_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(node);
    }
    components
}

/// Order and position one component.
fn place_component(
    component: &[usize],
    adjacency: &Adjacency<'_>,
    dims: &[(f64, f64)],
    config: &LayoutConfig,
) -> PlacedComponent {
    let rank_count = component
        .iter()
        .map(|&v| adjacency.ranks[v])
        .max()
        .map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for &v in component {
        layers[adjacency.ranks[v]].push(v);
    }

    order_layers(&mut layers, adjacency, dims.len(), config.ordering_iterations);

    let thickness: Vec<f64> = layers
        .iter()
        .map(|layer| layer.iter().map(|&v| dims[v].0).fold(0.0, f64::max))
        .collect();
    let mut rank_start = Vec::with_capacity(rank_count);
    let mut cursor = 0.0;
    for t in &thickness {
        rank_start.push(cursor);
        cursor += t + config.rank_sep;
    }
    let rank_extent = (cursor - config.rank_sep).max(0.0);

    let mut cross = vec![0.0; dims.len()];
    for layer in &layers {
        let mut next_free = f64::NEG_INFINITY;
        for &v in layer {
            let half = dims[v].1 / 2.0;
            let earliest = next_free + half;
            let preds = &adjacency.preds[v];
            let center = if preds.is_empty() {
                if next_free.is_finite() { earliest } else { half }
            } else {
                let desired = preds.iter().map(|&u| cross[u]).sum::<f64>() / preds.len() as f64;
                desired.max(earliest)
            };
            cross[v] = center;
            next_free = center + half + config.node_sep;
        }
    }

    let low = component
        .iter()
        .map(|&v| cross[v] - dims[v].1 / 2.0)
        .fold(f64::INFINITY, f64::min);
    let shift = if low.is_finite() { low } else { 0.0 };
    let cross_extent = component
        .iter()
        .map(|&v| cross[v] - shift + dims[v].1 / 2.0)
        .fold(0.0, f64::max);

    let coords = component
        .iter()
        .map(|&v| {
            let rank = adjacency.ranks[v];
            (rank_start[rank] + thickness[rank] / 2.0, cross[v] - shift)
        })
        .collect();

    PlacedComponent {
        coords,
        rank_extent,
        cross_extent,
    }
}

/// Barycenter sweeps, keeping the best ordering seen.
fn order_layers(layers: &mut Vec<Vec<usize>>, adjacency: &Adjacency<'_>, count: usize, iterations: usize) {
    let mut slot = vec![0.0; count];
    refresh_slots(layers, &mut slot);

    let mut best = layers.clone();
    let mut best_crossings = count_crossings(layers, adjacency, &slot);
    for _ in 0..iterations {
        if best_crossings == 0 {
            break;
        }
        for r in 1..layers.len() {
            reorder(&mut layers[r], adjacency.preds, &mut slot);
        }
        for r in (0..layers.len().saturating_sub(1)).rev() {
            reorder(&mut layers[r], adjacency.succs, &mut slot);
        }

        let crossings = count_crossings(layers, adjacency, &slot);
        if crossings < best_crossings {
            best = layers.clone();
            best_crossings = crossings;
        }
    }
    *layers = best;
}

fn refresh_slots(layers: &[Vec<usize>], slot: &mut [f64]) {
    for layer in layers {
        for (i, &v) in layer.iter().enumerate() {
            slot[v] = i as f64;
        }
    }
}

/// Stable sort of one layer by the mean slot of each node's neighbors.
/// Nodes without neighbors keep their current slot as key.
fn reorder(layer: &mut [usize], neighbors: &[Vec<usize>], slot: &mut [f64]) {
    let keys: HashMap<usize, f64> = layer
        .iter()
        .map(|&v| {
            let around = &neighbors[v];
            let key = if around.is_empty() {
                slot[v]
            } else {
                around.iter().map(|&u| slot[u]).sum::<f64>() / around.len() as f64
            };
            (v, key)
        })
        .collect();

    layer.sort_by(|a, b| keys[a].total_cmp(&keys[b]));
    for (i, &v) in layer.iter().enumerate() {
        slot[v] = i as f64;
    }
}

/// Crossings between edges that connect adjacent ranks of these layers.
fn count_crossings(layers: &[Vec<usize>], adjacency: &Adjacency<'_>, slot: &[f64]) -> usize {
    let members: HashSet<usize> = layers.iter().flatten().copied().collect();
    let mut spans: Vec<Vec<(f64, f64)>> = vec![Vec::new(); layers.len()];
    for &(u, w) in adjacency.edges {
        if members.contains(&u) && adjacency.ranks[w] == adjacency.ranks[u] + 1 {
            spans[adjacency.ranks[u]].push((slot[u], slot[w]));
        }
    }

    let mut total = 0;
    for between in &spans {
        for (i, a) in between.iter().enumerate() {
            for b in &between[i + 1..] {
                if (a.0 - b.0) * (a.1 - b.1) < 0.0 {
                    total += 1;
                }
            }
        }
    }
    total
}
