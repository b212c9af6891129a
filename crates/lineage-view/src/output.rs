//! Output formatting for CLI commands.
//!
//! Every printer takes an [`OutputMode`]: text for people, pretty JSON for
//! scripts. Text printers write to any [`Write`] so tests can capture them.

use crate::perspective::Perspective;
use crate::session::Notification;
use colored::Colorize;
use lineage_graph::{
    ImpactSet, Lineage, LineageGraph, NodeId, NormalizeWarning, Reached, RenderModel, ViewStatus,
    VisualKind,
};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::io::{self, Write};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Terminal rendering preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Emit ANSI colors
    pub use_colors: bool,
    /// Use ASCII instead of Unicode icons
    pub use_ascii: bool,
}

impl OutputConfig {
    /// Read preferences from the environment.
    ///
    /// - `NO_COLOR`: any value disables colors
    /// - `LINEAGE_COLOR`: `0` or `false` disables colors
    /// - `LINEAGE_ASCII`: `1` or `true` selects ASCII icons
    #[must_use]
    pub fn from_env() -> Self {
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("LINEAGE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);
        let use_ascii = env::var("LINEAGE_ASCII")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            use_colors,
            use_ascii,
        }
    }

    /// Plain ASCII, no colors.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            use_ascii: true,
        }
    }

    fn id(self, id: &NodeId) -> String {
        if self.use_colors {
            id.as_str().cyan().to_string()
        } else {
            id.to_string()
        }
    }

    fn muted(self, text: &str) -> String {
        if self.use_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning(self, text: &str) -> String {
        if self.use_colors {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn kind_icon(self, kind: VisualKind) -> &'static str {
        match (kind, self.use_ascii) {
            (VisualKind::Transform, false) => "◆",
            (VisualKind::DataAsset, false) => "■",
            (VisualKind::Group, false) => "▣",
            (VisualKind::Transform, true) => "*",
            (VisualKind::DataAsset, true) => "#",
            (VisualKind::Group, true) => "+",
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            use_ascii: false,
        }
    }
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// Print a render model.
pub fn print_render_model(model: &RenderModel, perspective: &Perspective, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&json!({
            "perspective": perspective,
            "view": model,
        })),
        OutputMode::Text => {
            let stdout = io::stdout();
            write_render_model(&mut stdout.lock(), model, perspective, OutputConfig::from_env())
        }
    }
}

/// Print the lineage of a focus node.
pub fn print_lineage(lineage: &Lineage, graph: &LineageGraph, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&json!({
            "focus": lineage.focus,
            "upstream": reached_json(&lineage.upstream, graph),
            "downstream": reached_json(&lineage.downstream, graph),
        })),
        OutputMode::Text => {
            let stdout = io::stdout();
            write_lineage(&mut stdout.lock(), lineage, graph, OutputConfig::from_env())
        }
    }
}

/// Print the downstream impact of a source node.
pub fn print_impact(impact: &ImpactSet, graph: &LineageGraph, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            let mut active_edges: Vec<&str> = impact.active_edges.iter().map(|e| e.as_str()).collect();
            active_edges.sort_unstable();
            print_json(&json!({
                "source": impact.source,
                "impacted": reached_json(&impact.reached, graph),
                "activeEdges": active_edges,
            }))
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            write_impact(&mut stdout.lock(), impact, graph, OutputConfig::from_env())
        }
    }
}

/// Print the repairs normalization made to a payload.
pub fn print_warnings(
    perspective: &Perspective,
    graph: &LineageGraph,
    warnings: &[NormalizeWarning],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            let messages: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            print_json(&json!({
                "perspective": perspective,
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "warnings": messages,
            }))
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            write_warnings(&mut stdout.lock(), perspective, graph, warnings, OutputConfig::from_env())
        }
    }
}

/// Print queued session notifications to stderr.
///
/// Notifications are side messages; they never go to stdout so JSON output
/// stays parseable.
pub fn print_notifications(notifications: &[Notification]) -> io::Result<()> {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    let config = OutputConfig::from_env();
    for notification in notifications {
        let line = match notification {
            Notification::FetchFailed { perspective, message } => {
                format!("could not load {perspective} graph: {message}")
            }
            Notification::DataWarnings { perspective, count } => {
                format!("{perspective} graph needed {count} repair(s); run `lineage-view validate` for details")
            }
        };
        writeln!(handle, "{} {line}", config.warning("warning:"))?;
    }
    Ok(())
}

fn reached_json(reached: &[Reached], graph: &LineageGraph) -> Vec<serde_json::Value> {
    reached
        .iter()
        .map(|r| {
            let node = graph.node(&r.id);
            json!({
                "id": r.id,
                "depth": r.depth,
                "type": node.map(|n| n.node_type.as_str()),
                "label": node.map(|n| n.label.as_str()),
            })
        })
        .collect()
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_render_model<W: Write>(
    w: &mut W,
    model: &RenderModel,
    perspective: &Perspective,
    config: OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {}",
        config.heading(&perspective.to_string()),
        config.muted("layout"),
        model.layout_mode
    )?;

    if model.status == ViewStatus::NoData {
        writeln!(w, "No data to display.")?;
        return Ok(());
    }

    writeln!(w, "{} node(s), {} edge(s)", model.nodes.len(), model.edges.len())?;
    writeln!(w)?;

    for node in &model.nodes {
        let placement = format!("({:.1}, {:.1})", node.position.x, node.position.y);
        let mut line = format!(
            "{} {} {} {}",
            config.kind_icon(node.kind),
            config.id(&node.id),
            node.node_type,
            config.muted(&placement)
        );
        if let Some(parent) = &node.parent_id {
            line.push_str(&config.muted(&format!(" in {parent}")));
        }
        if node.label != node.id.as_str() {
            line.push_str(&format!(" \"{}\"", node.label));
        }
        if node.opacity < 1.0 {
            line = config.muted(&line);
        }
        writeln!(w, "  {line}")?;
    }

    if !model.edges.is_empty() {
        writeln!(w)?;
        let arrow = if config.use_ascii { "->" } else { "→" };
        for edge in &model.edges {
            let mut line = format!("{} {arrow} {}", edge.source, edge.target);
            if let Some(label) = &edge.label {
                line.push_str(&format!(" [{label}]"));
            }
            if edge.is_hypothesis {
                line.push_str(" (hypothesis)");
            }
            if edge.style.opacity < 1.0 {
                line = config.muted(&line);
            }
            writeln!(w, "  {line}")?;
        }
    }

    if let Some(impact) = &model.impact {
        writeln!(w)?;
        writeln!(
            w,
            "Impact of {}: {} node(s), {} edge(s)",
            config.id(&impact.source),
            impact.impacted_nodes,
            impact.active_edges
        )?;
    }

    Ok(())
}

fn write_reached<W: Write>(
    w: &mut W,
    reached: &[Reached],
    graph: &LineageGraph,
    config: OutputConfig,
) -> io::Result<()> {
    if reached.is_empty() {
        writeln!(w, "  {}", config.muted("(none)"))?;
        return Ok(());
    }
    for r in reached {
        let node_type = graph
            .node(&r.id)
            .map(|n| n.node_type.to_string())
            .unwrap_or_default();
        writeln!(
            w,
            "  {} {} {}",
            config.muted(&format!("[{}]", r.depth)),
            config.id(&r.id),
            node_type
        )?;
    }
    Ok(())
}

fn write_lineage<W: Write>(
    w: &mut W,
    lineage: &Lineage,
    graph: &LineageGraph,
    config: OutputConfig,
) -> io::Result<()> {
    let Some(focus) = &lineage.focus else {
        writeln!(w, "Node not found in the filtered graph.")?;
        return Ok(());
    };

    writeln!(w, "{} {}", config.heading("Lineage of"), config.id(focus))?;
    writeln!(w)?;
    writeln!(w, "Upstream ({}):", lineage.upstream.len())?;
    write_reached(w, &lineage.upstream, graph, config)?;
    writeln!(w, "Downstream ({}):", lineage.downstream.len())?;
    write_reached(w, &lineage.downstream, graph, config)
}

fn write_impact<W: Write>(
    w: &mut W,
    impact: &ImpactSet,
    graph: &LineageGraph,
    config: OutputConfig,
) -> io::Result<()> {
    let Some(source) = &impact.source else {
        writeln!(w, "Node not found in the filtered graph.")?;
        return Ok(());
    };

    writeln!(w, "{} {}", config.heading("Impact of"), config.id(source))?;
    writeln!(
        w,
        "{} node(s) affected, {} edge(s) active",
        impact.reached.len().saturating_sub(1),
        impact.active_edges.len()
    )?;
    writeln!(w)?;
    let downstream: Vec<Reached> = impact.reached.iter().filter(|r| r.depth > 0).cloned().collect();
    write_reached(w, &downstream, graph, config)
}

fn write_warnings<W: Write>(
    w: &mut W,
    perspective: &Perspective,
    graph: &LineageGraph,
    warnings: &[NormalizeWarning],
    config: OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{}: {} node(s), {} edge(s)",
        config.heading(&perspective.to_string()),
        graph.node_count(),
        graph.edge_count()
    )?;
    if warnings.is_empty() {
        writeln!(w, "No problems found.")?;
        return Ok(());
    }
    writeln!(w, "{} problem(s) repaired:", warnings.len())?;
    for warning in warnings {
        writeln!(w, "  {} {warning}", config.warning("-"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_graph::{
        FilterState, LayoutConfig, RawEdge, RawGraph, RawNode, derive_view, isolate_lineage,
        propagate_impact,
    };

    fn graph() -> LineageGraph {
        LineageGraph::normalize(RawGraph {
            nodes: vec![
                RawNode::new("a", "TABLE"),
                RawNode::new("b", "PIPELINE").with_label("Nightly load"),
                RawNode::new("c", "TABLE"),
            ],
            edges: vec![RawEdge::new("ab", "a", "b"), RawEdge::new("bc", "b", "c")],
        })
        .graph
    }

    fn render(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn render_model_lists_nodes_and_edges() {
        let model = derive_view(&graph(), &FilterState::default(), &LayoutConfig::default());
        let text = render(|w| write_render_model(w, &model, &Perspective::Global, OutputConfig::plain()));

        assert!(text.starts_with("GLOBAL layout LAYERED_LR"));
        assert!(text.contains("3 node(s), 2 edge(s)"));
        assert!(text.contains("* b PIPELINE"));
        assert!(text.contains("\"Nightly load\""));
        assert!(text.contains("a -> b"));
    }

    #[test]
    fn empty_model_says_no_data() {
        let model = RenderModel::no_data(lineage_graph::LayoutMode::Circular);
        let text = render(|w| write_render_model(w, &model, &Perspective::Architecture, OutputConfig::plain()));
        assert!(text.contains("No data to display."));
    }

    #[test]
    fn lineage_lists_depths() {
        let graph = graph();
        let lineage = isolate_lineage(&graph, &NodeId::new("c"));
        let text = render(|w| write_lineage(w, &lineage, &graph, OutputConfig::plain()));

        assert!(text.contains("Upstream (2):"));
        assert!(text.contains("[2] a TABLE"));
        assert!(text.contains("Downstream (0):\n  (none)"));
    }

    #[test]
    fn impact_excludes_source_from_count() {
        let graph = graph();
        let impact = propagate_impact(&graph, &NodeId::new("a"));
        let text = render(|w| write_impact(w, &impact, &graph, OutputConfig::plain()));
        assert!(text.contains("2 node(s) affected, 2 edge(s) active"));
    }

    #[test]
    fn missing_focus_is_reported() {
        let graph = graph();
        let lineage = isolate_lineage(&graph, &NodeId::new("nope"));
        let text = render(|w| write_lineage(w, &lineage, &graph, OutputConfig::plain()));
        assert!(text.contains("not found"));
    }

    #[test]
    fn warnings_are_listed() {
        let normalized = LineageGraph::normalize(RawGraph {
            nodes: vec![RawNode::new("a", "TABLE")],
            edges: vec![RawEdge::new("e", "a", "ghost")],
        });
        let text = render(|w| {
            write_warnings(
                w,
                &Perspective::Global,
                &normalized.graph,
                &normalized.warnings,
                OutputConfig::plain(),
            )
        });
        assert!(text.contains("1 problem(s) repaired:"));
        assert!(text.contains("ghost"));
    }
}
