//! Command execution logic.

use anyhow::{Context, Result};
use std::path::Path;

use super::args::{ImpactArgs, InitArgs, IsolateArgs, RenderArgs, ValidateArgs};
use crate::app::App;
use crate::output::{self, OutputMode};
use crate::perspective::Perspective;
use crate::session::{Interaction, ViewSession};
use lineage_graph::{
    LineageGraph, NodeId, NodeType, apply_filters, isolate_lineage, propagate_impact,
};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, working_dir: &Path) -> Result<()> {
    use crate::commands::init;

    if !args.quiet {
        println!(
            "Initializing lineage workspace{}...",
            args.solution_id
                .as_ref()
                .map(|s| format!(" for solution '{s}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(working_dir, args.solution_id.as_deref()).await?;

    if !args.quiet {
        println!("Initialized lineage workspace in {}", result.lineage_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Graphs: {}", result.data_dir.display());
        println!("  Solution: {}", result.solution_id);
    }

    Ok(())
}

/// Execute the render command
pub async fn execute_render(app: &App, args: &RenderArgs, output_mode: OutputMode) -> Result<()> {
    let mut session = load_session(app, args.perspective.perspective()).await?;

    if let Some(layout) = args.layout {
        session.handle(Interaction::SetLayout(layout.into()))?;
    }
    for name in &args.hide {
        set_type_visible(&mut session, name, false)?;
    }
    for name in &args.show {
        set_type_visible(&mut session, name, true)?;
    }
    if let Some(focus) = &args.focus {
        session.handle(Interaction::SetFocus(NodeId::new(focus.clone())))?;
    }
    if let Some(source) = &args.impact {
        session.handle(Interaction::SelectImpactSource(NodeId::new(source.clone())))?;
    }

    output::print_render_model(&session.render_model(), session.perspective(), output_mode)?;
    Ok(())
}

/// Execute the isolate command
pub async fn execute_isolate(app: &App, args: &IsolateArgs, output_mode: OutputMode) -> Result<()> {
    let session = load_session(app, args.perspective.perspective()).await?;
    let focus = NodeId::new(args.node.clone());
    let graph = filtered_graph(&session, &focus, &args.hide)?;

    let lineage = isolate_lineage(&graph, &focus);
    output::print_lineage(&lineage, &graph, output_mode)?;
    Ok(())
}

/// Execute the impact command
pub async fn execute_impact(app: &App, args: &ImpactArgs, output_mode: OutputMode) -> Result<()> {
    let session = load_session(app, args.perspective.perspective()).await?;
    let source = NodeId::new(args.node.clone());
    let graph = filtered_graph(&session, &source, &args.hide)?;

    let impact = propagate_impact(&graph, &source);
    output::print_impact(&impact, &graph, output_mode)?;
    Ok(())
}

/// Execute the validate command
///
/// Normalizes the payload without going through a session so every repair
/// is listed, not just counted.
pub async fn execute_validate(app: &App, args: &ValidateArgs, output_mode: OutputMode) -> Result<()> {
    let perspective = args.perspective.perspective();
    let raw = fetch(app, &perspective).await?;
    let normalized = LineageGraph::normalize(raw);

    output::print_warnings(&perspective, &normalized.graph, &normalized.warnings, output_mode)?;

    if args.strict && !normalized.warnings.is_empty() {
        anyhow::bail!(
            "{} graph has {} data problem(s)",
            perspective,
            normalized.warnings.len()
        );
    }
    Ok(())
}

async fn fetch(app: &App, perspective: &Perspective) -> Result<lineage_graph::RawGraph> {
    let request = crate::source::GraphRequest::new(app.config().solution_id.clone(), perspective.clone());
    app.source()
        .fetch_graph(&request)
        .await
        .with_context(|| format!("failed to load {perspective} graph"))
}

/// A session showing `perspective`, or an error if the fetch failed.
///
/// The CLI has no previous graph to fall back on, so a failed fetch is fatal
/// here instead of becoming a notification.
async fn load_session(app: &App, perspective: Perspective) -> Result<ViewSession> {
    let mut session = app.session();
    let ticket = session.request(perspective);
    let raw = fetch(app, ticket.perspective()).await?;
    session.complete(ticket, Ok(raw));
    output::print_notifications(&session.drain_notifications())?;
    Ok(session)
}

fn set_type_visible(session: &mut ViewSession, name: &str, visible: bool) -> Result<()> {
    let node_type = NodeType::from(name);
    if session.filter().is_type_visible(&node_type) != visible {
        session.handle(Interaction::ToggleType(node_type))?;
    }
    Ok(())
}

/// The loaded graph with configured and requested types hidden.
///
/// Fails if `node` is not in the loaded graph at all. A node that exists
/// but is hidden yields a graph without it, which the printers report.
fn filtered_graph(session: &ViewSession, node: &NodeId, hide: &[String]) -> Result<LineageGraph> {
    let snapshot = session
        .snapshot()
        .context("no graph loaded")?;
    if !snapshot.graph.contains(node) {
        anyhow::bail!("node '{node}' is not in the {} graph", snapshot.perspective);
    }

    let mut state = session.filter().clone();
    for name in hide {
        state.set_type_visible(NodeType::from(name.as_str()), false);
    }
    Ok(apply_filters(&snapshot.graph, &state))
}
