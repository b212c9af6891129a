//! View session: the perspective controller.
//!
//! A [`ViewSession`] owns the fetched raw graph of the current perspective
//! and the client-side [`FilterState`]. Interactions fall in two classes:
//!
//! - **Perspective changes** need a new raw graph. They return a
//!   [`FetchTicket`]; the caller fetches and hands the result back through
//!   [`ViewSession::complete`].
//! - **Everything else** (type toggles, focus, layout, impact) only updates
//!   the filter state. The next [`ViewSession::render_model`] re-derives the
//!   view from the graph already held.
//!
//! ## Last Fetch Wins
//!
//! Every request bumps a generation counter and the ticket remembers the
//! generation it was issued for. A completion carrying an older generation
//! is discarded, so a slow response for a perspective the user already left
//! can never overwrite newer state.
//!
//! ## Failed Fetches
//!
//! A failed fetch queues a one-shot [`Notification::FetchFailed`] and keeps
//! the previous snapshot on screen. The session falls back to the
//! perspective of that snapshot.

use crate::error::{Error, Result};
use crate::perspective::Perspective;
use crate::source::{GraphRequest, GraphSource};
use chrono::{DateTime, Utc};
use lineage_graph::{
    Edge, EdgeId, FilterState, LayoutConfig, LayoutMode, LineageGraph, NodeId, NodeType,
    NormalizeWarning, RawGraph, RenderModel, derive_view,
};
use std::collections::VecDeque;

/// Proof that a fetch was requested, checked on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a fetch ticket must be completed or the session stays loading"]
pub struct FetchTicket {
    generation: u64,
    perspective: Perspective,
}

impl FetchTicket {
    /// Perspective the fetch is for.
    pub fn perspective(&self) -> &Perspective {
        &self.perspective
    }

    /// Generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A fetched and normalized graph.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Perspective the graph was fetched for
    pub perspective: Perspective,
    /// Normalized graph
    pub graph: LineageGraph,
    /// Repairs made during normalization
    pub warnings: Vec<NormalizeWarning>,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

/// One-shot messages for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A fetch failed; the previous graph is still shown
    FetchFailed {
        /// Perspective that could not be loaded
        perspective: Perspective,
        /// Error text
        message: String,
    },
    /// The fetched graph needed repairs
    DataWarnings {
        /// Perspective that was loaded
        perspective: Perspective,
        /// Number of repairs
        count: usize,
    },
}

/// User actions forwarded by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// A node was clicked
    NodeClicked(NodeId),
    /// The pointer entered an edge (`Some`) or left it (`None`)
    EdgeHovered(Option<EdgeId>),
    /// A type filter checkbox was flipped
    ToggleType(NodeType),
    /// A layout was picked
    SetLayout(LayoutMode),
    /// Focus a node explicitly
    SetFocus(NodeId),
    /// Drop the focus
    ClearFocus,
    /// Impact mode switch was flipped
    ToggleImpactMode,
    /// Turn impact mode on with this node as the source
    SelectImpactSource(NodeId),
    /// Switch to the architecture rollup
    ShowArchitecture,
    /// Switch to the whole-solution graph
    ShowGlobal,
    /// Leave a package drill-down
    ClosePackage,
}

/// State of one viewer: perspective, fetched graph and filters.
#[derive(Debug)]
pub struct ViewSession {
    solution_id: String,
    perspective: Perspective,
    snapshot: Option<Snapshot>,
    filter: FilterState,
    layout: LayoutConfig,
    generation: u64,
    loading: bool,
    hovered_edge: Option<EdgeId>,
    notifications: VecDeque<Notification>,
}

impl ViewSession {
    /// Create a session in the global perspective with nothing fetched.
    pub fn new(solution_id: impl Into<String>, layout: LayoutConfig) -> Self {
        Self {
            solution_id: solution_id.into(),
            perspective: Perspective::Global,
            snapshot: None,
            filter: FilterState::default(),
            layout,
            generation: 0,
            loading: false,
            hovered_edge: None,
            notifications: VecDeque::new(),
        }
    }

    /// Start from the given filter state instead of the default.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    /// Solution this session views.
    #[must_use]
    pub fn solution_id(&self) -> &str {
        &self.solution_id
    }

    /// Most recently requested perspective.
    #[must_use]
    pub fn perspective(&self) -> &Perspective {
        &self.perspective
    }

    /// Graph currently shown, if any fetch succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Current filter state.
    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Layout parameters.
    #[must_use]
    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns `true` while the latest request is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Edge under the pointer, with its confidence and rationale.
    #[must_use]
    pub fn hovered_edge(&self) -> Option<&Edge> {
        let id = self.hovered_edge.as_ref()?;
        self.snapshot.as_ref()?.graph.edge(id)
    }

    /// Issue a fetch for `perspective`, superseding any outstanding one.
    pub fn request(&mut self, perspective: Perspective) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        self.perspective = perspective.clone();
        tracing::debug!(%perspective, generation = self.generation, "Requesting graph");
        FetchTicket {
            generation: self.generation,
            perspective,
        }
    }

    /// Backend query for a ticket.
    #[must_use]
    pub fn graph_request(&self, ticket: &FetchTicket) -> GraphRequest {
        GraphRequest::new(self.solution_id.clone(), ticket.perspective.clone())
    }

    /// Hand back the outcome of a fetch.
    ///
    /// Returns `false` if the ticket was superseded and the result dropped.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<RawGraph>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                perspective = %ticket.perspective,
                stale = ticket.generation,
                current = self.generation,
                "Discarding superseded fetch"
            );
            return false;
        }
        self.loading = false;

        match result {
            Ok(raw) => {
                let normalized = LineageGraph::normalize(raw);
                if !normalized.warnings.is_empty() {
                    self.notifications.push_back(Notification::DataWarnings {
                        perspective: ticket.perspective.clone(),
                        count: normalized.warnings.len(),
                    });
                }
                tracing::info!(
                    perspective = %ticket.perspective,
                    nodes = normalized.graph.node_count(),
                    edges = normalized.graph.edge_count(),
                    "Loaded graph"
                );
                // Focus and impact ids belong to the previous graph.
                self.filter.clear_selection();
                self.hovered_edge = None;
                self.snapshot = Some(Snapshot {
                    perspective: ticket.perspective,
                    graph: normalized.graph,
                    warnings: normalized.warnings,
                    fetched_at: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!(perspective = %ticket.perspective, error = %e, "Graph fetch failed");
                self.notifications.push_back(Notification::FetchFailed {
                    perspective: ticket.perspective,
                    message: e.to_string(),
                });
                if let Some(snapshot) = &self.snapshot {
                    self.perspective = snapshot.perspective.clone();
                }
            }
        }
        true
    }

    /// Apply a user action.
    ///
    /// Returns a ticket when the action changes perspective and a new graph
    /// must be fetched.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidTransition` for a perspective change not allowed
    ///   from the current perspective
    /// - `Error::UnknownNode` for a click on a node the shown graph lacks
    pub fn handle(&mut self, interaction: Interaction) -> Result<Option<FetchTicket>> {
        tracing::debug!(?interaction, "Handling interaction");
        match interaction {
            Interaction::NodeClicked(id) => return self.node_clicked(id),
            Interaction::EdgeHovered(edge) => self.hovered_edge = edge,
            Interaction::ToggleType(node_type) => {
                self.filter.toggle_type(node_type);
            }
            Interaction::SetLayout(mode) => self.filter.layout_mode = mode,
            Interaction::SetFocus(id) => self.filter.focus_node_id = Some(id),
            Interaction::ClearFocus => self.filter.focus_node_id = None,
            Interaction::ToggleImpactMode => {
                let enabled = !self.filter.impact_mode_enabled;
                self.filter.set_impact_mode(enabled);
            }
            Interaction::SelectImpactSource(id) => {
                self.filter.set_impact_mode(true);
                self.filter.impact_source = Some(id);
            }
            Interaction::ShowArchitecture => {
                let next = self.perspective.show_architecture()?;
                return Ok(Some(self.request(next)));
            }
            Interaction::ShowGlobal => {
                let next = self.perspective.show_global()?;
                return Ok(Some(self.request(next)));
            }
            Interaction::ClosePackage => {
                let next = self.perspective.close_package()?;
                return Ok(Some(self.request(next)));
            }
        }
        Ok(None)
    }

    /// Clicks act on the graph on screen, which may differ from the
    /// requested perspective while a fetch is pending.
    fn node_clicked(&mut self, id: NodeId) -> Result<Option<FetchTicket>> {
        let shown = self.snapshot.as_ref().ok_or_else(|| Error::UnknownNode(id.clone()))?;
        let node = shown.graph.node(&id).ok_or_else(|| Error::UnknownNode(id.clone()))?;

        if shown.perspective == Perspective::Architecture && node.node_type == NodeType::Package {
            let next = shown.perspective.open_package(id)?;
            return Ok(Some(self.request(next)));
        }

        if self.filter.impact_mode_enabled {
            self.filter.toggle_impact_source(id);
        } else {
            self.filter.toggle_focus(id);
        }
        Ok(None)
    }

    /// Derive what to draw from the shown graph and the current filters.
    #[must_use]
    pub fn render_model(&self) -> RenderModel {
        match &self.snapshot {
            Some(snapshot) => derive_view(&snapshot.graph, &self.filter, &self.layout),
            None => RenderModel::no_data(self.filter.layout_mode),
        }
    }

    /// Take every queued notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Re-fetch the current perspective from `source`.
    ///
    /// Returns `true` if the session now shows a freshly fetched graph.
    pub async fn refresh(&mut self, source: &dyn GraphSource) -> bool {
        let ticket = self.request(self.perspective.clone());
        self.fetch(ticket, source).await
    }

    /// Apply an interaction and, if it changes perspective, fetch from
    /// `source` right away.
    ///
    /// # Errors
    ///
    /// Same as [`ViewSession::handle`]. Fetch failures become notifications.
    pub async fn apply(&mut self, interaction: Interaction, source: &dyn GraphSource) -> Result<bool> {
        match self.handle(interaction)? {
            Some(ticket) => Ok(self.fetch(ticket, source).await),
            None => Ok(false),
        }
    }

    async fn fetch(&mut self, ticket: FetchTicket, source: &dyn GraphSource) -> bool {
        let request = self.graph_request(&ticket);
        let result = source.fetch_graph(&request).await;
        let succeeded = result.is_ok();
        self.complete(ticket, result) && succeeded
    }
}
