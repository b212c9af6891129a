//! Error types for lineage-view operations.
//!
//! Fetch failures are not fatal to a [`ViewSession`](crate::session::ViewSession):
//! the session turns them into a notification and keeps showing the last
//! graph. The variants here surface from sources, configuration and
//! invalid user actions.

use crate::perspective::Perspective;
use lineage_graph::NodeId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for lineage-view operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A graph file could not be parsed.
    #[error("invalid graph payload in {path}: {source}")]
    Json {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No `.lineage/` directory was found.
    #[error("not a lineage workspace (no .lineage directory found); run `lineage-view init` first")]
    NotInitialized,

    /// The graph source failed to deliver a graph.
    #[error("graph source error: {0}")]
    Source(String),

    /// The requested perspective change is not allowed from the current one.
    #[error("cannot {action} while in {from} perspective")]
    InvalidTransition {
        /// Perspective the session was in
        from: Perspective,
        /// What the user tried to do
        action: &'static str,
    },

    /// The node is not part of the current graph.
    #[error("node not found in current graph: {0}")]
    UnknownNode(NodeId),
}

/// A specialized Result type for lineage-view operations.
pub type Result<T> = std::result::Result<T, Error>;
