//! Lineage View - perspective controller and CLI for data-lineage graphs.
//!
//! The layout and traversal engine lives in `lineage_graph`; this crate adds
//! everything stateful around it: the drill-down [`perspective`] state
//! machine, the [`session`] that owns fetched graphs and filters, graph
//! [`source`]s, workspace [`config`] and the command-line interface.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod error;
pub mod perspective;
pub mod session;
pub mod source;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

pub mod output;

pub use error::{Error, Result};
pub use perspective::Perspective;
pub use session::{FetchTicket, Interaction, Notification, Snapshot, ViewSession};
pub use source::{GraphRequest, GraphSource, JsonDirectorySource};

#[cfg(any(test, feature = "test-util"))]
pub use source::MockGraphSource;
