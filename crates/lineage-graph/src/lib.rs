//! Lineage Graph - presentation engine for data-lineage graphs.
//!
//! This crate turns a possibly cyclic, possibly nested dependency graph into
//! a renderable view: normalization of backend payloads, type and focus
//! filtering, layered and circular layout with compound groups, lineage
//! isolation and downstream impact propagation.
//!
//! Everything here is synchronous and free of I/O. Each operation takes its
//! inputs by reference and returns a fresh value.

#![forbid(unsafe_code)]

pub mod error;
pub mod filter;
pub mod index;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod traversal;
pub mod view;

pub use error::{Error, Result};
pub use filter::{FilterState, apply_filters};
pub use layout::{LayoutConfig, LayoutMode, LayoutResult, NodePlacement, Position, Side, Size, SizeClass, compute_layout};
pub use model::{Edge, EdgeData, EdgeId, LineageGraph, Node, NodeId, NodeType, VisualKind, normalize_type};
pub use normalize::{NormalizeWarning, Normalized, RawEdge, RawGraph, RawNode};
pub use traversal::{ImpactSet, Lineage, Reached, isolate_lineage, propagate_impact};
pub use view::{RenderEdge, RenderModel, RenderNode, ViewStatus, derive_view};
