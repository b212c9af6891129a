//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at parse
//! time with a specific message.

use crate::config;

/// Validate a solution id.
///
/// Delegates to [`config::validate_solution_id`] so the CLI and the config
/// loader agree on the rules.
pub fn validate_solution_id(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    config::validate_solution_id(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a node id.
///
/// Node ids are opaque backend strings; only blank ids are rejected.
pub fn validate_node_id(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Node id cannot be empty".to_string());
    }
    Ok(trimmed.to_string())
}

/// Validate a node type name for `--hide`.
///
/// Returns the normalized (uppercase) spelling used by type filters.
pub fn validate_node_type(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("Node type cannot be empty".to_string());
    }
    Ok(lineage_graph::normalize_type(s))
}
