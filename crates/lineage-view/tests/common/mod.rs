//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the binary cargo built for this test run
pub fn lineage_view_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lineage-view"))
}

/// Run the binary in `dir` with colors and log overrides disabled
pub fn run_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(lineage_view_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute lineage-view binary")
}

/// Run the binary and parse its stdout as JSON, asserting success
pub fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = run_in_dir(dir, args);
    assert!(
        output.status.success(),
        "command {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Write a graph payload into the workspace's data directory
pub fn write_graph(workspace: &Path, file_name: &str, graph: &Value) {
    let dir = workspace.join(".lineage").join("graphs");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file_name), serde_json::to_string_pretty(graph).unwrap()).unwrap();
}

/// Ids of the nodes in a JSON render model
pub fn node_ids(rendered: &Value) -> Vec<String> {
    rendered["view"]["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .map(|n| n["id"].as_str().unwrap().to_string())
        .collect()
}

/// Warehouse load chain with a column child and an unrelated audit table
pub fn global_graph() -> Value {
    serde_json::json!({
        "nodes": [
            {"id": "raw_orders", "data": {"type": "table"}},
            {"id": "load_orders", "data": {"type": "pipeline", "label": "Load orders"}},
            {"id": "orders", "data": {"type": "table"}},
            {"id": "orders.id", "data": {"type": "column", "parent_id": "orders"}},
            {"id": "report", "data": {"type": "view"}},
            {"id": "audit_log", "data": {"type": "table"}}
        ],
        "edges": [
            {"id": "e1", "source": "raw_orders", "target": "load_orders"},
            {"id": "e2", "source": "load_orders", "target": "orders"},
            {"id": "e3", "source": "orders", "target": "report", "label": "feeds",
             "data": {"confidence": 0.6, "isHypothesis": true}}
        ]
    })
}

/// Package rollup
pub fn architecture_graph() -> Value {
    serde_json::json!({
        "nodes": [
            {"id": "ext", "data": {"type": "source"}},
            {"id": "pkg_sales", "data": {"type": "package", "label": "Sales"}},
            {"id": "pkg_finance", "data": {"type": "package", "label": "Finance"}}
        ],
        "edges": [
            {"id": "a1", "source": "ext", "target": "pkg_sales"},
            {"id": "a2", "source": "pkg_sales", "target": "pkg_finance"}
        ]
    })
}

/// Internals of `pkg_sales`
pub fn package_graph() -> Value {
    serde_json::json!({
        "nodes": [
            {"id": "pkg_sales", "data": {"type": "package", "label": "Sales"}},
            {"id": "extract", "data": {"type": "component_source", "parent_id": "pkg_sales"}},
            {"id": "derive", "data": {"type": "component_transform", "parent_id": "pkg_sales"}}
        ],
        "edges": [
            {"id": "p1", "source": "extract", "target": "derive"}
        ]
    })
}
