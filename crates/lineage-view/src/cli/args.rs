//! CLI argument structs for all commands.

use clap::{Args, Parser};

use super::types::LayoutArg;
use super::validators::{validate_node_id, validate_node_type, validate_solution_id};
use crate::perspective::Perspective;
use lineage_graph::NodeId;

/// Which graph to load
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PerspectiveArgs {
    /// Load the package-level architecture rollup instead of the global graph
    #[arg(long, conflicts_with = "package")]
    pub architecture: bool,

    /// Load the internals of one package
    #[arg(long, value_name = "PACKAGE_ID", value_parser = validate_node_id)]
    pub package: Option<String>,
}

impl PerspectiveArgs {
    /// Perspective selected by the flags.
    #[must_use]
    pub fn perspective(&self) -> Perspective {
        match (&self.package, self.architecture) {
            (Some(id), _) => Perspective::Package(NodeId::new(id.clone())),
            (None, true) => Perspective::Architecture,
            (None, false) => Perspective::Global,
        }
    }
}

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Solution whose graphs this workspace views
    #[arg(short, long = "solution", value_parser = validate_solution_id)]
    pub solution_id: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `render` command
#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    /// Graph to load
    #[command(flatten)]
    pub perspective: PerspectiveArgs,

    /// Layout algorithm (defaults to the configured layout)
    #[arg(short, long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Node types to hide (comma-separated), on top of the configured ones
    #[arg(long, value_delimiter = ',', value_parser = validate_node_type)]
    pub hide: Vec<String>,

    /// Node types to show even if the configuration hides them (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = validate_node_type)]
    pub show: Vec<String>,

    /// Isolate the lineage of this node
    #[arg(short, long, value_parser = validate_node_id)]
    pub focus: Option<String>,

    /// Weight the view by the downstream impact of this node
    #[arg(short, long, value_parser = validate_node_id)]
    pub impact: Option<String>,
}

/// Arguments for the `isolate` command
#[derive(Parser, Debug, Clone)]
pub struct IsolateArgs {
    /// Node whose upstream and downstream lineage to list
    #[arg(value_parser = validate_node_id)]
    pub node: String,

    /// Graph to load
    #[command(flatten)]
    pub perspective: PerspectiveArgs,

    /// Node types to hide before traversing (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = validate_node_type)]
    pub hide: Vec<String>,
}

/// Arguments for the `impact` command
#[derive(Parser, Debug, Clone)]
pub struct ImpactArgs {
    /// Node whose downstream impact to list
    #[arg(value_parser = validate_node_id)]
    pub node: String,

    /// Graph to load
    #[command(flatten)]
    pub perspective: PerspectiveArgs,

    /// Node types to hide before traversing (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = validate_node_type)]
    pub hide: Vec<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Graph to load
    #[command(flatten)]
    pub perspective: PerspectiveArgs,

    /// Exit with an error if the payload needed any repair
    #[arg(long)]
    pub strict: bool,
}
