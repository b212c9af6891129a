//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a lineage workspace
//! - `render`: Lay out a graph and print the render model
//! - `isolate`: List the upstream and downstream lineage of a node
//! - `impact`: List everything downstream of a node
//! - `validate`: Report data problems in an exported payload
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `-v`: More log output (`-v` debug, `-vv` trace)
//! - `-C <DIR>`: Run as if started in `DIR`
//!
//! # Example
//!
//! ```bash
//! lineage-view init --solution sales-dwh
//! lineage-view render --architecture --layout circular
//! lineage-view render --focus orders --hide column
//! lineage-view --json impact raw_orders
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub use args::{ImpactArgs, InitArgs, IsolateArgs, PerspectiveArgs, RenderArgs, ValidateArgs};
pub use types::LayoutArg;
pub use validators::{validate_node_id, validate_node_type, validate_solution_id};

/// Lineage View - lay out and explore data-lineage graphs
///
/// Reads graph payloads exported from the lineage backend into
/// `.lineage/graphs/` and prints layouts, lineage and impact.
#[derive(Parser, Debug)]
#[command(name = "lineage-view")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Run as if started in this directory
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a lineage workspace
    ///
    /// Creates `.lineage/` with a configuration file and an empty directory
    /// for exported graph payloads.
    Init(InitArgs),

    /// Lay out a graph and print what a renderer would draw
    ///
    /// Applies type filters, focus isolation and impact weighting, then
    /// prints every node's position and every edge's style.
    Render(RenderArgs),

    /// List the upstream and downstream lineage of a node
    Isolate(IsolateArgs),

    /// List every node downstream of a node
    Impact(ImpactArgs),

    /// Report data problems in an exported graph payload
    ///
    /// Lists orphaned parents, parent cycles, duplicates and dangling edges.
    Validate(ValidateArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Log filter matching the `-v` count.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "lineage_view=info,lineage_graph=warn",
            1 => "lineage_view=debug,lineage_graph=debug",
            _ => "lineage_view=trace,lineage_graph=trace",
        }
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Any command failure, with context for display.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let working_dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, &working_dir).await,
            Some(Commands::Render(args)) => {
                let app = App::from_directory(&working_dir).await?;
                execute::execute_render(&app, args, output_mode).await
            }
            Some(Commands::Isolate(args)) => {
                let app = App::from_directory(&working_dir).await?;
                execute::execute_isolate(&app, args, output_mode).await
            }
            Some(Commands::Impact(args)) => {
                let app = App::from_directory(&working_dir).await?;
                execute::execute_impact(&app, args, output_mode).await
            }
            Some(Commands::Validate(args)) => {
                let app = App::from_directory(&working_dir).await?;
                execute::execute_validate(&app, args, output_mode).await
            }
            None => {
                println!("Lineage View - data-lineage graph explorer");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
