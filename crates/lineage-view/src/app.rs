//! Application context for CLI command execution.
//!
//! [`App`] locates the workspace, loads its configuration and owns the
//! graph source every command reads from.
//!
//! # Example
//!
//! ```no_run
//! use lineage_view::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let mut session = app.session();
//!     session.refresh(app.source()).await;
//!     Ok(())
//! }
//! ```

use crate::config::{CONFIG_FILE_NAME, LINEAGE_DIR_NAME, ViewConfig, find_lineage_root};
use crate::error::{Error, Result};
use crate::session::ViewSession;
use crate::source::{GraphSource, JsonDirectorySource};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
pub struct App {
    /// Where graphs come from (trait object for polymorphism)
    source: Box<dyn GraphSource>,

    /// Workspace root (the directory containing `.lineage`)
    root: PathBuf,

    /// Loaded configuration
    config: ViewConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("source", &"<dyn GraphSource>")
            .finish()
    }
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.lineage/`, loads the
    /// configuration and opens the configured data directory.
    ///
    /// # Errors
    ///
    /// - `Error::NotInitialized` if no workspace is found
    /// - configuration load errors
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_lineage_root(working_dir).ok_or(Error::NotInitialized)?;
        let config_path = root.join(LINEAGE_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = ViewConfig::load(&config_path).await?;

        let source = JsonDirectorySource::new(config.data_dir_in(&root));
        tracing::debug!(
            root = %root.display(),
            data_dir = %source.root().display(),
            solution = %config.solution_id,
            "Opened lineage workspace"
        );

        Ok(Self {
            source: Box::new(source),
            root,
            config,
        })
    }

    /// Create an App over an explicit source, bypassing workspace discovery.
    #[must_use]
    pub fn with_source(root: impl Into<PathBuf>, config: ViewConfig, source: Box<dyn GraphSource>) -> Self {
        Self {
            source,
            root: root.into(),
            config,
        }
    }

    /// Graph source for this workspace.
    #[must_use]
    pub fn source(&self) -> &dyn GraphSource {
        self.source.as_ref()
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh session seeded with the configured filters and layout.
    #[must_use]
    pub fn session(&self) -> ViewSession {
        ViewSession::new(self.config.solution_id.clone(), self.config.layout.clone())
            .with_filter(self.config.filter_state())
    }
}
