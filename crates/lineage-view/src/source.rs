//! Graph sources.
//!
//! A [`GraphSource`] answers the backend's graph query
//! `GET /solutions/{id}/graph?mode={GLOBAL|ARCHITECTURE|PACKAGE}&package_id={id}`
//! with a raw payload. The session only ever sees the trait, so the HTTP
//! backend, a directory of exported JSON files and test doubles are
//! interchangeable.
//!
//! # Implementations
//!
//! - [`JsonDirectorySource`]: reads `global.json`, `architecture.json` and
//!   `package-<id>.json` from a directory
//! - [`MockGraphSource`]: canned payloads and failures, available in tests
//!   and with the `test-util` feature
//!
//! ```toml
//! [dev-dependencies]
//! lineage-view = { version = "...", features = ["test-util"] }
//! ```

use crate::error::{Error, Result};
use crate::perspective::Perspective;
use async_trait::async_trait;
use lineage_graph::RawGraph;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File holding the global graph in a [`JsonDirectorySource`].
pub const GLOBAL_FILE_NAME: &str = "global.json";

/// File holding the architecture rollup in a [`JsonDirectorySource`].
pub const ARCHITECTURE_FILE_NAME: &str = "architecture.json";

/// One graph query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    /// Solution the graph belongs to
    pub solution_id: String,
    /// Requested scope
    pub perspective: Perspective,
}

impl GraphRequest {
    /// Create a request
    pub fn new(solution_id: impl Into<String>, perspective: Perspective) -> Self {
        Self {
            solution_id: solution_id.into(),
            perspective,
        }
    }

    /// Backend path and query string for this request.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = format!(
            "/solutions/{}/graph?mode={}",
            self.solution_id,
            self.perspective.mode()
        );
        if let Some(package) = self.perspective.package_id() {
            path.push_str("&package_id=");
            path.push_str(package.as_str());
        }
        path
    }
}

/// Supplier of raw graphs.
///
/// Implementations must be `Send + Sync` so a session can await them from
/// any async context.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch the raw graph for one perspective.
    ///
    /// # Errors
    ///
    /// Any failure to deliver a payload. The session reports it to the user
    /// and keeps showing the previous graph.
    async fn fetch_graph(&self, request: &GraphRequest) -> Result<RawGraph>;
}

/// Reads exported backend payloads from a directory.
///
/// A missing file is reported as [`Error::Source`] naming the expected path.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    /// Create a source over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the graph for `perspective`.
    #[must_use]
    pub fn file_for(&self, perspective: &Perspective) -> PathBuf {
        match perspective {
            Perspective::Global => self.root.join(GLOBAL_FILE_NAME),
            Perspective::Architecture => self.root.join(ARCHITECTURE_FILE_NAME),
            Perspective::Package(id) => self.root.join(package_file_name(id.as_str())),
        }
    }

    /// Write a payload where [`JsonDirectorySource::fetch_graph`] will find it.
    ///
    /// # Errors
    ///
    /// IO errors while creating the directory or writing the file.
    pub async fn store(&self, perspective: &Perspective, graph: &RawGraph) -> Result<PathBuf> {
        let path = self.file_for(perspective);
        fs::create_dir_all(&self.root).await?;
        let content = serde_json::to_string_pretty(graph).map_err(|source| Error::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, content).await?;
        Ok(path)
    }
}

/// File name of a package drill-down payload.
///
/// Path separators in the id are replaced so the file stays inside the
/// source directory.
#[must_use]
pub fn package_file_name(package_id: &str) -> String {
    let safe: String = package_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("package-{safe}.json")
}

#[async_trait]
impl GraphSource for JsonDirectorySource {
    async fn fetch_graph(&self, request: &GraphRequest) -> Result<RawGraph> {
        let path = self.file_for(&request.perspective);
        tracing::debug!(
            request = %request.path(),
            path = %path.display(),
            "Reading graph payload"
        );

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Source(format!(
                    "no {} graph exported at {}",
                    request.perspective,
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|source| Error::Json { path, source })
    }
}

/// Canned graph source for tests.
///
/// Payloads and failures are registered per perspective; every request is
/// recorded so tests can assert what was fetched.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct MockGraphSource {
    graphs: std::collections::HashMap<Perspective, RawGraph>,
    failures: std::collections::HashMap<Perspective, String>,
    requests: tokio::sync::Mutex<Vec<GraphRequest>>,
}

#[cfg(any(test, feature = "test-util"))]
impl MockGraphSource {
    /// Create a source that knows no graphs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `graph` for `perspective`.
    #[must_use]
    pub fn with_graph(mut self, perspective: Perspective, graph: RawGraph) -> Self {
        self.graphs.insert(perspective, graph);
        self
    }

    /// Fail requests for `perspective` with `message`.
    #[must_use]
    pub fn with_failure(mut self, perspective: Perspective, message: impl Into<String>) -> Self {
        self.failures.insert(perspective, message.into());
        self
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<GraphRequest> {
        self.requests.lock().await.clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl GraphSource for MockGraphSource {
    async fn fetch_graph(&self, request: &GraphRequest) -> Result<RawGraph> {
        self.requests.lock().await.push(request.clone());

        if let Some(message) = self.failures.get(&request.perspective) {
            return Err(Error::Source(message.clone()));
        }
        self.graphs
            .get(&request.perspective)
            .cloned()
            .ok_or_else(|| Error::Source(format!("no graph for {}", request.perspective)))
    }
}
