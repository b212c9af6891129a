//! Workspace configuration.
//!
//! A lineage workspace is a directory containing `.lineage/config.yaml`:
//!
//! ```yaml
//! solution-id: sales-dwh
//! data-dir: .lineage/graphs
//! default-layout: LAYERED_LR
//! hidden-types:
//!   - COLUMN
//! layout:
//!   node-sep: 50.0
//!   rank-sep: 100.0
//! ```
//!
//! Every key is optional; missing keys take their defaults, including
//! missing keys inside `layout`.

use crate::error::{Error, Result};
use lineage_graph::{FilterState, LayoutConfig, LayoutMode, NodeType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the workspace directory
pub const LINEAGE_DIR_NAME: &str = ".lineage";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default location of exported graph payloads, relative to the workspace root
pub const DEFAULT_DATA_DIR: &str = ".lineage/graphs";

/// Solution id used when none is configured
pub const DEFAULT_SOLUTION_ID: &str = "default";

/// Maximum solution id length
pub const MAX_SOLUTION_ID_LENGTH: usize = 64;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Contents of `.lineage/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ViewConfig {
    /// Solution whose graphs are viewed
    pub solution_id: String,

    /// Directory holding exported payloads, relative to the workspace root
    pub data_dir: PathBuf,

    /// Layout used when none is given on the command line
    pub default_layout: LayoutMode,

    /// Node types hidden by default
    pub hidden_types: Vec<NodeType>,

    /// Layout parameters
    pub layout: LayoutConfig,
}

impl ViewConfig {
    /// Create a configuration for `solution_id` with default settings.
    pub fn new(solution_id: impl Into<String>) -> Self {
        Self {
            solution_id: solution_id.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// IO errors, malformed YAML and invalid solution ids.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        validate_solution_id(&config.solution_id)?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// IO errors and YAML serialization failures.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Initial filter state: configured layout, configured types hidden.
    #[must_use]
    pub fn filter_state(&self) -> FilterState {
        let mut state = FilterState {
            layout_mode: self.default_layout,
            ..FilterState::default()
        };
        for node_type in &self.hidden_types {
            state.set_type_visible(node_type.clone(), false);
        }
        state
    }

    /// Absolute data directory for a workspace rooted at `root`.
    #[must_use]
    pub fn data_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.data_dir)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            solution_id: DEFAULT_SOLUTION_ID.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_layout: LayoutMode::default(),
            hidden_types: Vec::new(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Validate a solution id.
///
/// Requirements:
/// - 1-64 characters
/// - ASCII letters, digits, `-` and `_` only
///
/// # Errors
///
/// `Error::Config` describing the first violated requirement.
pub fn validate_solution_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Config("Solution id must not be empty".to_string()));
    }

    if id.len() > MAX_SOLUTION_ID_LENGTH {
        return Err(Error::Config(format!(
            "Solution id cannot exceed {MAX_SOLUTION_ID_LENGTH} characters"
        )));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::Config(
            "Solution id must contain only letters, digits, '-' or '_'".to_string(),
        ));
    }

    Ok(())
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.lineage/`, or `None` if none is found
/// within [`MAX_TRAVERSAL_DEPTH`] levels.
#[must_use]
pub fn find_lineage_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(LINEAGE_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::simple("sales")]
    #[case::dashed("sales-dwh")]
    #[case::underscored("sales_dwh_2")]
    fn valid_solution_ids(#[case] id: &str) {
        assert!(validate_solution_id(id).is_ok());
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::too_long("a".repeat(65), "exceed")]
    #[case::slash("a/b", "letters")]
    #[case::space("a b", "letters")]
    fn invalid_solution_ids(#[case] id: impl AsRef<str>, #[case] expected: &str) {
        let message = validate_solution_id(id.as_ref()).unwrap_err().to_string();
        assert!(message.contains(expected), "got: {message}");
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        let mut original = ViewConfig::new("sales");
        original.hidden_types = vec![NodeType::Column];
        original.default_layout = LayoutMode::Circular;
        original.save(&path).await.unwrap();

        assert_eq!(ViewConfig::load(&path).await.unwrap(), original);
    }

    #[tokio::test]
    async fn yaml_uses_kebab_case_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        ViewConfig::new("sales").save(&path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("solution-id: sales"));
        assert!(content.contains("default-layout: LAYERED_LR"));
        assert!(content.contains("rank-sep: 100.0"));
    }

    #[tokio::test]
    async fn partial_yaml_takes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "solution-id: s1\nlayout:\n  node-sep: 10.0\nhidden-types: [column]\n")
            .await
            .unwrap();

        let config = ViewConfig::load(&path).await.unwrap();
        assert_eq!(config.layout.node_sep, 10.0);
        assert_eq!(config.layout.rank_sep, LayoutConfig::default().rank_sep);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.hidden_types, vec![NodeType::Column]);
    }

    #[tokio::test]
    async fn load_rejects_invalid_solution_id() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "solution-id: \"../x\"\n").await.unwrap();
        assert!(matches!(ViewConfig::load(&path).await, Err(Error::Config(_))));
    }

    #[test]
    fn filter_state_hides_configured_types() {
        let mut config = ViewConfig::new("s");
        config.hidden_types = vec![NodeType::Column, NodeType::from("custom")];
        config.default_layout = LayoutMode::LayeredTb;

        let state = config.filter_state();
        assert!(!state.is_type_visible(&NodeType::Column));
        assert!(!state.is_type_visible(&NodeType::Other("CUSTOM".to_string())));
        assert!(state.is_type_visible(&NodeType::Table));
        assert_eq!(state.layout_mode, LayoutMode::LayeredTb);
    }

    #[test]
    fn find_root_in_parent_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(LINEAGE_DIR_NAME)).unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_lineage_root(&nested), Some(temp.path().to_path_buf()));
    }
}
