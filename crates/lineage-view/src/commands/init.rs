//! Implementation of the `init` command.
//!
//! Creates the `.lineage/` directory with a configuration file and an empty
//! data directory for exported graph payloads.

use crate::config::{CONFIG_FILE_NAME, DEFAULT_SOLUTION_ID, LINEAGE_DIR_NAME, ViewConfig, validate_solution_id};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .lineage
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created `.lineage` directory
    pub lineage_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created data directory
    pub data_dir: PathBuf,
    /// The configured solution id
    pub solution_id: String,
}

/// Initialize a lineage workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - `.lineage/` already exists
/// - the solution id is invalid
/// - file system operations fail
pub async fn init(base_dir: &Path, solution_id: Option<&str>) -> Result<InitResult> {
    let solution_id = solution_id.unwrap_or(DEFAULT_SOLUTION_ID).trim();
    validate_solution_id(solution_id)?;

    let lineage_dir = base_dir.join(LINEAGE_DIR_NAME);
    if lineage_dir.exists() {
        return Err(Error::Config(format!(
            "Lineage workspace is already initialized in this directory. Found existing '{LINEAGE_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&lineage_dir).await?;

    let config = ViewConfig::new(solution_id);
    let config_file = lineage_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let data_dir = config.data_dir_in(base_dir);
    fs::create_dir_all(&data_dir).await?;

    let gitignore_content = "\
# Exported graph payloads are snapshots of the backend; regenerate instead of committing
graphs/
";
    fs::write(lineage_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    tracing::info!(solution = solution_id, dir = %lineage_dir.display(), "Initialized lineage workspace");

    Ok(InitResult {
        lineage_dir,
        config_file,
        data_dir,
        solution_id: solution_id.to_string(),
    })
}
