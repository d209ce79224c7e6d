//! Site tree JSON export
//!
//! Each finished task's tree is stored as `{site-tree-dir}/{task_id}.json`.

use crate::output::{OutputError, OutputResult};
use crate::tree::SiteTree;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the file a task's site tree is written to
pub fn site_tree_path(dir: &Path, task_id: &str) -> OutputResult<PathBuf> {
    let valid = !task_id.is_empty()
        && task_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        return Err(OutputError::InvalidName(task_id.to_string()));
    }

    Ok(dir.join(format!("{}.json", task_id)))
}

/// Writes a site tree as pretty-printed JSON
///
/// # Arguments
///
/// * `dir` - The site tree directory, created if missing
/// * `task_id` - Id of the task that produced the tree
/// * `tree` - The tree to write
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Invalid task id, or the file could not be written
pub fn write_site_tree_json(dir: &Path, task_id: &str, tree: &SiteTree) -> OutputResult<PathBuf> {
    let path = site_tree_path(dir, task_id)?;
    let json = serde_json::to_string_pretty(tree)?;

    fs::create_dir_all(dir)?;
    fs::write(&path, json)?;

    tracing::debug!("Wrote site tree to {}", path.display());
    Ok(path)
}

/// Reads back a site tree written by `write_site_tree_json`
pub fn read_site_tree_json(path: &Path) -> OutputResult<SiteTree> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
