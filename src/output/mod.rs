//! Output module for exporting finished crawls
//!
//! This module handles:
//! - Writing each site tree as JSON under the site tree directory
//! - Rendering a markdown outline of a finished task

mod json;
mod markdown;

pub use json::{read_site_tree_json, site_tree_path, write_site_tree_json};
pub use markdown::{format_task_report, write_task_report};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Invalid output name: {0}")]
    InvalidName(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
