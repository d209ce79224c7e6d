//! Site-Atlas: crawl a website and rebuild its navigation tree
//!
//! This crate queues crawl jobs behind a single sequential worker, runs each crawl
//! through a pluggable runner, and turns the flat list of crawled pages into a
//! hierarchical site tree keyed by path segment.

pub mod config;
pub mod crawler;
pub mod orchestrator;
pub mod output;
pub mod state;
pub mod storage;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors returned across the orchestrator's submit/status/cancel boundary
///
/// Everything that goes wrong while a task executes is recorded on the task
/// itself; callers only ever see these two.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),
}

/// Failure of a single crawl attempt
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Crawl of {url} exceeded {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Upload failed: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid crawl target: {0}")]
    InvalidTarget(String),

    #[error("Crawl cancelled")]
    Cancelled,
}

impl CrawlError {
    /// Whether the orchestrator should schedule another attempt
    ///
    /// Cancellation is final; every other failure counts against the retry limit.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Result type alias for orchestrator boundary operations
pub type TaskResult<T> = std::result::Result<T, TaskError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlRunner, HttpCrawlRunner, PageRecord};
pub use orchestrator::{CrawlTask, Orchestrator, TaskId};
pub use state::TaskStatus;
pub use tree::{build_site_tree, SiteTree, SiteTreeNode};
