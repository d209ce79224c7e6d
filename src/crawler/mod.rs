//! Crawler module for fetching a site and recording its pages
//!
//! This module contains:
//! - The `CrawlRunner` seam the orchestrator drives
//! - Page records and the per-crawl record store
//! - HTTP fetching and HTML parsing
//! - `HttpCrawlRunner`, a breadth-first same-origin crawler

mod fetcher;
mod parser;
mod records;
mod runner;

pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use parser::{parse_html, ParsedPage};
pub use records::{MemoryRecordStore, PageRecord, PageRecordStore};
pub use runner::HttpCrawlRunner;

use crate::CrawlError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Receives crawl progress as a percentage
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Everything a runner needs to perform one crawl attempt
#[derive(Clone)]
pub struct CrawlRequest {
    pub task_id: String,
    pub owner: String,
    /// Normalized crawl target
    pub target: Url,
    /// Triggered when the task is cancelled or the orchestrator shuts down
    pub cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl CrawlRequest {
    pub fn new(task_id: impl Into<String>, owner: impl Into<String>, target: Url) -> Self {
        Self {
            task_id: task_id.into(),
            owner: owner.into(),
            target,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Forwards a progress percentage to the registered callback, if any
    pub fn report_progress(&self, percent: u8) {
        if let Some(progress) = &self.progress {
            progress(percent.min(100));
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for CrawlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlRequest")
            .field("task_id", &self.task_id)
            .field("owner", &self.owner)
            .field("target", &self.target.as_str())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

/// Performs one crawl attempt
///
/// Implementations should check `request.cancel` between units of work and
/// enforce their own duration limit. The orchestrator does not rely on either:
/// it races every attempt against the cancellation token itself.
#[async_trait]
pub trait CrawlRunner: Send + Sync {
    /// Crawls `request.target` and returns the page records in crawl order
    async fn run(&self, request: &CrawlRequest) -> Result<Vec<PageRecord>, CrawlError>;
}
