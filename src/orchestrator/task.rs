//! Crawl task records and their guarded transitions
//!
//! Every mutating method checks the current status first and returns `false`
//! without touching the task when the transition is not allowed. Callers run
//! them inside `TaskStore::update`, which makes each check-and-set atomic.

use crate::state::TaskStatus;
use crate::tree::SiteTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique task identifier (a UUID v4 string)
pub type TaskId = String;

/// Error message recorded when a caller cancels a task
pub const CANCELLED_MESSAGE: &str = "cancelled by user";

/// One request to crawl a site and produce its tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlTask {
    pub id: TaskId,
    pub owner: String,
    /// Normalized target URL
    pub target_url: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SiteTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of attempts started so far
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlTask {
    /// Creates a queued task
    pub fn new(id: TaskId, owner: String, target_url: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            target_url,
            status: TaskStatus::Queued,
            progress: None,
            result: None,
            error: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Enters `Processing` for a new attempt with progress reset to zero
    pub fn start_attempt(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(TaskStatus::Processing) {
            return false;
        }
        self.status = TaskStatus::Processing;
        self.progress = Some(0);
        self.attempts += 1;
        self.updated_at = now;
        true
    }

    /// Records crawl progress while the task is running
    pub fn set_progress(&mut self, percent: u8, now: DateTime<Utc>) -> bool {
        if self.status != TaskStatus::Processing {
            return false;
        }
        self.progress = Some(percent.min(100));
        self.updated_at = now;
        true
    }

    /// Attaches the finished tree
    pub fn complete(&mut self, tree: SiteTree, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(TaskStatus::Completed) {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.progress = Some(100);
        self.result = Some(tree);
        self.error = None;
        self.updated_at = now;
        true
    }

    /// Moves the task to `Error` with the given message
    pub fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(TaskStatus::Error) {
            return false;
        }
        self.status = TaskStatus::Error;
        self.error = Some(message.into());
        self.updated_at = now;
        true
    }

    /// Cancels a queued or running task
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        self.fail(CANCELLED_MESSAGE, now)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
