//! Crawl task orchestrator
//!
//! Accepts crawl submissions, runs them one at a time on a background
//! worker, retries failed attempts, honors cancellation, and expires stale
//! tasks.
//!
//! # Components
//!
//! - `CrawlTask`: The task record and its guarded transitions
//! - `TaskStore`: The task table, injected so callers can supply their own
//! - `WorkQueue`: Pending attempts in execution order
//! - `Orchestrator`: The `submit` / `status` / `cancel` surface
//!
//! # Example
//!
//! ```no_run
//! use site_atlas::config::OrchestratorConfig;
//! use site_atlas::crawler::CrawlRunner;
//! use site_atlas::orchestrator::Orchestrator;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo(runner: Arc<dyn CrawlRunner>) -> Result<(), site_atlas::TaskError> {
//! let orchestrator = Orchestrator::builder(runner)
//!     .settings(OrchestratorConfig::default())
//!     .start();
//!
//! let id = orchestrator.submit("user-1", "https://example.com/")?;
//! let task = orchestrator.wait_for(&id, Duration::from_millis(250)).await?;
//! println!("{} finished as {}", task.id, task.status);
//! # Ok(())
//! # }
//! ```

mod queue;
mod store;
mod sweep;
mod task;
mod worker;

pub use queue::{WorkItem, WorkQueue};
pub use store::{MemoryTaskStore, TaskStore, UpdateOutcome};
pub use sweep::sweep_expired;
pub use task::{CrawlTask, TaskId, CANCELLED_MESSAGE};

use crate::config::OrchestratorConfig;
use crate::crawler::CrawlRunner;
use crate::storage::RecordSink;
use crate::url::normalize_url;
use crate::{TaskError, TaskResult};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use worker::{RunningSlot, Worker};

/// Configures and starts an `Orchestrator`
pub struct OrchestratorBuilder {
    runner: Arc<dyn CrawlRunner>,
    settings: OrchestratorConfig,
    store: Option<Arc<dyn TaskStore>>,
    sink: Option<Arc<dyn RecordSink>>,
    sweeper: bool,
}

impl OrchestratorBuilder {
    pub fn settings(mut self, settings: OrchestratorConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Uses `store` instead of a fresh `MemoryTaskStore`
    pub fn task_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persists every completed crawl through `sink`
    pub fn record_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Disables the periodic sweep; `sweep` and `sweep_at` still work
    pub fn without_sweeper(mut self) -> Self {
        self.sweeper = false;
        self
    }

    /// Spawns the worker (and sweeper) on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(self) -> Orchestrator {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTaskStore::new()));
        let queue = Arc::new(WorkQueue::new());
        let running = Arc::new(RunningSlot::default());
        let shutdown = CancellationToken::new();

        let worker = Worker {
            store: Arc::clone(&store),
            queue: Arc::clone(&queue),
            running: Arc::clone(&running),
            runner: self.runner,
            sink: self.sink,
            settings: self.settings.clone(),
            shutdown: shutdown.clone(),
        };

        let mut handles = vec![tokio::spawn(worker.run())];

        if self.sweeper {
            handles.push(tokio::spawn(sweep::run_sweeper(
                Arc::clone(&store),
                self.settings.retention(),
                self.settings.sweep_interval(),
                shutdown.clone(),
            )));
        }

        tracing::info!(
            "Orchestrator started (max attempts {}, retry delay {}ms, retention {}s)",
            self.settings.max_attempts,
            self.settings.retry_delay_ms,
            self.settings.retention_secs
        );

        Orchestrator {
            store,
            queue,
            running,
            settings: self.settings,
            shutdown,
            handles: Mutex::new(handles),
        }
    }
}

/// Owns the crawl task lifecycle
///
/// `submit`, `status` and `cancel` never block on a crawl and are safe to call
/// from any number of tasks at once. Exactly one crawl runs at a time.
pub struct Orchestrator {
    store: Arc<dyn TaskStore>,
    queue: Arc<WorkQueue>,
    running: Arc<RunningSlot>,
    settings: OrchestratorConfig,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn builder(runner: Arc<dyn CrawlRunner>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            runner,
            settings: OrchestratorConfig::default(),
            store: None,
            sink: None,
            sweeper: true,
        }
    }

    /// Starts an orchestrator with default storage and no record sink
    pub fn new(runner: Arc<dyn CrawlRunner>, settings: OrchestratorConfig) -> Self {
        Self::builder(runner).settings(settings).start()
    }

    /// Queues a crawl of `target_url` on behalf of `owner`
    ///
    /// # Returns
    ///
    /// * `Ok(TaskId)` - The new task, already queued
    /// * `Err(TaskError::Validation)` - Empty owner, empty or malformed target
    pub fn submit(&self, owner: &str, target_url: &str) -> TaskResult<TaskId> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(TaskError::Validation("owner must not be empty".to_string()));
        }

        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(TaskError::Validation(
                "target URL must not be empty".to_string(),
            ));
        }

        let target = normalize_url(target_url).map_err(|e| {
            TaskError::Validation(format!("invalid target URL '{}': {}", target_url, e))
        })?;

        let id = Uuid::new_v4().to_string();
        let task = CrawlTask::new(id.clone(), owner.to_string(), target.to_string(), Utc::now());

        self.store.put(task);
        self.queue.push_back(WorkItem::first(id.clone()));

        tracing::info!("Queued task {} for {} ({})", id, target, owner);
        Ok(id)
    }

    /// Returns a snapshot of the task
    pub fn status(&self, task_id: &str) -> TaskResult<CrawlTask> {
        self.store
            .get(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
    }

    /// Cancels a queued or running task
    ///
    /// Cancelling a finished task changes nothing and returns its snapshot.
    /// A queued task is removed from the queue and never runs; a running
    /// task has its crawl signalled to stop.
    pub fn cancel(&self, task_id: &str) -> TaskResult<CrawlTask> {
        let now = Utc::now();
        match self.store.update(task_id, &mut |task| task.cancel(now)) {
            UpdateOutcome::Applied(task) => {
                let dequeued = self.queue.remove(task_id);
                let interrupted = self.running.cancel(task_id);
                tracing::info!(
                    "Cancelled task {} (dequeued: {}, interrupted: {})",
                    task_id,
                    dequeued,
                    interrupted
                );
                Ok(task)
            }
            UpdateOutcome::Unchanged(task) => Ok(task),
            UpdateOutcome::NotFound => Err(TaskError::NotFound(task_id.to_string())),
        }
    }

    /// Deletes tasks not updated within the retention window
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Like `sweep`, measured from `now`
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let removed = sweep_expired(self.store.as_ref(), now, self.settings.retention());
        if removed > 0 {
            tracing::info!("Swept {} expired tasks", removed);
        }
        removed
    }

    /// Snapshots of every tracked task, oldest first
    pub fn tasks(&self) -> Vec<CrawlTask> {
        let mut tasks = Vec::with_capacity(self.store.len());
        self.store.for_each(&mut |task| tasks.push(task.clone()));
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Ids of tasks still waiting to run, in execution order
    pub fn pending(&self) -> Vec<TaskId> {
        self.queue.pending()
    }

    /// Polls `status` until the task reaches a terminal state
    pub async fn wait_for(&self, task_id: &str, poll: Duration) -> TaskResult<CrawlTask> {
        loop {
            let task = self.status(task_id)?;
            if task.is_terminal() {
                return Ok(task);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Stops the worker and sweeper and waits for them to exit
    ///
    /// A crawl in flight is cancelled.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }

        tracing::info!("Orchestrator stopped");
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
