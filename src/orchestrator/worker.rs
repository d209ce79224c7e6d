//! The single sequential worker
//!
//! Pops one attempt at a time, runs the crawl, builds the tree, and moves
//! the task to its next state. Completed crawls are then handed to the
//! record sink. Failed attempts are re-enqueued at the front
//! of the queue after the retry delay, so no other task starts in between.

use crate::config::OrchestratorConfig;
use crate::crawler::{CrawlRequest, CrawlRunner, ProgressCallback};
use crate::orchestrator::queue::{WorkItem, WorkQueue};
use crate::orchestrator::store::{TaskStore, UpdateOutcome};
use crate::orchestrator::task::{CrawlTask, TaskId};
use crate::storage::RecordSink;
use crate::tree::{build_site_tree, SiteTree};
use crate::CrawlError;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Cancellation handle of the attempt currently in flight
#[derive(Debug, Default)]
pub(crate) struct RunningSlot {
    current: Mutex<Option<(TaskId, CancellationToken)>>,
}

impl RunningSlot {
    fn lock(&self) -> MutexGuard<'_, Option<(TaskId, CancellationToken)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, task_id: TaskId, token: CancellationToken) {
        *self.lock() = Some((task_id, token));
    }

    fn clear(&self, task_id: &str) {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|(id, _)| id == task_id) {
            *current = None;
        }
    }

    /// Triggers the token of `task_id` if it is the running task
    pub(crate) fn cancel(&self, task_id: &str) -> bool {
        match self.lock().as_ref() {
            Some((id, token)) if id == task_id => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

pub(crate) struct Worker {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) running: Arc<RunningSlot>,
    pub(crate) runner: Arc<dyn CrawlRunner>,
    pub(crate) sink: Option<Arc<dyn RecordSink>>,
    pub(crate) settings: OrchestratorConfig,
    pub(crate) shutdown: CancellationToken,
}

impl Worker {
    pub(crate) async fn run(self) {
        tracing::debug!("Worker started");

        while let Some(item) = self.queue.next(&self.shutdown).await {
            self.process(item).await;
        }

        tracing::debug!("Worker stopped");
    }

    async fn process(&self, item: WorkItem) {
        // The token must be in the slot before the task turns processing
        let token = self.shutdown.child_token();
        self.running.set(item.task_id.clone(), token.clone());

        let now = Utc::now();
        let task = match self
            .store
            .update(&item.task_id, &mut |task| task.start_attempt(now))
        {
            UpdateOutcome::Applied(task) => task,
            UpdateOutcome::Unchanged(task) => {
                tracing::debug!("Skipping task {} in state {}", task.id, task.status);
                self.running.clear(&item.task_id);
                return;
            }
            UpdateOutcome::NotFound => {
                tracing::debug!("Skipping task {}: no longer tracked", item.task_id);
                self.running.clear(&item.task_id);
                return;
            }
        };

        tracing::info!(
            "Task {} attempt {}/{}: crawling {}",
            task.id,
            item.attempt,
            self.settings.max_attempts,
            task.target_url
        );

        match self.attempt(&task, &token).await {
            Ok(tree) => self.finish(&task, tree).await,
            Err(err) if err.is_retryable() && item.attempt < self.settings.max_attempts => {
                tracing::warn!(
                    "Task {} attempt {} failed: {}; retrying in {}ms",
                    task.id,
                    item.attempt,
                    err,
                    self.settings.retry_delay_ms
                );

                let interrupted = tokio::select! {
                    _ = token.cancelled() => true,
                    _ = tokio::time::sleep(self.settings.retry_delay()) => false,
                };

                if interrupted {
                    self.fail(&task.id, &CrawlError::Cancelled);
                } else {
                    self.queue.push_front(item.retry());
                }
            }
            Err(err) => self.fail(&task.id, &err),
        }

        self.running.clear(&task.id);
    }

    /// Runs one crawl attempt and builds the tree from its records
    async fn attempt(
        &self,
        task: &CrawlTask,
        token: &CancellationToken,
    ) -> Result<SiteTree, CrawlError> {
        let target = Url::parse(&task.target_url)
            .map_err(|e| CrawlError::InvalidTarget(format!("{}: {}", task.target_url, e)))?;

        let request = CrawlRequest::new(task.id.clone(), task.owner.clone(), target)
            .with_cancel(token.clone())
            .with_progress(self.progress_callback(&task.id));

        let records = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(CrawlError::Cancelled),
            result = self.runner.run(&request) => result?,
        };

        Ok(build_site_tree(&task.target_url, &records))
    }

    fn progress_callback(&self, task_id: &str) -> ProgressCallback {
        let store = Arc::clone(&self.store);
        let task_id = task_id.to_string();
        Arc::new(move |percent: u8| {
            store.update(&task_id, &mut |task| task.set_progress(percent, Utc::now()));
        })
    }

    async fn finish(&self, task: &CrawlTask, tree: SiteTree) {
        let pages = tree.page_count();
        let now = Utc::now();
        let outcome = self
            .store
            .update(&task.id, &mut |current| current.complete(tree.clone(), now));

        if !outcome.is_applied() {
            tracing::debug!("Task {} left processing before completion", task.id);
            return;
        }

        tracing::info!("Task {} completed with {} pages", task.id, pages);

        if let Some(sink) = &self.sink {
            self.persist(Arc::clone(sink), task, tree).await;
        }
    }

    /// Writes the finished crawl to the record sink on a blocking thread
    ///
    /// Failures are logged and never change the task outcome.
    async fn persist(&self, sink: Arc<dyn RecordSink>, task: &CrawlTask, tree: SiteTree) {
        let owner = task.owner.clone();
        let site_url = task.target_url.clone();

        let result =
            tokio::task::spawn_blocking(move || sink.persist(&owner, &site_url, &tree)).await;

        match result {
            Ok(Ok(())) => tracing::debug!("Persisted crawl for task {}", task.id),
            Ok(Err(e)) => tracing::warn!("Failed to persist crawl for task {}: {}", task.id, e),
            Err(e) => tracing::warn!("Persistence for task {} did not finish: {}", task.id, e),
        }
    }

    fn fail(&self, task_id: &str, err: &CrawlError) {
        let message = err.to_string();
        let now = Utc::now();
        let outcome = self
            .store
            .update(task_id, &mut |task| task.fail(message.clone(), now));

        if outcome.is_applied() {
            tracing::error!("Task {} failed: {}", task_id, message);
        }
    }
}
