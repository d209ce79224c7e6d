//! Work queue feeding the single worker

use crate::orchestrator::task::TaskId;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// One scheduled attempt of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub task_id: TaskId,
    /// 1-based attempt number
    pub attempt: u32,
}

impl WorkItem {
    pub fn first(task_id: TaskId) -> Self {
        Self {
            task_id,
            attempt: 1,
        }
    }

    pub fn retry(&self) -> Self {
        Self {
            task_id: self.task_id.clone(),
            attempt: self.attempt + 1,
        }
    }
}

/// FIFO of pending attempts with async wake-up
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a new submission
    pub fn push_back(&self, item: WorkItem) {
        self.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Schedules a retry ahead of everything already waiting
    pub fn push_front(&self, item: WorkItem) {
        self.lock().push_front(item);
        self.notify.notify_one();
    }

    /// Removes every pending attempt of a task
    ///
    /// # Returns
    ///
    /// True if anything was removed
    pub fn remove(&self, task_id: &str) -> bool {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|item| item.task_id != task_id);
        items.len() != before
    }

    pub fn pop(&self) -> Option<WorkItem> {
        self.lock().pop_front()
    }

    /// Waits for the next item
    ///
    /// Returns None once `shutdown` is cancelled.
    pub async fn next(&self, shutdown: &CancellationToken) -> Option<WorkItem> {
        loop {
            if shutdown.is_cancelled() {
                return None;
            }
            if let Some(item) = self.pop() {
                return Some(item);
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = shutdown.cancelled() => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Task ids in execution order
    pub fn pending(&self) -> Vec<TaskId> {
        self.lock().iter().map(|item| item.task_id.clone()).collect()
    }
}
