//! Task table
//!
//! The orchestrator owns its tasks through an injected `TaskStore`. All
//! status changes go through `update`, which runs the given closure while
//! holding the table lock.

use crate::orchestrator::task::CrawlTask;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of `TaskStore::update`
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The closure changed the task; holds the new snapshot
    Applied(CrawlTask),
    /// The closure declined; holds the unchanged snapshot
    Unchanged(CrawlTask),
    NotFound,
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_task(self) -> Option<CrawlTask> {
        match self {
            Self::Applied(task) | Self::Unchanged(task) => Some(task),
            Self::NotFound => None,
        }
    }
}

/// Synchronized table of crawl tasks keyed by id
pub trait TaskStore: Send + Sync {
    fn get(&self, id: &str) -> Option<CrawlTask>;

    fn put(&self, task: CrawlTask);

    fn delete(&self, id: &str) -> Option<CrawlTask>;

    /// Visits every task under the lock
    fn for_each(&self, visit: &mut dyn FnMut(&CrawlTask));

    /// Atomically runs `apply` against one task
    ///
    /// `apply` returns whether it changed the task. It must leave the task
    /// untouched when it returns `false`.
    fn update(&self, id: &str, apply: &mut dyn FnMut(&mut CrawlTask) -> bool) -> UpdateOutcome;

    /// Keeps only the tasks for which `keep` returns true
    ///
    /// # Returns
    ///
    /// The number of tasks removed
    fn retain(&self, keep: &mut dyn FnMut(&CrawlTask) -> bool) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `TaskStore` backed by a mutex-guarded `HashMap`
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, CrawlTask>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CrawlTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, id: &str) -> Option<CrawlTask> {
        self.lock().get(id).cloned()
    }

    fn put(&self, task: CrawlTask) {
        self.lock().insert(task.id.clone(), task);
    }

    fn delete(&self, id: &str) -> Option<CrawlTask> {
        self.lock().remove(id)
    }

    fn for_each(&self, visit: &mut dyn FnMut(&CrawlTask)) {
        for task in self.lock().values() {
            visit(task);
        }
    }

    fn update(&self, id: &str, apply: &mut dyn FnMut(&mut CrawlTask) -> bool) -> UpdateOutcome {
        let mut tasks = self.lock();
        let Some(task) = tasks.get_mut(id) else {
            return UpdateOutcome::NotFound;
        };

        if apply(task) {
            UpdateOutcome::Applied(task.clone())
        } else {
            UpdateOutcome::Unchanged(task.clone())
        }
    }

    fn retain(&self, keep: &mut dyn FnMut(&CrawlTask) -> bool) -> usize {
        let mut tasks = self.lock();
        let before = tasks.len();
        tasks.retain(|_, task| keep(task));
        before - tasks.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
