//! Expiry of stale tasks

use crate::orchestrator::store::TaskStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Deletes every task whose last update is older than `retention`
///
/// Status is not considered: queued, running and finished tasks expire alike.
///
/// # Returns
///
/// The number of tasks removed
pub fn sweep_expired(store: &dyn TaskStore, now: DateTime<Utc>, retention: Duration) -> usize {
    let retention =
        chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::weeks(5200));
    let cutoff = now - retention;
    store.retain(&mut |task| task.updated_at >= cutoff)
}

/// Runs `sweep_expired` on a fixed interval until `shutdown` is cancelled
pub(crate) async fn run_sweeper(
    store: Arc<dyn TaskStore>,
    retention: Duration,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = sweep_expired(store.as_ref(), Utc::now(), retention);
                if removed > 0 {
                    tracing::info!("Swept {} expired tasks", removed);
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    tracing::debug!("Sweeper stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::store::MemoryTaskStore;
    use crate::orchestrator::task::CrawlTask;

    fn task_at(id: &str, updated_at: DateTime<Utc>) -> CrawlTask {
        CrawlTask::new(
            id.to_string(),
            "user-1".to_string(),
            "https://ex.com/".to_string(),
            updated_at,
        )
    }

    #[test]
    fn test_only_stale_tasks_removed() {
        let store = MemoryTaskStore::new();
        let now = Utc::now();
        store.put(task_at("old", now - chrono::Duration::hours(2)));
        store.put(task_at("edge", now - chrono::Duration::hours(1)));
        store.put(task_at("fresh", now - chrono::Duration::minutes(5)));

        let removed = sweep_expired(&store, now, Duration::from_secs(3600));

        assert_eq!(removed, 1);
        assert!(store.get("old").is_none());
        assert!(store.get("edge").is_some());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_status_does_not_matter() {
        let store = MemoryTaskStore::new();
        let then = Utc::now() - chrono::Duration::hours(3);

        let mut running = task_at("running", then);
        assert!(running.start_attempt(then));
        store.put(running);
        store.put(task_at("queued", then));

        assert_eq!(sweep_expired(&store, Utc::now(), Duration::from_secs(60)), 2);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
        store.put(task_at("old", Utc::now() - chrono::Duration::hours(2)));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_sweeper(
            Arc::clone(&store),
            Duration::from_secs(3600),
            Duration::from_secs(60),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
