/// Task state definitions for the crawl orchestrator
///
/// This module defines every status a crawl task can be in and which
/// transitions between them are allowed.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current status of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    // ===== Active States =====
    /// Task is waiting in the work queue
    Queued,

    /// Task is being crawled, or is waiting between retry attempts
    Processing,

    // ===== Terminal States =====
    /// Crawl finished and the site tree is attached
    Completed,

    /// Crawl failed after all attempts, or the task was cancelled
    Error,
}

impl TaskStatus {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Returns true if the orchestrator may move a task from `self` to `next`
    ///
    /// `Processing -> Processing` is allowed so that a retried attempt can
    /// re-enter the running state without passing through `Queued`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (Self::Queued, Self::Processing) => true,
            (Self::Processing, Self::Processing) => true,
            (Self::Processing, Self::Completed) => true,
            (Self::Queued | Self::Processing, Self::Error) => true,
            _ => false,
        }
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());

        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Error));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Error));
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for terminal in [TaskStatus::Completed, TaskStatus::Error] {
            for next in [
                TaskStatus::Queued,
                TaskStatus::Processing,
                TaskStatus::Completed,
                TaskStatus::Error,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_queued_cannot_complete_directly() {
        assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Processing.can_transition_to(TaskStatus::Queued));
    }

    #[test]
    fn test_serde_matches_display() {
        let json = serde_json::to_string(&TaskStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(TaskStatus::Error.to_string(), "error");
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            format!("\"{}\"", TaskStatus::Completed)
        );
    }
}
