//! State module for tracking crawl task progress
//!
//! # Components
//!
//! - `TaskStatus`: The lifecycle of a crawl task (queued, processing, completed, error)

mod task_state;

pub use task_state::TaskStatus;
