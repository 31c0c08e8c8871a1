//! Delayed-execution contract the scheduler delegates to.
//!
//! Any durable one-shot timer mechanism can sit behind [`Dispatcher`];
//! [`FileDispatcher`] is the built-in implementation, persisting pending
//! timers to disk so they outlive the process.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use time::Duration;

mod timer_file;

pub use timer_file::{DrainOutcome, FileDispatcher, FiredTimer, PresentFailure, timers_path};

/// What a fired timer hands to the notification presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub task_id: i64,
    pub title: String,
    pub message: String,
}

pub trait Dispatcher {
    /// Enqueue one unit of work to run after `delay`, grouped under `tag`.
    /// Accepted work must survive process restarts until cancelled or fired.
    fn enqueue(
        &self,
        tag: &str,
        delay: Duration,
        payload: NotificationPayload,
    ) -> Result<(), AppError>;

    /// Cancel all pending work sharing exactly `tag`. Idempotent; a tag
    /// with nothing enqueued is not an error.
    fn cancel_by_tag(&self, tag: &str) -> Result<(), AppError>;
}
