//! Reminder scheduling.
//!
//! The deriver turns a task's reminders into future fire-events, the
//! scheduler replays them against a [`crate::dispatch::Dispatcher`] with a
//! cancel-then-enqueue protocol, and recovery replays every incomplete
//! task after a restart.

pub mod derive;
pub mod recovery;
pub mod scheduler;

pub use derive::{FireEvent, LeadOffset, derive, notification_tag};
pub use recovery::{RecoveryFailure, RecoveryOutcome, TaskStore, rebuild_all};
pub use scheduler::{Scheduler, local_now};
