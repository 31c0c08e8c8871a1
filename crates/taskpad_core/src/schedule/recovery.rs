use super::scheduler::Scheduler;
use crate::error::AppError;
use crate::model::{Reminder, Task};

/// Snapshot of incomplete tasks and their reminders, consumed once per
/// cold start to rebuild the notification schedule.
pub trait TaskStore {
    fn list_incomplete_tasks(&self) -> Result<Vec<(Task, Vec<Reminder>)>, AppError>;
}

#[derive(Debug)]
pub struct RecoveryOutcome {
    pub restored: Vec<i64>,
    pub failures: Vec<RecoveryFailure>,
}

#[derive(Debug)]
pub struct RecoveryFailure {
    pub task_id: i64,
    pub error: AppError,
}

impl RecoveryOutcome {
    pub fn all_failed(&self) -> bool {
        self.restored.is_empty() && !self.failures.is_empty()
    }
}

/// Reschedule every incomplete task in the snapshot.
///
/// Each task is independent: one task failing is recorded and skipped,
/// never aborting the rest. Iteration order carries no meaning. An empty
/// snapshot is a no-op. Only the snapshot read itself can fail the call.
pub fn rebuild_all(
    store: &dyn TaskStore,
    scheduler: &Scheduler<'_>,
) -> Result<RecoveryOutcome, AppError> {
    let snapshot = store.list_incomplete_tasks()?;

    let mut restored = Vec::new();
    let mut failures = Vec::new();
    for (task, reminders) in snapshot {
        match scheduler.reschedule(&task, &reminders) {
            Ok(()) => restored.push(task.id),
            Err(error) => {
                tracing::warn!(task_id = task.id, %error, "could not restore task reminders");
                failures.push(RecoveryFailure {
                    task_id: task.id,
                    error,
                });
            }
        }
    }

    let outcome = RecoveryOutcome { restored, failures };
    if outcome.all_failed() {
        // Degraded, not fatal: the host keeps running without reminders.
        tracing::error!(
            failed = outcome.failures.len(),
            "reminder recovery failed for every task"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::{TaskStore, rebuild_all};
    use crate::dispatch::{Dispatcher, NotificationPayload};
    use crate::error::AppError;
    use crate::model::{Reminder, Task};
    use crate::schedule::Scheduler;
    use std::cell::RefCell;
    use time::Duration;

    fn make_task(id: i64, is_completed: bool) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            is_completed,
            created_at: "2025-03-01T00:00:00Z".to_string(),
        }
    }

    fn far_future_reminder(id: i64, task_id: i64) -> Reminder {
        Reminder {
            id,
            task_id,
            date: "2099-04-01".to_string(),
            time: "09:00".to_string(),
        }
    }

    struct FixedStore {
        snapshot: Vec<(Task, Vec<Reminder>)>,
    }

    impl TaskStore for FixedStore {
        fn list_incomplete_tasks(&self) -> Result<Vec<(Task, Vec<Reminder>)>, AppError> {
            Ok(self.snapshot.clone())
        }
    }

    struct BrokenStore;

    impl TaskStore for BrokenStore {
        fn list_incomplete_tasks(&self) -> Result<Vec<(Task, Vec<Reminder>)>, AppError> {
            Err(AppError::io("store unreadable"))
        }
    }

    #[derive(Default)]
    struct RecordingDispatcher {
        live: RefCell<Vec<(String, NotificationPayload)>>,
    }

    impl Dispatcher for RecordingDispatcher {
        fn enqueue(
            &self,
            tag: &str,
            _delay: Duration,
            payload: NotificationPayload,
        ) -> Result<(), AppError> {
            self.live.borrow_mut().push((tag.to_string(), payload));
            Ok(())
        }

        fn cancel_by_tag(&self, tag: &str) -> Result<(), AppError> {
            self.live.borrow_mut().retain(|(t, _)| t != tag);
            Ok(())
        }
    }

    /// Fails enqueues for one poisoned task id, accepts the rest.
    struct PartiallyFailingDispatcher {
        poisoned_task_id: i64,
        live: RefCell<Vec<String>>,
    }

    impl Dispatcher for PartiallyFailingDispatcher {
        fn enqueue(
            &self,
            tag: &str,
            _delay: Duration,
            payload: NotificationPayload,
        ) -> Result<(), AppError> {
            if payload.task_id == self.poisoned_task_id {
                return Err(AppError::dispatch("enqueue rejected"));
            }
            self.live.borrow_mut().push(tag.to_string());
            Ok(())
        }

        fn cancel_by_tag(&self, tag: &str) -> Result<(), AppError> {
            self.live.borrow_mut().retain(|t| t != tag);
            Ok(())
        }
    }

    #[test]
    fn rebuild_restores_every_incomplete_task() {
        let dispatcher = RecordingDispatcher::default();
        let scheduler = Scheduler::new(&dispatcher);
        let store = FixedStore {
            snapshot: vec![
                (make_task(1, false), vec![far_future_reminder(1, 1)]),
                (make_task(2, false), vec![far_future_reminder(2, 2)]),
            ],
        };

        let outcome = rebuild_all(&store, &scheduler).unwrap();

        assert_eq!(outcome.restored, vec![1, 2]);
        assert!(outcome.failures.is_empty());
        assert_eq!(dispatcher.live.borrow().len(), 8);
    }

    #[test]
    fn rebuild_with_empty_snapshot_is_a_no_op() {
        let dispatcher = RecordingDispatcher::default();
        let scheduler = Scheduler::new(&dispatcher);
        let store = FixedStore {
            snapshot: Vec::new(),
        };

        let outcome = rebuild_all(&store, &scheduler).unwrap();

        assert!(outcome.restored.is_empty());
        assert!(outcome.failures.is_empty());
        assert!(!outcome.all_failed());
        assert!(dispatcher.live.borrow().is_empty());
    }

    #[test]
    fn one_failing_task_does_not_stop_the_rest() {
        let dispatcher = PartiallyFailingDispatcher {
            poisoned_task_id: 1,
            live: RefCell::new(Vec::new()),
        };
        let scheduler = Scheduler::new(&dispatcher);
        let store = FixedStore {
            snapshot: vec![
                (make_task(1, false), vec![far_future_reminder(1, 1)]),
                (make_task(2, false), vec![far_future_reminder(2, 2)]),
                (make_task(3, false), vec![far_future_reminder(3, 3)]),
            ],
        };

        let outcome = rebuild_all(&store, &scheduler).unwrap();

        assert_eq!(outcome.restored, vec![2, 3]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].task_id, 1);
        assert_eq!(outcome.failures[0].error.code(), "dispatch_error");
        assert!(!outcome.all_failed());
    }

    #[test]
    fn all_tasks_failing_is_reported_but_not_an_error() {
        let dispatcher = PartiallyFailingDispatcher {
            poisoned_task_id: 1,
            live: RefCell::new(Vec::new()),
        };
        let scheduler = Scheduler::new(&dispatcher);
        let store = FixedStore {
            snapshot: vec![(make_task(1, false), vec![far_future_reminder(1, 1)])],
        };

        let outcome = rebuild_all(&store, &scheduler).unwrap();

        assert!(outcome.restored.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.all_failed());
    }

    #[test]
    fn unreadable_store_fails_the_call() {
        let dispatcher = RecordingDispatcher::default();
        let scheduler = Scheduler::new(&dispatcher);

        let err = rebuild_all(&BrokenStore, &scheduler).unwrap_err();

        assert_eq!(err.code(), "io_error");
    }
}
