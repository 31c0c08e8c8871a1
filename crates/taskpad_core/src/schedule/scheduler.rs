use super::derive::{derive, notification_tag};
use crate::dispatch::{Dispatcher, NotificationPayload};
use crate::error::AppError;
use crate::model::{Reminder, Task};
use time::{OffsetDateTime, UtcOffset};

/// Replays a task's derived fire-events against a dispatcher.
///
/// Holds no state of its own: every call cancels the task's tag and
/// regenerates the full event set from current task data, so repeated
/// calls with unchanged inputs converge on the same live schedule.
pub struct Scheduler<'a> {
    dispatcher: &'a dyn Dispatcher,
}

impl<'a> Scheduler<'a> {
    pub fn new(dispatcher: &'a dyn Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Replace all scheduled notifications for `task` with a freshly
    /// derived set. A completed task ends up with nothing scheduled.
    ///
    /// Dispatcher failures surface to the caller; nothing is cached here,
    /// so the call is safe to retry as-is.
    pub fn reschedule(&self, task: &Task, reminders: &[Reminder]) -> Result<(), AppError> {
        self.reschedule_at(task, reminders, local_now())
    }

    fn reschedule_at(
        &self,
        task: &Task,
        reminders: &[Reminder],
        now: OffsetDateTime,
    ) -> Result<(), AppError> {
        let tag = notification_tag(task.id);
        self.dispatcher.cancel_by_tag(&tag)?;

        for event in derive(task, reminders, now) {
            let delay = event.fire_at - now;
            self.dispatcher.enqueue(
                &tag,
                delay,
                NotificationPayload {
                    task_id: task.id,
                    title: task.title.clone(),
                    message: event.message,
                },
            )?;
        }

        Ok(())
    }

    /// Drop every scheduled notification for a task. Used on deletion;
    /// cancelling a tag with nothing enqueued is a no-op.
    pub fn cancel(&self, task_id: i64) -> Result<(), AppError> {
        self.dispatcher.cancel_by_tag(&notification_tag(task_id))
    }
}

pub fn local_now() -> OffsetDateTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}
