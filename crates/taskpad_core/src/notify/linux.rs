use crate::error::AppError;
use crate::notify::{Notifier, notification_key};
use notify_rust::Notification;

pub struct LinuxNotifier {
    summary: String,
}

impl LinuxNotifier {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
        }
    }
}

impl Notifier for LinuxNotifier {
    fn present(&self, task_id: i64, _title: &str, message: &str) -> Result<(), AppError> {
        // Reusing the id makes the server replace the previous alert for
        // this task instead of stacking one per lead offset.
        Notification::new()
            .summary(&self.summary)
            .body(message)
            .id(notification_key(task_id))
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }
}
