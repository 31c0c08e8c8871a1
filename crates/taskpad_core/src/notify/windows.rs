use crate::error::AppError;
use crate::notify::Notifier;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier {
    summary: String,
}

impl WindowsNotifier {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
        }
    }
}

impl Notifier for WindowsNotifier {
    fn present(&self, _task_id: i64, title: &str, message: &str) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&self.summary)
            .text1(title)
            .text2(message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }
}
