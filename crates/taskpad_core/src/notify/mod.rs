use crate::error::AppError;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

/// Presents one fired notification. Presenting again with the same
/// `task_id` replaces the previous alert instead of stacking a new one.
pub trait Notifier {
    fn present(&self, task_id: i64, title: &str, message: &str) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn present(&self, _task_id: i64, _title: &str, _message: &str) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("TASKPAD_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    let config = crate::config::load_config_with_fallback().config;
    if !config.notifications_enabled() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier(config.summary()) {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

/// Linux notification ids are u32; fold the task id into that range so a
/// task keeps presenting under one stable key.
pub fn notification_key(task_id: i64) -> u32 {
    (task_id.rem_euclid(i64::from(u32::MAX)) as u32).wrapping_add(1)
}

#[cfg(target_os = "linux")]
pub fn platform_notifier(summary: &str) -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier::new(summary)))
}

#[cfg(windows)]
pub fn platform_notifier(summary: &str) -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier::new(summary)))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier(_summary: &str) -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
