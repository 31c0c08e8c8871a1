use super::{Dispatcher, NotificationPayload};
use crate::error::AppError;
use crate::notify::Notifier;
use crate::storage::json_store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const SCHEMA_VERSION: u32 = 1;
const TIMERS_FILE_NAME: &str = "timers.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTimers {
    schema_version: u32,
    #[serde(default)]
    timers: Vec<PendingTimer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingTimer {
    tag: String,
    fire_at: String,
    payload: NotificationPayload,
}

/// A timer that came due and was handed to the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub tag: String,
    pub payload: NotificationPayload,
}

#[derive(Debug)]
pub struct PresentFailure {
    pub task_id: i64,
    pub error: AppError,
}

#[derive(Debug)]
pub struct DrainOutcome {
    pub fired: Vec<FiredTimer>,
    pub failures: Vec<PresentFailure>,
}

pub fn timers_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TASKPAD_TIMERS_PATH")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(json_store::config_dir()?.join(TIMERS_FILE_NAME))
}

/// Durable dispatcher backed by a JSON file of pending timers.
///
/// There is no background thread: enqueued timers sit on disk until a
/// drain pass (`fire_due`) observes that their fire time has passed.
pub struct FileDispatcher {
    path: PathBuf,
}

impl FileDispatcher {
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn load(&self) -> Result<Vec<PendingTimer>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|err| AppError::io(err.to_string()))?;
        let stored: StoredTimers =
            serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

        if stored.schema_version != SCHEMA_VERSION {
            return Err(AppError::invalid_data("schema_version mismatch"));
        }

        Ok(stored.timers)
    }

    fn save(&self, timers: Vec<PendingTimer>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        let stored = StoredTimers {
            schema_version: SCHEMA_VERSION,
            timers,
        };
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        std::fs::write(&self.path, content).map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }

    /// Pending timer count per tag, for surfacing schedule state to the UI.
    pub fn pending_for_tag(&self, tag: &str) -> Result<usize, AppError> {
        Ok(self.load()?.iter().filter(|timer| timer.tag == tag).count())
    }

    pub fn pending_count(&self) -> Result<usize, AppError> {
        Ok(self.load()?.len())
    }

    /// Fire every timer whose time has passed, presenting each through
    /// `notifier`. Due timers are removed whether or not presentation
    /// succeeds; a missed alert is a degradation, not a reason to wedge
    /// the queue. Not-yet-due timers are kept untouched.
    pub fn fire_due(
        &self,
        notifier: &dyn Notifier,
        now: OffsetDateTime,
    ) -> Result<DrainOutcome, AppError> {
        let timers = self.load()?;
        let mut remaining = Vec::with_capacity(timers.len());
        let mut fired = Vec::new();
        let mut failures = Vec::new();

        for timer in timers {
            let fire_at = OffsetDateTime::parse(&timer.fire_at, &Rfc3339)
                .map_err(|_| AppError::invalid_data("timer fire_at must be RFC3339"))?;
            if fire_at > now {
                remaining.push(timer);
                continue;
            }

            let payload = &timer.payload;
            match notifier.present(payload.task_id, &payload.title, &payload.message) {
                Ok(()) => fired.push(FiredTimer {
                    tag: timer.tag.clone(),
                    payload: timer.payload.clone(),
                }),
                Err(error) => {
                    tracing::warn!(task_id = payload.task_id, %error, "failed to present notification");
                    failures.push(PresentFailure {
                        task_id: payload.task_id,
                        error,
                    });
                }
            }
        }

        self.save(remaining)?;

        Ok(DrainOutcome { fired, failures })
    }
}

impl Dispatcher for FileDispatcher {
    fn enqueue(
        &self,
        tag: &str,
        delay: time::Duration,
        payload: NotificationPayload,
    ) -> Result<(), AppError> {
        let fire_at = (OffsetDateTime::now_utc() + delay)
            .format(&Rfc3339)
            .map_err(|err| AppError::dispatch(err.to_string()))?;

        let mut timers = self
            .load()
            .map_err(|err| AppError::dispatch(err.to_string()))?;
        timers.push(PendingTimer {
            tag: tag.to_string(),
            fire_at,
            payload,
        });
        self.save(timers)
            .map_err(|err| AppError::dispatch(err.to_string()))
    }

    fn cancel_by_tag(&self, tag: &str) -> Result<(), AppError> {
        let mut timers = self
            .load()
            .map_err(|err| AppError::dispatch(err.to_string()))?;
        timers.retain(|timer| timer.tag != tag);
        self.save(timers)
            .map_err(|err| AppError::dispatch(err.to_string()))
    }
}
