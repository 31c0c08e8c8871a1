use crate::error::AppError;
use crate::model::{Reminder, Task};
use crate::schedule::TaskStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 2;
const STORE_FILE_NAME: &str = "tasks.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    schema_version: u32,
    #[serde(default = "first_id")]
    next_task_id: i64,
    #[serde(default = "first_id")]
    next_reminder_id: i64,
    tasks: Vec<Task>,
    #[serde(default)]
    reminders: Vec<Reminder>,
}

fn first_id() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState {
    pub next_task_id: i64,
    pub next_reminder_id: i64,
    pub tasks: Vec<Task>,
    pub reminders: Vec<Reminder>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            next_task_id: 1,
            next_reminder_id: 1,
            tasks: Vec::new(),
            reminders: Vec::new(),
        }
    }
}

impl StoreState {
    /// Ids are allocated from a persisted counter and never reused, so a
    /// deleted task's id cannot come back attached to different content.
    pub fn allocate_task_id(&mut self) -> i64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        id
    }

    pub fn allocate_reminder_id(&mut self) -> i64 {
        let id = self.next_reminder_id;
        self.next_reminder_id += 1;
        id
    }

    pub fn reminders_for(&self, task_id: i64) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|reminder| reminder.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Remove a task and cascade-delete its reminders.
    pub fn remove_task(&mut self, task_id: i64) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == task_id)?;
        let removed = self.tasks.remove(index);
        self.reminders.retain(|reminder| reminder.task_id != task_id);
        Some(removed)
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var("TASKPAD_STORE_PATH")
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(config_dir()?.join(STORE_FILE_NAME))
}

pub fn config_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskpad"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("taskpad"))
    }
}

pub fn load_state(path: &Path) -> Result<StoreState, AppError> {
    if !path.exists() {
        return Ok(StoreState::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredState =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    for reminder in &stored.reminders {
        let owned = stored.tasks.iter().any(|task| task.id == reminder.task_id);
        if !owned {
            return Err(AppError::invalid_data(format!(
                "reminder {} references unknown task {}",
                reminder.id, reminder.task_id
            )));
        }
    }

    Ok(StoreState {
        next_task_id: stored.next_task_id,
        next_reminder_id: stored.next_reminder_id,
        tasks: stored.tasks,
        reminders: stored.reminders,
    })
}

pub fn save_state(path: &Path, state: &StoreState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredState {
        schema_version: SCHEMA_VERSION,
        next_task_id: state.next_task_id,
        next_reminder_id: state.next_reminder_id,
        tasks: state.tasks.to_vec(),
        reminders: state.reminders.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}

/// Store-backed task snapshot for restart recovery.
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl TaskStore for JsonTaskStore {
    fn list_incomplete_tasks(&self) -> Result<Vec<(Task, Vec<Reminder>)>, AppError> {
        let state = load_state(&self.path)?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| !task.is_completed)
            .map(|task| (task.clone(), state.reminders_for(task.id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonTaskStore, SCHEMA_VERSION, StoreState, load_state, save_state};
    use crate::model::{Reminder, Task};
    use crate::schedule::TaskStore;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskpad-{nanos}-{file_name}"))
    }

    fn make_task(id: i64, title: &str, is_completed: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            is_completed,
            created_at: "2025-12-20T00:00:00Z".to_string(),
        }
    }

    fn make_reminder(id: i64, task_id: i64) -> Reminder {
        Reminder {
            id,
            task_id,
            date: "2025-12-21".to_string(),
            time: "09:00".to_string(),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("tasks.json");
        let state = StoreState {
            next_task_id: 3,
            next_reminder_id: 2,
            tasks: vec![make_task(1, "demo", false), make_task(2, "done", true)],
            reminders: vec![make_reminder(1, 1)],
        };

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_loads_empty_state() {
        let path = temp_path("missing.json");
        let loaded = load_state(&path).unwrap();

        assert!(loaded.tasks.is_empty());
        assert!(loaded.reminders.is_empty());
        assert_eq!(loaded.next_task_id, 1);
        assert_eq!(loaded.next_reminder_id, 1);
    }

    #[test]
    fn accepts_v1_schema_without_reminders() {
        let path = temp_path("v1-schema.json");
        let content = "{\n  \"schema_version\": 1,\n  \"tasks\": [\n    {\n      \"id\": 1,\n      \"title\": \"demo\",\n      \"created_at\": \"2025-12-20T00:00:00Z\"\n    }\n  ]\n}";
        fs::write(&path, content).unwrap();

        let loaded = load_state(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.tasks.len(), 1);
        assert!(!loaded.tasks[0].is_completed);
        assert!(loaded.reminders.is_empty());
        assert_eq!(loaded.next_task_id, 1);
    }

    #[test]
    fn schema_version_must_match() {
        let path = temp_path("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"tasks\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_reminder_for_unknown_task() {
        let path = temp_path("orphan-reminder.json");
        let state = StoreState {
            next_task_id: 2,
            next_reminder_id: 2,
            tasks: vec![make_task(1, "demo", false)],
            reminders: vec![make_reminder(1, 99)],
        };
        let content = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "next_task_id": state.next_task_id,
            "next_reminder_id": state.next_reminder_id,
            "tasks": state.tasks,
            "reminders": state.reminders,
        });
        fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();

        let err = load_state(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn allocate_ids_never_repeat() {
        let mut state = StoreState::default();
        let a = state.allocate_task_id();
        let b = state.allocate_task_id();
        assert_ne!(a, b);
        assert_eq!(state.next_task_id, 3);

        let r = state.allocate_reminder_id();
        assert_eq!(r, 1);
        assert_eq!(state.next_reminder_id, 2);
    }

    #[test]
    fn remove_task_cascades_reminders() {
        let mut state = StoreState {
            next_task_id: 3,
            next_reminder_id: 4,
            tasks: vec![make_task(1, "keep", false), make_task(2, "drop", false)],
            reminders: vec![
                make_reminder(1, 1),
                make_reminder(2, 2),
                make_reminder(3, 2),
            ],
        };

        let removed = state.remove_task(2).unwrap();

        assert_eq!(removed.id, 2);
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.reminders.len(), 1);
        assert_eq!(state.reminders[0].task_id, 1);
    }

    #[test]
    fn remove_task_unknown_id_is_none() {
        let mut state = StoreState::default();
        assert!(state.remove_task(7).is_none());
    }

    #[test]
    fn task_store_lists_incomplete_tasks_with_reminders() {
        let path = temp_path("task-store.json");
        let state = StoreState {
            next_task_id: 4,
            next_reminder_id: 3,
            tasks: vec![
                make_task(1, "open", false),
                make_task(2, "closed", true),
                make_task(3, "bare", false),
            ],
            reminders: vec![make_reminder(1, 1), make_reminder(2, 2)],
        };
        save_state(&path, &state).unwrap();

        let listed = JsonTaskStore::at(&path).list_incomplete_tasks().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.id, 1);
        assert_eq!(listed[0].1.len(), 1);
        assert_eq!(listed[1].0.id, 3);
        assert!(listed[1].1.is_empty());
    }
}
