use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: String,
}

/// A wall-clock reminder attached to a task. `date` is `YYYY-MM-DD` and
/// `time` is 24h `HH:MM`; together they name one instant in the local
/// offset. Rows that no longer parse are skipped at derive time rather
/// than rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub task_id: i64,
    pub date: String,
    pub time: String,
}
