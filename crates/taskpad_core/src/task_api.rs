use crate::dispatch::{DrainOutcome, FileDispatcher, timers_path};
use crate::error::AppError;
use crate::model::{Reminder, Task};
use crate::notify::notifier_from_env;
use crate::schedule::derive::reminder_instant;
use crate::schedule::{RecoveryOutcome, Scheduler, rebuild_all};
use crate::storage::json_store;
use crate::storage::json_store::JsonTaskStore;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Pending,
    Completed,
}

pub fn add_task(title: &str) -> Result<Task, AppError> {
    add_task_with_paths(&json_store::store_path()?, title)
}

pub fn edit_task(id: i64, new_title: &str) -> Result<Task, AppError> {
    edit_task_with_paths(&json_store::store_path()?, &timers_path()?, id, new_title)
}

pub fn delete_task(id: i64) -> Result<Task, AppError> {
    delete_task_with_paths(&json_store::store_path()?, &timers_path()?, id)
}

pub fn complete_task(id: i64) -> Result<Task, AppError> {
    complete_task_with_paths(&json_store::store_path()?, &timers_path()?, id)
}

pub fn reopen_task(id: i64) -> Result<Task, AppError> {
    reopen_task_with_paths(&json_store::store_path()?, &timers_path()?, id)
}

pub fn get_task_by_id(id: i64) -> Result<Task, AppError> {
    get_task_by_id_with_paths(&json_store::store_path()?, id)
}

pub fn list_tasks(filter: TaskFilter) -> Result<Vec<Task>, AppError> {
    list_tasks_with_paths(&json_store::store_path()?, filter)
}

pub fn add_reminder(task_id: i64, date: &str, time: &str) -> Result<Reminder, AppError> {
    add_reminder_with_paths(
        &json_store::store_path()?,
        &timers_path()?,
        task_id,
        date,
        time,
    )
}

pub fn remove_reminder(reminder_id: i64) -> Result<Reminder, AppError> {
    remove_reminder_with_paths(&json_store::store_path()?, &timers_path()?, reminder_id)
}

pub fn list_reminders(task_id: i64) -> Result<Vec<Reminder>, AppError> {
    list_reminders_with_paths(&json_store::store_path()?, task_id)
}

/// Restart recovery entry point: rebuild the notification schedule for
/// every incomplete task. The host runs this once per cold start.
pub fn rebuild_reminders() -> Result<RecoveryOutcome, AppError> {
    rebuild_reminders_with_paths(&json_store::store_path()?, &timers_path()?)
}

/// Drain timers that have come due, presenting each through the
/// platform notifier.
pub fn fire_due_timers() -> Result<DrainOutcome, AppError> {
    let notifier = notifier_from_env()?;
    let dispatcher = FileDispatcher::at(&timers_path()?);
    dispatcher.fire_due(notifier.as_ref(), OffsetDateTime::now_utc())
}

fn add_task_with_paths(store: &Path, title: &str) -> Result<Task, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut state = json_store::load_state(store)?;
    let task = Task {
        id: state.allocate_task_id(),
        title: trimmed.to_string(),
        is_completed: false,
        created_at,
    };
    state.tasks.push(task.clone());
    json_store::save_state(store, &state)?;

    Ok(task)
}

fn edit_task_with_paths(
    store: &Path,
    timers: &Path,
    id: i64,
    new_title: &str,
) -> Result<Task, AppError> {
    let trimmed = new_title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }

    let mut state = json_store::load_state(store)?;
    let mut updated_task = None;

    for task in &mut state.tasks {
        if task.id == id {
            task.title = trimmed.to_string();
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| AppError::invalid_input("task not found"))?;
    json_store::save_state(store, &state)?;

    // The title rides along in every scheduled payload.
    reschedule_task(timers, &updated, &state.reminders_for(id))?;

    Ok(updated)
}

fn delete_task_with_paths(store: &Path, timers: &Path, id: i64) -> Result<Task, AppError> {
    let mut state = json_store::load_state(store)?;
    let removed = state
        .remove_task(id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;
    json_store::save_state(store, &state)?;

    let dispatcher = FileDispatcher::at(timers);
    Scheduler::new(&dispatcher).cancel(id)?;

    Ok(removed)
}

fn complete_task_with_paths(store: &Path, timers: &Path, id: i64) -> Result<Task, AppError> {
    let mut state = json_store::load_state(store)?;
    let mut updated_task = None;

    for task in &mut state.tasks {
        if task.id == id {
            if task.is_completed {
                return Err(AppError::invalid_input("task already completed"));
            }
            task.is_completed = true;
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| AppError::invalid_input("task not found"))?;
    json_store::save_state(store, &state)?;

    // Completed tasks derive nothing, so this clears the live schedule.
    reschedule_task(timers, &updated, &state.reminders_for(id))?;

    Ok(updated)
}

fn reopen_task_with_paths(store: &Path, timers: &Path, id: i64) -> Result<Task, AppError> {
    let mut state = json_store::load_state(store)?;
    let mut updated_task = None;

    for task in &mut state.tasks {
        if task.id == id {
            if !task.is_completed {
                return Err(AppError::invalid_input("task is not completed"));
            }
            task.is_completed = false;
            updated_task = Some(task.clone());
            break;
        }
    }

    let updated = updated_task.ok_or_else(|| AppError::invalid_input("task not found"))?;
    json_store::save_state(store, &state)?;

    reschedule_task(timers, &updated, &state.reminders_for(id))?;

    Ok(updated)
}

fn get_task_by_id_with_paths(store: &Path, id: i64) -> Result<Task, AppError> {
    let state = json_store::load_state(store)?;
    state
        .tasks
        .into_iter()
        .find(|task| task.id == id)
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn list_tasks_with_paths(store: &Path, filter: TaskFilter) -> Result<Vec<Task>, AppError> {
    let state = json_store::load_state(store)?;
    Ok(state
        .tasks
        .into_iter()
        .filter(|task| match filter {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.is_completed,
            TaskFilter::Completed => task.is_completed,
        })
        .collect())
}

fn add_reminder_with_paths(
    store: &Path,
    timers: &Path,
    task_id: i64,
    date: &str,
    time: &str,
) -> Result<Reminder, AppError> {
    let mut state = json_store::load_state(store)?;
    let task = state
        .tasks
        .iter()
        .find(|task| task.id == task_id)
        .cloned()
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let reminder = Reminder {
        id: state.allocate_reminder_id(),
        task_id,
        date: date.trim().to_string(),
        time: time.trim().to_string(),
    };
    if reminder_instant(&reminder, UtcOffset::UTC).is_none() {
        return Err(AppError::invalid_input(
            "date must be YYYY-MM-DD and time must be HH:MM",
        ));
    }

    state.reminders.push(reminder.clone());
    json_store::save_state(store, &state)?;

    reschedule_task(timers, &task, &state.reminders_for(task_id))?;

    Ok(reminder)
}

fn remove_reminder_with_paths(
    store: &Path,
    timers: &Path,
    reminder_id: i64,
) -> Result<Reminder, AppError> {
    let mut state = json_store::load_state(store)?;
    let index = state
        .reminders
        .iter()
        .position(|reminder| reminder.id == reminder_id)
        .ok_or_else(|| AppError::invalid_input("reminder not found"))?;

    let removed = state.reminders.remove(index);
    let task = state
        .tasks
        .iter()
        .find(|task| task.id == removed.task_id)
        .cloned()
        .ok_or_else(|| AppError::invalid_data("reminder references unknown task"))?;
    json_store::save_state(store, &state)?;

    reschedule_task(timers, &task, &state.reminders_for(task.id))?;

    Ok(removed)
}

fn list_reminders_with_paths(store: &Path, task_id: i64) -> Result<Vec<Reminder>, AppError> {
    let state = json_store::load_state(store)?;
    if !state.tasks.iter().any(|task| task.id == task_id) {
        return Err(AppError::invalid_input("task not found"));
    }
    Ok(state.reminders_for(task_id))
}

fn rebuild_reminders_with_paths(
    store: &Path,
    timers: &Path,
) -> Result<RecoveryOutcome, AppError> {
    let task_store = JsonTaskStore::at(store);
    let dispatcher = FileDispatcher::at(timers);
    let scheduler = Scheduler::new(&dispatcher);
    rebuild_all(&task_store, &scheduler)
}

fn reschedule_task(timers: &Path, task: &Task, reminders: &[Reminder]) -> Result<(), AppError> {
    let dispatcher = FileDispatcher::at(timers);
    Scheduler::new(&dispatcher).reschedule(task, reminders)
}
