use clap::Parser;
use tabled::{Table, Tabled, settings::Style};
use taskpad_cli::cli::{Cli, Command, ListCommand, RemindCommand};
use taskpad_core::dispatch::DrainOutcome;
use taskpad_core::error::AppError;
use taskpad_core::model::{Reminder, Task};
use taskpad_core::schedule::RecoveryOutcome;
use taskpad_core::task_api::{self, TaskFilter};
use tracing_subscriber::EnvFilter;

#[derive(Tabled)]
struct TaskRow {
    id: i64,
    title: String,
    status: &'static str,
    created_at: String,
}

fn status_label(task: &Task) -> &'static str {
    if task.is_completed { "completed" } else { "pending" }
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id,
            title: task.title.clone(),
            status: status_label(task),
            created_at: task.created_at.clone(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks.iter().map(task_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "status": status_label(task),
        "created_at": task.created_at,
    })
}

fn reminder_json(reminder: &Reminder) -> serde_json::Value {
    serde_json::json!({
        "id": reminder.id,
        "task_id": reminder.task_id,
        "date": reminder.date,
        "time": reminder.time,
    })
}

fn print_reminders_plain(reminders: &[Reminder]) {
    if reminders.is_empty() {
        println!("No reminders.");
        return;
    }
    for reminder in reminders {
        println!(
            "{} | task {} | {} {}",
            reminder.id, reminder.task_id, reminder.date, reminder.time
        );
    }
}

fn print_drain_outcome(outcome: &DrainOutcome, json: bool) {
    if json {
        let fired: Vec<serde_json::Value> = outcome
            .fired
            .iter()
            .map(|timer| {
                serde_json::json!({
                    "task_id": timer.payload.task_id,
                    "title": timer.payload.title,
                    "message": timer.payload.message,
                })
            })
            .collect();
        let failures: Vec<serde_json::Value> = outcome
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "task_id": failure.task_id,
                    "error": failure.error.to_string(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({ "fired": fired, "failures": failures })
        );
        return;
    }

    if outcome.fired.is_empty() && outcome.failures.is_empty() {
        println!("No timers due.");
        return;
    }
    for timer in &outcome.fired {
        println!("Notified: {}", timer.payload.message);
    }
    for failure in &outcome.failures {
        println!("Failed to notify task {}: {}", failure.task_id, failure.error);
    }
}

fn print_recovery_outcome(outcome: &RecoveryOutcome, json: bool) {
    if json {
        let failures: Vec<serde_json::Value> = outcome
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "task_id": failure.task_id,
                    "error": failure.error.to_string(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({ "restored": outcome.restored, "failures": failures })
        );
        return;
    }

    println!(
        "Restored reminders for {} task(s), {} failure(s)",
        outcome.restored.len(),
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        println!("  task {}: {}", failure.task_id, failure.error);
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add { title } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };

            let task = task_api::add_task(&title)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit { id, new_title } => {
            let task = task_api::edit_task(id, &new_title)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(id)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Done { id } => {
            let task = task_api::complete_task(id)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Completed task: {} ({})", task.title, task.id);
            }
        }
        Command::Reopen { id } => {
            let task = task_api::reopen_task(id)?;
            if cli.json {
                println!("{}", task_json(&task));
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = task_api::get_task_by_id(id)?;
            let reminders = task_api::list_reminders(id)?;
            if cli.json {
                let mut value = task_json(&task);
                value["reminders"] =
                    serde_json::Value::Array(reminders.iter().map(reminder_json).collect());
                println!("{value}");
            } else {
                println!(
                    "{} | {} | {} | {}",
                    task.id,
                    task.title,
                    status_label(&task),
                    task.created_at
                );
                print_reminders_plain(&reminders);
            }
        }
        Command::List { list } => {
            let filter = match list {
                ListCommand::Pending => TaskFilter::Pending,
                ListCommand::Completed => TaskFilter::Completed,
                ListCommand::All => TaskFilter::All,
            };
            let tasks = task_api::list_tasks(filter)?;
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_plain(&tasks);
            }
        }
        Command::Remind { remind } => match remind {
            RemindCommand::Add {
                task_id,
                date,
                time,
            } => {
                let reminder = task_api::add_reminder(task_id, &date, &time)?;
                if cli.json {
                    println!("{}", reminder_json(&reminder));
                } else {
                    println!(
                        "Added reminder {} for task {} at {} {}",
                        reminder.id, reminder.task_id, reminder.date, reminder.time
                    );
                }
            }
            RemindCommand::Remove { reminder_id } => {
                let reminder = task_api::remove_reminder(reminder_id)?;
                if cli.json {
                    println!("{}", reminder_json(&reminder));
                } else {
                    println!(
                        "Removed reminder {} from task {}",
                        reminder.id, reminder.task_id
                    );
                }
            }
            RemindCommand::List { task_id } => {
                let reminders = task_api::list_reminders(task_id)?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::Value::Array(reminders.iter().map(reminder_json).collect())
                    );
                } else {
                    print_reminders_plain(&reminders);
                }
            }
        },
        Command::Due => {
            let outcome = task_api::fire_due_timers()?;
            print_drain_outcome(&outcome, cli.json);
        }
        Command::Rebuild => {
            let outcome = task_api::rebuild_reminders()?;
            print_recovery_outcome(&outcome, cli.json);
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap handles --help and --version through the error path.
            if err.use_stderr() {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                std::process::exit(1);
            }
            err.print().ok();
            return;
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
