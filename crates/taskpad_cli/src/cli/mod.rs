use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskpad add "Pay rent"
    Add {
        title: Option<String>,
    },
    /// Edit a task's title
    ///
    /// Example: taskpad edit 1 "Pay rent by wire"
    Edit {
        id: i64,
        new_title: String,
    },
    /// Delete a task and its reminders
    ///
    /// Example: taskpad delete 1
    Delete {
        id: i64,
    },
    /// Mark a task as completed
    ///
    /// Example: taskpad done 1
    Done {
        id: i64,
    },
    /// Reopen a completed task
    ///
    /// Example: taskpad reopen 1
    Reopen {
        id: i64,
    },
    /// Show details of a task
    ///
    /// Example: taskpad show 1
    Show {
        id: i64,
    },
    /// List tasks
    ///
    /// Example: taskpad list pending
    List {
        #[command(subcommand)]
        list: ListCommand,
    },
    /// Manage a task's reminders
    Remind {
        #[command(subcommand)]
        remind: RemindCommand,
    },
    /// Fire notification timers that have come due
    ///
    /// Example: taskpad due
    Due,
    /// Rebuild notification timers after a restart
    ///
    /// Example: taskpad rebuild
    Rebuild,
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List tasks that are not completed
    Pending,
    /// List completed tasks
    Completed,
    /// List every task
    All,
}

#[derive(Subcommand, Debug)]
pub enum RemindCommand {
    /// Attach a reminder to a task
    ///
    /// Example: taskpad remind add 1 2025-04-01 09:00
    Add {
        task_id: i64,
        date: String,
        time: String,
    },
    /// Remove a reminder
    ///
    /// Example: taskpad remind remove 3
    Remove {
        reminder_id: i64,
    },
    /// List a task's reminders
    ///
    /// Example: taskpad remind list 1
    List {
        task_id: i64,
    },
}
