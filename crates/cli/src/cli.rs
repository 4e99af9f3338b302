//! Command-line definitions

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use taskflux_core::task::{parse_due_date, TaskId, TaskPriority};
use taskflux_core::view::TaskFilter;

#[derive(Parser, Debug)]
#[command(name = "taskflux", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    ///
    /// Example: taskflux register "Ada" ada@example.com secret1
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Sign in and store the session
    ///
    /// Example: taskflux login ada@example.com secret1
    Login { email: String, password: String },
    /// Forget the stored session
    Logout,
    /// Show the cached user and token expiry
    Whoami,
    /// Fetch the profile from the service
    Profile,
    /// Change name and email
    ///
    /// Example: taskflux profile-update "Ada L" ada@example.com
    ProfileUpdate { name: String, email: String },
    /// Ask the service whether the stored token is still valid
    Verify,
    /// List tasks
    ///
    /// Example: taskflux list --filter overdue
    /// Example: taskflux list --status pending --priority high
    List {
        #[arg(long, default_value_t = TaskFilter::All)]
        filter: TaskFilter,
        /// Status passed to the service
        #[arg(long)]
        status: Option<String>,
        /// Priority passed to the service
        #[arg(long)]
        priority: Option<TaskPriority>,
    },
    /// Add a task
    ///
    /// Example: taskflux add "Write report" --priority high --due 2025-09-01
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = TaskPriority::Low)]
        priority: TaskPriority,
        #[arg(long, value_parser = parse_due)]
        due: Option<NaiveDate>,
        #[arg(long)]
        completed: bool,
    },
    /// Edit fields of a task
    ///
    /// Example: taskflux edit 3 --title "Write final report" --clear-due
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task between open and completed
    Toggle { id: TaskId },
    /// Move a task to the deleted view
    Delete { id: TaskId },
    /// Show completion statistics
    Stats,
}

fn parse_due(value: &str) -> Result<NaiveDate, String> {
    parse_due_date(value).map_err(|e| e.to_string())
}
