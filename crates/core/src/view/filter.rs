//! Task filters

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::Task;

/// Which slice of the collection to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
    Overdue,
    Deleted,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 5] = [
        Self::All,
        Self::Completed,
        Self::Pending,
        Self::Overdue,
        Self::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Deleted => "deleted",
        }
    }

    /// Whether `task` belongs in this slice at `now`
    ///
    /// "Today" is the calendar day of `now` in its own time zone, so pass a
    /// `Local` time to judge overdue tasks by the user's day.
    pub fn matches<Tz: TimeZone>(self, task: &Task, now: &DateTime<Tz>) -> bool {
        match self {
            Self::All => !task.deleted,
            Self::Completed => !task.deleted && task.completed,
            Self::Pending => !task.deleted && !task.completed,
            Self::Overdue => task.is_overdue(now.date_naive()),
            Self::Deleted => task.deleted,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == normalized)
            .ok_or_else(|| Error::InvalidFilter(value.to_string()))
    }
}

/// Tasks in `tasks` that belong to `filter`, in their original order
pub fn filter_tasks<Tz: TimeZone>(
    tasks: &[Task],
    filter: TaskFilter,
    now: DateTime<Tz>,
) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task, &now))
        .cloned()
        .collect()
}
