//! Task model definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::id::RecordId;
use crate::Result;

pub type TaskId = RecordId;

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported priority '{}'",
                value
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A personal task
///
/// `completed` and `deleted` are independent; a deleted task is retained with
/// `deleted = true` rather than removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    /// `None` means no due date; such a task is never overdue
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub deleted: bool,
}

impl Task {
    /// Create a new task with the given id and title
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            due_date: None,
            completed: false,
            deleted: false,
        }
    }

    /// Build a task from a validated create payload
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            priority: new.priority,
            due_date: new.due_date,
            completed: new.completed,
            deleted: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Whether the task was due before `today` and is still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.deleted && !self.completed && self.due_date.is_some_and(|due| due < today)
    }

    /// Label shown for the due date; tasks without one read as "Today"
    pub fn due_label(&self) -> String {
        match self.due_date {
            Some(date) => date.format("%a %b %d %Y").to_string(),
            None => "Today".to_string(),
        }
    }
}

/// Task as the remote service sends it
///
/// Older records carry a `status` string instead of `completed`, and dates
/// arrive in several formats. An unknown priority or an unreadable due date
/// only drops that field, never the whole record.
#[derive(Debug, Deserialize)]
struct TaskRecord {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_priority")]
    priority: Option<TaskPriority>,
    #[serde(default, alias = "dueDate", deserialize_with = "deserialize_due_date")]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    deleted: Option<bool>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let completed = record.completed.unwrap_or_else(|| {
            record
                .status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case("completed"))
        });
        Self {
            id: record.id,
            title: record.title,
            description: record.description.unwrap_or_default(),
            priority: record.priority.unwrap_or_default(),
            due_date: record.due_date,
            completed,
            deleted: record.deleted.unwrap_or(false),
        }
    }
}

fn deserialize_priority<'de, D>(deserializer: D) -> std::result::Result<Option<TaskPriority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(value)) => match value.parse() {
            Ok(priority) => Ok(Some(priority)),
            Err(e) => {
                warn!("Using default priority for task record: {}", e);
                Ok(None)
            }
        },
        Some(other) => {
            warn!("Using default priority for task record: unexpected value {}", other);
            Ok(None)
        }
    }
}

fn deserialize_due_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(value)) => match parse_due_date(&value) {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                warn!("Dropping due date of task record: {}", e);
                Ok(None)
            }
        },
        Some(other) => {
            warn!("Dropping due date of task record: unexpected value {}", other);
            Ok(None)
        }
    }
}

/// Parse a due date given as `YYYY-MM-DD`, an ISO 8601 date-time, or an
/// RFC 2822 date-time
pub fn parse_due_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc2822(value) {
        return Ok(datetime.date_naive());
    }
    Err(Error::InvalidInput(format!(
        "Invalid due date '{}'. Use YYYY-MM-DD or ISO 8601.",
        value
    )))
}

/// Payload for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Create the task already completed
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Trim text fields and require a title
    pub fn validate(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        if self.title.is_empty() {
            return Err(Error::validation("Title is required"));
        }
        Ok(self)
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// `Some(None)` clears the due date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }

    /// Trim text fields and reject a blank title
    pub fn validate(mut self) -> Result<Self> {
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(Error::validation("Title is required"));
            }
            self.title = Some(title);
        }
        self.description = self.description.map(|d| d.trim().to_string());
        Ok(self)
    }

    /// Full next state of `task` with this patch merged on top
    pub fn apply(&self, task: &Task) -> Task {
        let mut next = task.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            next.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            next.completed = completed;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_create_task() {
        let task = Task::new("t-1", "Test task");
        assert_eq!(task.title, "Test task");
        assert_eq!(task.priority, TaskPriority::Low);
        assert!(task.description.is_empty());
        assert!(task.due_date.is_none());
        assert!(!task.completed);
        assert!(!task.deleted);
    }

    #[test]
    fn test_task_with_priority() {
        let task = Task::new("t-1", "Test task").with_priority(TaskPriority::High);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!("High".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert_eq!(
            serde_json::from_str::<TaskPriority>("\"MEDIUM\"").unwrap(),
            TaskPriority::Medium
        );
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_deserialize_server_record() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 12,
            "user_id": 3,
            "title": "Team Meeting",
            "description": null,
            "status": "completed",
            "priority": "medium",
            "due_date": "Mon, 01 Sep 2025 00:00:00 GMT",
            "created_at": "Sun, 31 Aug 2025 10:00:00 GMT"
        }))
        .unwrap();

        assert_eq!(task.id, TaskId::Number(12));
        assert_eq!(task.description, "");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.due_date, Some(date(2025, 9, 1)));
        assert!(task.completed);
        assert!(!task.deleted);
    }

    #[test]
    fn test_explicit_completed_wins_over_status() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "a",
            "title": "x",
            "status": "completed",
            "completed": false,
            "dueDate": "2025-09-10T12:30"
        }))
        .unwrap();
        assert!(!task.completed);
        assert_eq!(task.due_date, Some(date(2025, 9, 10)));
    }

    #[test]
    fn test_unreadable_fields_fall_back() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "x",
            "priority": "urgent",
            "due_date": "next tuesday"
        }))
        .unwrap();
        assert_eq!(task.priority, TaskPriority::default());
        assert!(task.due_date.is_none());

        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 2,
            "title": "y",
            "priority": 3,
            "due_date": 20250901
        }))
        .unwrap();
        assert_eq!(task.priority, TaskPriority::default());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_listing_with_one_odd_record_loads() {
        let tasks: Vec<Task> = serde_json::from_value(serde_json::json!([
            {"id": 1, "title": "One", "priority": "high"},
            {"id": 2, "title": "Two", "priority": "urgent"}
        ]))
        .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, TaskPriority::High);
        assert_eq!(tasks[1].priority, TaskPriority::Low);
    }

    #[test]
    fn test_serialized_task_reads_back() {
        let task = Task::new("t-1", "Write report")
            .with_description("draft")
            .with_due_date(date(2025, 9, 1));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["due_date"], "2025-09-01");
        assert_eq!(serde_json::from_value::<Task>(json).unwrap(), task);
    }

    #[test]
    fn test_new_task_validation_trims_title() {
        let new = NewTask::new("  Write report ").validate().unwrap();
        assert_eq!(new.title, "Write report");

        match NewTask::new("   ").validate() {
            Err(Error::Validation(msg)) => assert_eq!(msg, "Title is required"),
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_patch_apply_merges_set_fields() {
        let task = Task::new("t-1", "Old")
            .with_description("keep me")
            .with_due_date(date(2025, 9, 1));
        let patch = TaskPatch::new().title("New").due_date(None).completed(true);

        let next = patch.apply(&task);
        assert_eq!(next.title, "New");
        assert_eq!(next.description, "keep me");
        assert!(next.due_date.is_none());
        assert!(next.completed);
        assert_eq!(next.id, task.id);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let json = serde_json::to_value(TaskPatch::new().priority(TaskPriority::High).due_date(None))
            .unwrap();
        assert_eq!(json, serde_json::json!({"priority": "high", "due_date": null}));
    }

    #[test]
    fn test_overdue_and_due_label() {
        let task = Task::new("t-1", "x").with_due_date(date(2025, 9, 1));
        assert!(task.is_overdue(date(2025, 9, 10)));
        assert!(!task.is_overdue(date(2025, 9, 1)));
        assert_eq!(task.due_label(), "Mon Sep 01 2025");
        assert_eq!(Task::new("t-2", "y").due_label(), "Today");
    }
}
