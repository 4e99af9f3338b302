//! Task backend trait
//!
//! The remote half of each task-store mutation. The store calls the backend
//! first and only touches its collection when the call succeeds.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskId, TaskPatch, TaskPriority};
use crate::api::ApiClient;
use crate::error::Error;
use crate::Result;

/// Server-side filters for listing tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<TaskPriority>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Backend interface for task mutations
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Persist a validated new task and return it with its assigned id
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Persist a partial update of an existing task
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<()>;

    /// Mark a task deleted
    async fn delete(&self, id: &TaskId) -> Result<()>;

    /// Full listing, or `None` when the backend keeps no tasks of its own
    async fn list(&self, query: &TaskQuery) -> Result<Option<Vec<Task>>>;
}

/// Backend for a purely in-memory store; ids are client-generated UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTaskBackend;

#[async_trait]
impl TaskBackend for LocalTaskBackend {
    async fn create(&self, task: NewTask) -> Result<Task> {
        Ok(Task::from_new(TaskId::generate(), task))
    }

    async fn update(&self, _id: &TaskId, _patch: &TaskPatch) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _id: &TaskId) -> Result<()> {
        Ok(())
    }

    async fn list(&self, _query: &TaskQuery) -> Result<Option<Vec<Task>>> {
        Ok(None)
    }
}

/// Backend that round-trips every mutation through the remote service
#[derive(Clone)]
pub struct RemoteTaskBackend {
    client: ApiClient,
}

impl RemoteTaskBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskBackend for RemoteTaskBackend {
    async fn create(&self, task: NewTask) -> Result<Task> {
        self.client.create_task(&task).await?.ok_or_else(|| {
            Error::InvalidInput(format!(
                "Server did not return the created task '{}'",
                task.title
            ))
        })
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<()> {
        self.client.update_task(id, patch).await?;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        self.client.delete_task(id).await?;
        Ok(())
    }

    async fn list(&self, query: &TaskQuery) -> Result<Option<Vec<Task>>> {
        Ok(Some(self.client.list_tasks(query).await?))
    }
}
