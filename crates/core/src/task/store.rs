//! In-memory task store
//!
//! Holds the authoritative, newest-first task collection for the session.
//! Mutations go through the [`TaskBackend`] first and are committed locally
//! only when it succeeds, so a failure never leaves partial state behind.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::backend::{LocalTaskBackend, RemoteTaskBackend, TaskBackend, TaskQuery};
use super::model::{NewTask, Task, TaskId, TaskPatch};
use crate::api::ApiClient;
use crate::error::Error;
use crate::Result;

#[derive(Debug, Default)]
struct TaskState {
    /// Newest first
    tasks: Vec<Task>,
    /// Bumped by every commit and every refresh start
    version: u64,
}

impl TaskState {
    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }
}

/// Cheap-to-clone handle to the session's task collection
#[derive(Clone)]
pub struct TaskStore {
    state: Arc<RwLock<TaskState>>,
    backend: Arc<dyn TaskBackend>,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TaskState::default())),
            backend,
        }
    }

    /// Store with no remote service behind it
    pub fn local() -> Self {
        Self::new(Arc::new(LocalTaskBackend))
    }

    /// Store whose mutations round-trip through the API first
    pub fn remote(client: ApiClient) -> Self {
        Self::new(Arc::new(RemoteTaskBackend::new(client)))
    }

    /// Create a task and put it at the front of the collection
    pub async fn create(&self, new: NewTask) -> Result<Task> {
        let new = new.validate()?;
        let mut task = self.backend.create(new).await?;
        task.deleted = false;

        let mut state = self.state.write().await;
        if state.position(&task.id).is_some() {
            return Err(Error::InvalidInput(format!(
                "Task with ID {} already exists",
                task.id
            )));
        }
        state.tasks.insert(0, task.clone());
        state.version += 1;
        info!("Created task {} '{}'", task.id, task.title);
        Ok(task)
    }

    /// Get a task by ID
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        let state = self.state.read().await;
        state.position(id).map(|index| state.tasks[index].clone())
    }

    /// Snapshot of every task, deleted ones included, newest first
    pub async fn list(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.tasks.is_empty()
    }

    /// Merge `patch` onto a task
    ///
    /// Unknown ids are a silent no-op returning `Ok(None)`.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Option<Task>> {
        let patch = patch.validate()?;
        let Some(current) = self.get(id).await else {
            debug!("Ignoring update of unknown task {}", id);
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(current));
        }

        self.backend.update(id, &patch).await?;
        Ok(self.commit(id, |task| patch.apply(task)).await)
    }

    /// Flip `completed`; unknown ids are a no-op
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<Option<Task>> {
        let Some(current) = self.get(id).await else {
            debug!("Ignoring toggle of unknown task {}", id);
            return Ok(None);
        };

        let patch = TaskPatch::new().completed(!current.completed);
        self.backend.update(id, &patch).await?;
        Ok(self.commit(id, |task| patch.apply(task)).await)
    }

    /// Mark a task deleted; the entry stays in the collection
    pub async fn soft_delete(&self, id: &TaskId) -> Result<Option<Task>> {
        let Some(current) = self.get(id).await else {
            debug!("Ignoring delete of unknown task {}", id);
            return Ok(None);
        };
        if current.deleted {
            return Ok(Some(current));
        }

        self.backend.delete(id).await?;
        Ok(self
            .commit(id, |task| Task {
                deleted: true,
                ..task.clone()
            })
            .await)
    }

    /// Replace the collection with the backend's listing
    ///
    /// Returns `false` when the backend keeps no tasks, or when another
    /// refresh or mutation committed while this listing was in flight (the
    /// stale listing is dropped). Soft-deleted tasks missing from the
    /// listing are kept.
    pub async fn refresh(&self, query: &TaskQuery) -> Result<bool> {
        let started_at = {
            let mut state = self.state.write().await;
            state.version += 1;
            state.version
        };

        let Some(listing) = self.backend.list(query).await? else {
            return Ok(false);
        };

        let mut state = self.state.write().await;
        if state.version != started_at {
            debug!("Discarding superseded task listing");
            return Ok(false);
        }

        let mut seen = HashSet::new();
        let mut tasks: Vec<Task> = listing
            .into_iter()
            .filter(|task| seen.insert(task.id.clone()))
            .collect();
        tasks.extend(
            state
                .tasks
                .iter()
                .filter(|task| task.deleted && !seen.contains(&task.id))
                .cloned(),
        );

        info!("Loaded {} tasks", tasks.len());
        state.tasks = tasks;
        state.version += 1;
        Ok(true)
    }

    /// Drop soft-deleted tasks for good, returning how many were removed
    pub async fn purge_deleted(&self) -> usize {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|task| !task.deleted);
        let removed = before - state.tasks.len();
        if removed > 0 {
            state.version += 1;
            info!("Purged {} deleted tasks", removed);
        }
        removed
    }

    /// Replace one task with the next state computed from its current value
    async fn commit(&self, id: &TaskId, next: impl FnOnce(&Task) -> Task) -> Option<Task> {
        let mut state = self.state.write().await;
        let index = state.position(id)?;
        let task = next(&state.tasks[index]);
        state.tasks[index] = task.clone();
        state.version += 1;
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::{oneshot, Mutex};

    async fn store_with(titles: &[&str]) -> TaskStore {
        let store = TaskStore::local();
        for title in titles {
            store.create(NewTask::new(*title)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_task() {
        let store = TaskStore::local();

        let created = store
            .create(NewTask::new("Write report").with_priority(TaskPriority::High))
            .await
            .unwrap();

        assert_eq!(created.title, "Write report");
        assert_eq!(created.priority, TaskPriority::High);
        assert!(!created.completed);
        assert!(!created.deleted);
        assert_eq!(store.get(&created.id).await, Some(created));
    }

    #[tokio::test]
    async fn test_create_can_start_completed() {
        let store = TaskStore::local();
        let created = store
            .create(NewTask::new("Done already").with_completed(true))
            .await
            .unwrap();
        assert!(created.completed);
        assert!(!created.deleted);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let store = TaskStore::local();
        let result = store.create(NewTask::new("   ")).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_unique_ids() {
        let store = store_with(&["Task 1", "Task 2", "Task 3"]).await;

        let tasks = store.list().await;
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Task 3", "Task 2", "Task 1"]);

        let ids: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_update_task() {
        let store = store_with(&["Original title"]).await;
        let id = store.list().await[0].id.clone();

        let updated = store
            .update(&id, TaskPatch::new().title("Updated title").description("more"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Updated title");
        assert_eq!(updated.description, "more");
        assert_eq!(store.get(&id).await.unwrap().title, "Updated title");
    }

    #[tokio::test]
    async fn test_update_nonexistent_task_is_noop() {
        let store = store_with(&["Task 1", "Task 2"]).await;
        let before = store.list().await;

        let result = store
            .update(&TaskId::generate(), TaskPatch::new().title("Ghost"))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let store = store_with(&["Task"]).await;
        let id = store.list().await[0].id.clone();

        let result = store.update(&id, TaskPatch::new().title(" ")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.get(&id).await.unwrap().title, "Task");
    }

    #[tokio::test]
    async fn test_toggle_is_its_own_inverse() {
        let store = store_with(&["Task"]).await;
        let id = store.list().await[0].id.clone();

        let once = store.toggle_complete(&id).await.unwrap().unwrap();
        assert!(once.completed);
        let twice = store.toggle_complete(&id).await.unwrap().unwrap();
        assert!(!twice.completed);

        assert!(store.toggle_complete(&TaskId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_entry() {
        let store = store_with(&["Task to delete"]).await;
        let id = store.list().await[0].id.clone();
        store.toggle_complete(&id).await.unwrap();

        let deleted = store.soft_delete(&id).await.unwrap().unwrap();
        assert!(deleted.deleted);
        assert!(deleted.completed);
        assert_eq!(store.len().await, 1);

        // Deleting again changes nothing
        assert_eq!(store.soft_delete(&id).await.unwrap(), Some(deleted));
        assert!(store.soft_delete(&TaskId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_deleted() {
        let store = store_with(&["Keep", "Drop"]).await;
        let drop_id = store.list().await[0].id.clone();
        store.soft_delete(&drop_id).await.unwrap();

        assert_eq!(store.purge_deleted().await, 1);
        let tasks = store.list().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Keep");
        assert_eq!(store.purge_deleted().await, 0);
    }

    #[tokio::test]
    async fn test_local_refresh_keeps_collection() {
        let store = store_with(&["Task"]).await;
        assert!(!store.refresh(&TaskQuery::new()).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    /// Backend whose listings are scripted and whose mutations can be made to fail
    #[derive(Default)]
    struct ScriptedBackend {
        listings: Mutex<VecDeque<(Option<oneshot::Receiver<()>>, Vec<Task>)>>,
        fail_mutations: bool,
    }

    impl ScriptedBackend {
        async fn remaining_listings(&self) -> usize {
            self.listings.lock().await.len()
        }

        fn rejection() -> Error {
            Error::Request {
                status: 500,
                message: "boom".into(),
            }
        }
    }

    #[async_trait]
    impl TaskBackend for ScriptedBackend {
        async fn create(&self, task: NewTask) -> Result<Task> {
            if self.fail_mutations {
                return Err(Self::rejection());
            }
            Ok(Task::from_new(TaskId::generate(), task))
        }

        async fn update(&self, _id: &TaskId, _patch: &TaskPatch) -> Result<()> {
            if self.fail_mutations {
                return Err(Self::rejection());
            }
            Ok(())
        }

        async fn delete(&self, _id: &TaskId) -> Result<()> {
            if self.fail_mutations {
                return Err(Self::rejection());
            }
            Ok(())
        }

        async fn list(&self, _query: &TaskQuery) -> Result<Option<Vec<Task>>> {
            let next = self.listings.lock().await.pop_front();
            let (gate, tasks) = next.expect("unexpected listing request");
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(Some(tasks))
        }
    }

    #[tokio::test]
    async fn test_failed_backend_leaves_state_unchanged() {
        let backend = ScriptedBackend {
            listings: Mutex::new(VecDeque::from([(None, vec![Task::new(1i64, "Server task")])])),
            fail_mutations: true,
        };
        let store = TaskStore::new(Arc::new(backend));
        store.refresh(&TaskQuery::new()).await.unwrap();
        let before = store.list().await;
        let id = TaskId::Number(1);

        let err = store.create(NewTask::new("New")).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(store.toggle_complete(&id).await.is_err());
        assert!(store.soft_delete(&id).await.is_err());
        assert!(store.update(&id, TaskPatch::new().title("x")).await.is_err());

        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_refresh_keeps_local_soft_deletes_and_dedupes() {
        let backend = ScriptedBackend {
            listings: Mutex::new(VecDeque::from([
                (None, vec![Task::new(1i64, "One"), Task::new(2i64, "Two")]),
                (None, vec![Task::new(1i64, "One"), Task::new(1i64, "One again")]),
            ])),
            fail_mutations: false,
        };
        let store = TaskStore::new(Arc::new(backend));
        store.refresh(&TaskQuery::new()).await.unwrap();
        store.soft_delete(&TaskId::Number(2)).await.unwrap();

        assert!(store.refresh(&TaskQuery::new()).await.unwrap());
        let tasks = store.list().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "One");
        assert_eq!(tasks[1].id, TaskId::Number(2));
        assert!(tasks[1].deleted);
    }

    #[tokio::test]
    async fn test_superseded_refresh_is_discarded() {
        let (release_slow, slow_gate) = oneshot::channel();
        let backend = Arc::new(ScriptedBackend {
            listings: Mutex::new(VecDeque::from([
                (Some(slow_gate), vec![Task::new(1i64, "Stale")]),
                (None, vec![Task::new(2i64, "Fresh")]),
            ])),
            fail_mutations: false,
        });
        let store = TaskStore::new(backend.clone());

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh(&TaskQuery::new()).await })
        };
        while backend.remaining_listings().await != 1 {
            tokio::task::yield_now().await;
        }

        assert!(store.refresh(&TaskQuery::new()).await.unwrap());
        release_slow.send(()).unwrap();
        assert!(!slow.await.unwrap().unwrap());

        let tasks = store.list().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Fresh");
    }
}
