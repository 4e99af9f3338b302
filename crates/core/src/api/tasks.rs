//! Task endpoints

use serde::Serialize;
use serde_json::Value;

use super::client::{take_field, ApiClient, RequestOptions};
use crate::task::{NewTask, Task, TaskId, TaskPatch, TaskQuery};
use crate::Result;

fn task_path(id: &TaskId) -> String {
    format!("/tasks/{}", urlencoding::encode(&id.to_string()))
}

fn list_path(query: &TaskQuery) -> String {
    let mut params = Vec::new();
    if let Some(status) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        params.push(format!("status={}", urlencoding::encode(status)));
    }
    if let Some(priority) = query.priority {
        params.push(format!("priority={}", priority.as_str()));
    }

    if params.is_empty() {
        "/tasks".to_string()
    } else {
        format!("/tasks?{}", params.join("&"))
    }
}

/// Serialize a task body, adding the `status` string the service filters on
fn task_body(payload: &impl Serialize, completed: Option<bool>) -> Result<Value> {
    let mut body = serde_json::to_value(payload)?;
    if let (Some(completed), Value::Object(map)) = (completed, &mut body) {
        let status = if completed { "completed" } else { "pending" };
        map.insert("status".to_string(), Value::String(status.to_string()));
    }
    Ok(body)
}

impl ApiClient {
    /// `GET /tasks?status=&priority=`
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let data = self
            .request(&list_path(query), RequestOptions::get().authenticated())
            .await?;
        Ok(take_field(data, "tasks")?.unwrap_or_default())
    }

    /// `POST /tasks`
    pub async fn create_task(&self, task: &NewTask) -> Result<Option<Task>> {
        let body = task_body(task, Some(task.completed))?;
        let data = self
            .request("/tasks", RequestOptions::post(Some(body)).authenticated())
            .await?;
        take_field(data, "task")
    }

    /// `PUT /tasks/:id`
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let body = task_body(patch, patch.completed)?;
        let data = self
            .request(&task_path(id), RequestOptions::put(body).authenticated())
            .await?;
        take_field(data, "task")
    }

    /// `DELETE /tasks/:id`; returns the service's `deleted` field
    pub async fn delete_task(&self, id: &TaskId) -> Result<Option<Value>> {
        let data = self
            .request(&task_path(id), RequestOptions::delete().authenticated())
            .await?;
        take_field(data, "deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use crate::task::TaskPriority;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig::default().with_base_url(server.uri()).unwrap();
        ApiClient::new(&config, SessionStore::in_memory()).unwrap()
    }

    #[test]
    fn test_list_path() {
        assert_eq!(list_path(&TaskQuery::new()), "/tasks");
        assert_eq!(
            list_path(&TaskQuery::new().with_status("in progress").with_priority(TaskPriority::High)),
            "/tasks?status=in%20progress&priority=high"
        );
        assert_eq!(list_path(&TaskQuery::new().with_status(" ")), "/tasks");
    }

    #[tokio::test]
    async fn test_list_tasks_with_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("status", "pending"))
            .and(query_param("priority", "high"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "tasks": [
                    {"id": 2, "title": "Team Meeting", "priority": "high", "status": "pending"},
                    {"id": 1, "title": "Complete React Project", "priority": "high", "status": "pending"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let tasks = client
            .list_tasks(&TaskQuery::new().with_status("pending").with_priority(TaskPriority::High))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, TaskId::Number(2));
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_list_without_tasks_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.list_tasks(&TaskQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_task_sends_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_json(json!({
                "title": "Write report",
                "description": "",
                "priority": "high",
                "due_date": "2025-09-01",
                "completed": false,
                "status": "pending"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "task": {"id": 5, "title": "Write report", "priority": "high",
                         "status": "pending", "due_date": "2025-09-01"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let new = NewTask::new("Write report")
            .with_priority(TaskPriority::High)
            .with_due_date(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        let task = client.create_task(&new).await.unwrap().unwrap();
        assert_eq!(task.id, TaskId::Number(5));
    }

    #[tokio::test]
    async fn test_update_and_delete_task() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/tasks/5"))
            .and(body_json(json!({"completed": true, "status": "completed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": {"id": 5, "title": "Write report", "status": "completed"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "deleted": 5})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let id = TaskId::Number(5);
        let task = client
            .update_task(&id, &TaskPatch::new().completed(true))
            .await
            .unwrap()
            .unwrap();
        assert!(task.completed);
        assert_eq!(client.delete_task(&id).await.unwrap(), Some(json!(5)));
    }

    #[tokio::test]
    async fn test_delete_unknown_task_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Task not found"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.delete_task(&TaskId::Number(99)).await.unwrap_err();
        assert_eq!(err.to_string(), "Task not found");
        assert_eq!(err.status(), Some(404));
    }
}
