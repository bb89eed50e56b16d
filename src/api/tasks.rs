use serde_json::Value;
use studio_common::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

use crate::errors::ApiError;
use crate::gateway::ApiClient;

const BASE: &str = "projects/project-tasks";

/// Query parameters for the task list.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project: Option<i64>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
    pub search: Option<String>,
}

impl TaskFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(project) = self.project {
            query.push(("project", project.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(assignee) = self.assigned_to {
            query.push(("assigned_to", assignee.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }
}

/// The server-side workflow actions. Each moves a task to one status as a
/// side effect; the status itself is never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    TakeToWork,
    SendToReview,
    Complete,
    ReturnForRevision,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TakeToWork => "take_to_work",
            Self::SendToReview => "send_to_review",
            Self::Complete => "complete",
            Self::ReturnForRevision => "return_for_revision",
        }
    }

    /// Status the task ends up in when the action succeeds.
    pub fn resulting_status(&self) -> TaskStatus {
        match self {
            Self::TakeToWork => TaskStatus::InWork,
            Self::SendToReview => TaskStatus::OnReview,
            Self::Complete => TaskStatus::Completed,
            Self::ReturnForRevision => TaskStatus::InWork,
        }
    }

    /// Action a drop onto `target` stands for. Only three columns accept drops.
    pub fn for_drop_target(target: TaskStatus) -> Option<Self> {
        match target {
            TaskStatus::InWork => Some(Self::TakeToWork),
            TaskStatus::OnReview => Some(Self::SendToReview),
            TaskStatus::Completed => Some(Self::Complete),
            TaskStatus::Created | TaskStatus::Cancelled => None,
        }
    }
}

impl std::fmt::Display for TaskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct TasksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> TasksApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.client
            .get_list(&format!("{}/", BASE), &filter.to_query())
            .await
    }

    /// Tasks assigned to the signed-in user.
    pub async fn mine(&self) -> Result<Vec<Task>, ApiError> {
        self.client
            .get_list(&format!("{}/my_tasks/", BASE), &[])
            .await
    }

    pub async fn overdue(&self) -> Result<Vec<Task>, ApiError> {
        self.client
            .get_list(&format!("{}/overdue/", BASE), &[])
            .await
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        self.client.get_json(&format!("{}/{}/", BASE, id)).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        let value = self.client.post(&format!("{}/", BASE), task).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, ApiError> {
        let value = self
            .client
            .patch(&format!("{}/{}/", BASE, id), patch)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        self.client.delete(&format!("{}/{}/", BASE, id)).await
    }

    /// Run a workflow action. The body is whatever the server answers,
    /// either the updated task or a confirmation object.
    pub async fn action(&self, id: TaskId, action: TaskAction) -> Result<Value, ApiError> {
        tracing::debug!(task_id = id, action = %action, "dispatching task action");
        self.client
            .post_empty(&format!("{}/{}/{}/", BASE, id, action.as_str()))
            .await
    }

    pub async fn take_to_work(&self, id: TaskId) -> Result<Value, ApiError> {
        self.action(id, TaskAction::TakeToWork).await
    }

    pub async fn send_to_review(&self, id: TaskId) -> Result<Value, ApiError> {
        self.action(id, TaskAction::SendToReview).await
    }

    pub async fn complete(&self, id: TaskId) -> Result<Value, ApiError> {
        self.action(id, TaskAction::Complete).await
    }

    pub async fn return_for_revision(&self, id: TaskId) -> Result<Value, ApiError> {
        self.action(id, TaskAction::ReturnForRevision).await
    }

    pub async fn update_progress(&self, id: TaskId, progress: u8) -> Result<Value, ApiError> {
        if progress > 100 {
            return Err(ApiError::InvalidInput(format!(
                "progress must be between 0 and 100, got {}",
                progress
            )));
        }
        self.client
            .post(
                &format!("{}/{}/update_progress/", BASE, id),
                &serde_json::json!({ "progress": progress }),
            )
            .await
    }

    pub async fn change_assignee(&self, id: TaskId, assignee_id: i64) -> Result<Value, ApiError> {
        self.client
            .post(
                &format!("{}/{}/change_assignee/", BASE, id),
                &serde_json::json!({ "assignee_id": assignee_id }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_targets_map_to_three_actions() {
        assert_eq!(
            TaskAction::for_drop_target(TaskStatus::InWork),
            Some(TaskAction::TakeToWork)
        );
        assert_eq!(
            TaskAction::for_drop_target(TaskStatus::OnReview),
            Some(TaskAction::SendToReview)
        );
        assert_eq!(
            TaskAction::for_drop_target(TaskStatus::Completed),
            Some(TaskAction::Complete)
        );
        assert_eq!(TaskAction::for_drop_target(TaskStatus::Created), None);
        assert_eq!(TaskAction::for_drop_target(TaskStatus::Cancelled), None);
    }

    #[test]
    fn test_action_results() {
        for action in [
            TaskAction::TakeToWork,
            TaskAction::SendToReview,
            TaskAction::Complete,
        ] {
            assert_eq!(
                TaskAction::for_drop_target(action.resulting_status()),
                Some(action)
            );
        }
        assert_eq!(
            TaskAction::ReturnForRevision.resulting_status(),
            TaskStatus::InWork
        );
    }

    #[test]
    fn test_filter_query() {
        let filter = TaskFilter {
            project: Some(3),
            status: Some(TaskStatus::OnReview),
            ..Default::default()
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("project", "3".to_string()),
                ("status", "on_review".to_string())
            ]
        );
        assert!(TaskFilter::default().to_query().is_empty());
    }
}
