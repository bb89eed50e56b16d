use serde_json::Value;
use studio_common::{Project, ProjectMember, ProjectStats, Task};

use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub struct ProjectsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        self.client.get_list("projects/", &[]).await
    }

    /// Project counts by status, scoped by the server to what the caller
    /// may see.
    pub async fn dashboard_stats(&self) -> Result<ProjectStats, ApiError> {
        self.client.get_json("projects/dashboard_stats/").await
    }

    pub async fn archived(&self) -> Result<Vec<Project>, ApiError> {
        self.client.get_list("projects/archived/", &[]).await
    }

    pub async fn get(&self, id: i64) -> Result<Project, ApiError> {
        self.client.get_json(&format!("projects/{}/", id)).await
    }

    pub async fn create(&self, project: &Value) -> Result<Project, ApiError> {
        let value = self.client.post("projects/", project).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update(&self, id: i64, project: &Value) -> Result<Project, ApiError> {
        let value = self.client.put(&format!("projects/{}/", id), project).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("projects/{}/", id)).await
    }

    pub async fn archive(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("projects/{}/archive/", id))
            .await
    }

    pub async fn restore(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("projects/{}/restore/", id))
            .await
    }

    pub async fn tasks(&self, id: i64) -> Result<Vec<Task>, ApiError> {
        self.client
            .get_list(&format!("projects/{}/tasks/", id), &[])
            .await
    }

    pub async fn members(&self, id: i64) -> Result<Vec<ProjectMember>, ApiError> {
        self.client
            .get_list(&format!("projects/{}/members/", id), &[])
            .await
    }

    pub async fn add_member(&self, id: i64, employee_id: i64, role: &str) -> Result<Value, ApiError> {
        self.client
            .post(
                &format!("projects/{}/add_member/", id),
                &serde_json::json!({ "employee_id": employee_id, "role": role }),
            )
            .await
    }

    pub async fn change_status(&self, id: i64, status: &str) -> Result<Value, ApiError> {
        self.client
            .post(
                &format!("projects/{}/change_status/", id),
                &serde_json::json!({ "status": status }),
            )
            .await
    }
}
