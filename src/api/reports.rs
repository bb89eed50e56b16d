use std::path::{Path, PathBuf};

use serde_json::Value;
use studio_common::{GeneratedReport, ReportRequest, ReportTemplate};

use crate::api::files::download_target;
use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub struct ReportsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReportsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<GeneratedReport>, ApiError> {
        self.client.get_list("reports/generated/", &[]).await
    }

    pub async fn get(&self, id: i64) -> Result<GeneratedReport, ApiError> {
        self.client
            .get_json(&format!("reports/generated/{}/", id))
            .await
    }

    pub async fn templates(&self) -> Result<Vec<ReportTemplate>, ApiError> {
        self.client.get_list("reports/templates/", &[]).await
    }

    pub async fn generate(&self, request: &ReportRequest) -> Result<GeneratedReport, ApiError> {
        if request.end_date < request.start_date {
            return Err(ApiError::InvalidInput(
                "report end date is before its start date".to_string(),
            ));
        }
        let value = self.client.post("reports/generate/", request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn download(&self, id: i64, dest: &Path) -> Result<PathBuf, ApiError> {
        let (bytes, filename) = self
            .client
            .get_bytes(&format!("reports/generated/{}/download/", id))
            .await?;
        let target = download_target(dest, filename, || format!("report-{}.pdf", id));
        tokio::fs::write(&target, bytes).await?;
        Ok(target)
    }

    pub async fn archive(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("reports/generated/{}/archive/", id))
            .await
    }

    pub async fn restore(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("reports/generated/{}/restore/", id))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("reports/generated/{}/", id))
            .await
    }
}
