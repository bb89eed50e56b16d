use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use studio_common::ProjectFile;

use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub struct FilesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> FilesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ProjectFile>, ApiError> {
        self.client.get_list("files/", &[]).await
    }

    /// Upload a local file, optionally attached to a project.
    pub async fn upload(&self, path: &Path, project: Option<i64>) -> Result<ProjectFile, ApiError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidInput(format!("not a file: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!(file = %name, size = bytes.len(), "uploading file");

        let value = self
            .client
            .post_multipart("files/upload/", || {
                let mut form = Form::new()
                    .part("file", Part::bytes(bytes.clone()).file_name(name.clone()))
                    .text("name", name.clone());
                if let Some(project) = project {
                    form = form.text("project", project.to_string());
                }
                form
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Download a file into `dest`. A directory destination gets the
    /// server-supplied filename, or `file-<id>` when there is none.
    pub async fn download(&self, id: i64, dest: &Path) -> Result<PathBuf, ApiError> {
        let (bytes, filename) = self
            .client
            .get_bytes(&format!("files/{}/download/", id))
            .await?;
        let target = download_target(dest, filename, || format!("file-{}", id));
        tokio::fs::write(&target, bytes).await?;
        Ok(target)
    }
}

/// Resolve where a downloaded body lands.
pub(crate) fn download_target(
    dest: &Path,
    filename: Option<String>,
    fallback: impl FnOnce() -> String,
) -> PathBuf {
    if dest.is_dir() {
        let name = filename
            .as_deref()
            .and_then(|n| Path::new(n).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(fallback);
        dest.join(name)
    } else {
        dest.to_path_buf()
    }
}
