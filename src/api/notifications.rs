use serde_json::Value;
use studio_common::Notification;

use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub struct NotificationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> NotificationsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        self.client.get_list("notifications/", &[]).await
    }

    /// Server-side unread count (`{"count": n}`).
    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let value = self.client.get_value("notifications/unread_count/", &[]).await?;
        value
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ApiError::Decode(format!("missing unread count in {}", value)))
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("notifications/{}/mark_as_read/", id))
            .await
    }

    pub async fn mark_all_as_read(&self) -> Result<Value, ApiError> {
        self.client
            .post_empty("notifications/mark_all_as_read/")
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("notifications/{}/", id)).await
    }
}
