use serde_json::Value;
use studio_common::Client;

use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub struct ClientsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ClientsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Client>, ApiError> {
        self.client.get_list("auth/clients/", &[]).await
    }

    pub async fn get(&self, id: i64) -> Result<Client, ApiError> {
        self.client.get_json(&format!("auth/clients/{}/", id)).await
    }

    pub async fn create(&self, data: &Value) -> Result<Client, ApiError> {
        let value = self.client.post("auth/clients/", data).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update(&self, id: i64, data: &Value) -> Result<Client, ApiError> {
        let value = self
            .client
            .put(&format!("auth/clients/{}/", id), data)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn archive(&self, id: i64) -> Result<Value, ApiError> {
        self.client
            .post_empty(&format!("auth/clients/{}/archive/", id))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("auth/clients/{}/", id)).await
    }
}
