use serde_json::Value;
use studio_common::{Employee, Role, User};

use crate::errors::ApiError;
use crate::gateway::ApiClient;

/// Fields the server refuses on update.
const IMMUTABLE_ON_UPDATE: &[&str] = &["username", "password", "confirm_password"];

pub struct EmployeesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> EmployeesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, ApiError> {
        self.client.get_list("auth/employees/", &[]).await
    }

    pub async fn get(&self, id: i64) -> Result<Employee, ApiError> {
        self.client.get_json(&format!("auth/employees/{}/", id)).await
    }

    pub async fn create(&self, data: &Value) -> Result<Employee, ApiError> {
        let value = self.client.post("auth/employees/", data).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update(&self, id: i64, data: &Value) -> Result<Employee, ApiError> {
        let body = strip_immutable(data);
        let value = self
            .client
            .put(&format!("auth/employees/{}/", id), &body)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("auth/employees/{}/", id)).await
    }

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.client.get_list("auth/users/", &[]).await
    }

    /// Users with the manager role; every user when there are none.
    pub async fn managers(&self) -> Result<Vec<User>, ApiError> {
        let users = self.users().await?;
        let managers: Vec<User> = users
            .iter()
            .filter(|u| u.role == Role::Manager)
            .cloned()
            .collect();
        Ok(if managers.is_empty() { users } else { managers })
    }
}

fn strip_immutable(data: &Value) -> Value {
    let mut body = data.clone();
    if let Some(map) = body.as_object_mut() {
        for key in IMMUTABLE_ON_UPDATE {
            map.remove(*key);
        }
        if map.get("email").is_some_and(|v| v.as_str().is_none_or(str::is_empty)) {
            map.remove("email");
        }
    }
    body
}
