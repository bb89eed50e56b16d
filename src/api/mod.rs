//! Resource clients: one thin wrapper per API entity over [`ApiClient`].
//!
//! ## Module Map
//!
//! | Module          | Endpoints                                        |
//! |-----------------|--------------------------------------------------|
//! | `auth`          | `auth/token/`, `auth/me/`, `auth/change-password/` |
//! | `tasks`         | `projects/project-tasks/...` incl. the four actions |
//! | `projects`      | `projects/...`                                   |
//! | `clients`       | `auth/clients/...`                               |
//! | `employees`     | `auth/employees/...`, `auth/users/`              |
//! | `files`         | `files/...`                                      |
//! | `reports`       | `reports/...`                                    |
//! | `notifications` | `notifications/...`                              |
//!
//! Every list-returning call goes through [`normalize_list`]: the backend
//! answers collections as a bare array, a paginated envelope, or a keyed
//! object depending on the endpoint.

pub mod auth;
pub mod clients;
pub mod employees;
pub mod files;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod tasks;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::ApiError;
use crate::gateway::ApiClient;

pub use auth::AuthApi;
pub use clients::ClientsApi;
pub use employees::EmployeesApi;
pub use files::FilesApi;
pub use notifications::NotificationsApi;
pub use projects::ProjectsApi;
pub use reports::ReportsApi;
pub use tasks::{TaskFilter, TasksApi};

/// Flatten any collection shape into an ordered list.
///
/// In order of precedence:
/// 1. an array is used as-is;
/// 2. an object whose `results` is an array yields that array;
/// 3. an object whose `data` is an array yields that array;
/// 4. any other object yields its object-valued entries: integer keys
///    first in numeric order (`"2"` before `"10"`), then the rest in key
///    order.
///
/// Anything else (null, scalars) is an empty list.
pub fn normalize_list(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["results", "data"] {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            let mut entries: Vec<(Option<u32>, Value)> = map
                .into_iter()
                .filter(|(_, value)| value.is_object())
                .map(|(key, value)| (index_key(&key), value))
                .collect();
            // Stable: non-index keys keep the map's order behind the indexes.
            entries.sort_by_key(|(index, _)| match index {
                Some(n) => (0, *n),
                None => (1, 0),
            });
            entries.into_iter().map(|(_, value)| value).collect()
        }
        _ => Vec::new(),
    }
}

/// `Some(n)` for canonical non-negative integer keys ("7", not "07").
fn index_key(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    (n.to_string() == key && n < u32::MAX).then_some(n)
}

/// [`normalize_list`] followed by typed decoding of every item.
pub fn normalize_list_as<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>, ApiError> {
    normalize_list(payload)
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ApiError::from))
        .collect()
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi::new(self)
    }

    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(self)
    }

    pub fn clients(&self) -> ClientsApi<'_> {
        ClientsApi::new(self)
    }

    pub fn employees(&self) -> EmployeesApi<'_> {
        EmployeesApi::new(self)
    }

    pub fn files(&self) -> FilesApi<'_> {
        FilesApi::new(self)
    }

    pub fn reports(&self) -> ReportsApi<'_> {
        ReportsApi::new(self)
    }

    pub fn notifications(&self) -> NotificationsApi<'_> {
        NotificationsApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use studio_common::{Task, TaskStatus};

    fn items() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Logo", "status": "created"}),
            json!({"id": 2, "title": "Banner", "status": "in_work"}),
            json!({"id": 3, "title": "Slogan", "status": "on_review"}),
        ]
    }

    #[test]
    fn test_all_four_shapes_normalize_to_the_same_tasks() {
        let bare = Value::Array(items());
        let results = json!({"count": 3, "next": null, "previous": null, "results": items()});
        let data = json!({"data": items()});
        let keyed = json!({"a": items()[0], "b": items()[1], "c": items()[2]});

        let expected: Vec<Task> = normalize_list_as(bare).unwrap();
        assert_eq!(expected.len(), 3);
        assert_eq!(
            expected.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(expected[1].status, TaskStatus::InWork);

        for shape in [results, data, keyed] {
            let tasks: Vec<Task> = normalize_list_as(shape).unwrap();
            assert_eq!(tasks, expected);
        }
    }

    #[test]
    fn test_results_wins_over_data() {
        let payload = json!({"results": [{"id": 1}], "data": [{"id": 2}]});
        assert_eq!(normalize_list(payload), vec![json!({"id": 1})]);
    }

    #[test]
    fn test_non_array_results_falls_through() {
        let payload = json!({"results": "none", "data": [{"id": 2}]});
        assert_eq!(normalize_list(payload), vec![json!({"id": 2})]);
    }

    #[test]
    fn test_keyed_object_skips_scalar_values() {
        let payload = json!({"count": 2, "x": {"id": 1}, "y": {"id": 2}});
        assert_eq!(
            normalize_list(payload),
            vec![json!({"id": 1}), json!({"id": 2})]
        );
    }

    #[test]
    fn test_keyed_object_orders_integer_keys_numerically() {
        let payload = json!({
            "10": {"id": 10},
            "07": {"id": 7},
            "a": {"id": 20},
            "2": {"id": 2},
            "b": {"id": 21}
        });
        let ids: Vec<i64> = normalize_list(payload)
            .iter()
            .map(|v| v["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 10, 7, 20, 21]);
    }

    #[test]
    fn test_scalars_and_null_are_empty() {
        assert!(normalize_list(Value::Null).is_empty());
        assert!(normalize_list(json!(5)).is_empty());
        assert!(normalize_list(json!({})).is_empty());
    }

    #[test]
    fn test_typed_decode_error_is_reported() {
        let payload = json!([{"id": 1, "title": "x", "status": "archived"}]);
        let err = normalize_list_as::<Task>(payload).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
