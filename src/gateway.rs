//! Single outbound HTTP client.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! bearer token and, on a 401, refreshes the access token once and replays
//! the request. A rejected refresh tears the session down.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::normalize_list_as;
use crate::errors::ApiError;
use crate::session::Session;

const REFRESH_PATH: &str = "auth/token/refresh/";

/// Longest raw body echoed back as an error message.
const MAX_RAW_MESSAGE: usize = 300;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    /// Serialises refreshes so concurrent 401s trigger a single refresh call.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send the request produced by `build`, with auth and at most one
    /// refresh-and-retry. `build` runs once per attempt so bodies that
    /// cannot be cloned (multipart) are rebuilt for the replay.
    pub async fn execute<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut retried = false;
        loop {
            let token = self.session.access_token();
            let mut request = build(&self.http);
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let status = response.status();
            tracing::debug!(status = %status, url = %response.url(), "api response");

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                if self.refresh(token.as_deref()).await? {
                    tracing::debug!("retrying request with refreshed token");
                    continue;
                }
                return Err(ApiError::Unauthorized);
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = error_message(status, &body);
                tracing::warn!(status = %status, message = %message, "api request failed");
                return Err(ApiError::Http { status, message });
            }

            return Ok(response);
        }
    }

    /// Obtain a new access token. `Ok(false)` means there is no refresh
    /// token to try; a rejected refresh clears the session and yields
    /// `SessionExpired`.
    async fn refresh(&self, stale_access: Option<&str>) -> Result<bool, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        // Another request refreshed while we waited.
        if let Some(current) = self.session.access_token() {
            if Some(current.as_str()) != stale_access {
                return Ok(true);
            }
        }

        let Some(refresh) = self.session.refresh_token() else {
            return Ok(false);
        };

        match self.request_refresh(&refresh).await {
            Ok(access) => {
                if let Err(e) = self.session.set_access_token(access) {
                    tracing::warn!(error = %e, "failed to persist refreshed token");
                }
                tracing::debug!("access token refreshed");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                if let Err(e) = self.session.expire() {
                    tracing::warn!(error = %e, "failed to clear session store");
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &str) -> Result<String, ApiError> {
        #[derive(serde::Deserialize)]
        struct RefreshResponse {
            access: String,
        }

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status,
                message: error_message(status, &body),
            });
        }
        let body: RefreshResponse = response.json().await?;
        Ok(body.access)
    }

    async fn send_value<F>(&self, build: F) -> Result<Value, ApiError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let response = self.execute(build).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_value(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        self.send_value(|http| http.get(&url).query(query)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.get_value(path, &[]).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET a collection, whatever envelope the server wraps it in.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let value = self.get_value(path, query).await?;
        normalize_list_as(value)
    }

    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        self.send_value(|http| {
            let request = http.request(method.clone(), &url);
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    /// POST without credentials and without the refresh path. Used for
    /// obtaining tokens, where a 401 means bad credentials.
    pub async fn post_public<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Http {
                status,
                message: error_message(status, &text),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// POST with no body; used by the action endpoints.
    pub async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.send_json::<Value>(Method::POST, path, None).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send_json(Method::PATCH, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_json::<Value>(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// GET raw bytes plus the filename from `Content-Disposition`, if any.
    pub async fn get_bytes(&self, path: &str) -> Result<(Vec<u8>, Option<String>), ApiError> {
        let url = self.url(path);
        let response = self.execute(|http| http.get(&url)).await?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), filename))
    }

    /// POST a multipart form built fresh for each attempt.
    pub async fn post_multipart<F>(&self, path: &str, form: F) -> Result<Value, ApiError>
    where
        F: Fn() -> reqwest::multipart::Form,
    {
        let url = self.url(path);
        self.send_value(|http| http.post(&url).multipart(form())).await
    }
}

/// Extract the message a user should see from an error body.
///
/// Precedence: `detail`, `error`, `message`, first field-validation
/// message, raw body text, then the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(map) = value.as_object() {
            for key in ["detail", "error", "message"] {
                if let Some(text) = map.get(key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            for (field, errors) in map {
                let first = match errors {
                    Value::String(s) => Some(s.as_str()),
                    Value::Array(items) => items.first().and_then(Value::as_str),
                    _ => None,
                };
                if let Some(text) = first {
                    return if field == "non_field_errors" {
                        text.to_string()
                    } else {
                        format!("{}: {}", field, text)
                    };
                }
            }
        } else if let Some(text) = value.as_str() {
            return text.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('<') {
        return trimmed.chars().take(MAX_RAW_MESSAGE).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}
