use serde::Serialize;
use studio_common::{TokenPair, User};

use crate::errors::ApiError;
use crate::gateway::ApiClient;

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
    pub confirm_password: &'a str,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for tokens and store them in the session.
    /// Returns the signed-in user.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let value = self
            .client
            .post_public("auth/token/", &Credentials { username, password })
            .await?;
        let pair: TokenPair = serde_json::from_value(value)?;
        let user = pair.user.clone();
        self.client.session().establish(pair)?;

        let user = match user {
            Some(user) => user,
            None => {
                let user = self.profile().await?;
                self.remember(&user);
                user
            }
        };
        tracing::info!(user = %user.username, role = %user.role, "logged in");
        Ok(user)
    }

    /// Validate a restored session against the server. A session whose
    /// token no longer works is cleared; `Ok(None)` means anonymous.
    pub async fn check(&self) -> Result<Option<User>, ApiError> {
        let session = self.client.session();
        if !session.is_authenticated() {
            return Ok(None);
        }
        match self.profile().await {
            Ok(user) => {
                self.remember(&user);
                Ok(Some(user))
            }
            Err(e @ ApiError::Transport(_)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "stored session rejected, logging out");
                if let Err(e) = session.logout() {
                    tracing::warn!(error = %e, "failed to clear session store");
                }
                Ok(None)
            }
        }
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        Ok(self.client.session().logout()?)
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        self.client.get_json("auth/me/").await
    }

    pub async fn update_profile(&self, changes: &serde_json::Value) -> Result<User, ApiError> {
        let value = self.client.put("auth/me/", changes).await?;
        let user: User = serde_json::from_value(value)?;
        self.remember(&user);
        Ok(user)
    }

    pub async fn change_password(&self, old: &str, new: &str) -> Result<(), ApiError> {
        self.client
            .post(
                "auth/change-password/",
                &PasswordChange {
                    old_password: old,
                    new_password: new,
                    confirm_password: new,
                },
            )
            .await?;
        Ok(())
    }

    fn remember(&self, user: &User) {
        if let Err(e) = self.client.session().set_user(user.clone()) {
            tracing::warn!(error = %e, "failed to persist user profile");
        }
    }
}
