//! Typed error hierarchy for the studio client.
//!
//! Three top-level enums cover the three layers:
//! - `ApiError`: gateway and resource-client failures
//! - `BoardError`: task-board transitions and drag handling
//! - `SessionError`: session persistence

use reqwest::StatusCode;
use studio_common::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors from the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response; `message` is the server's own text where one was sent.
    #[error("{message} (HTTP {status})")]
    Http { status: StatusCode, message: String },

    #[error("Not authenticated")]
    Unauthorized,

    /// The refresh token was rejected; the session has been torn down.
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized | Self::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// Text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors from the task board.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("No defined transition from {from} to {to}")]
    NoTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task {task_id} has a transition in flight")]
    Busy { task_id: TaskId },

    #[error("Task {task_id} is not on the board")]
    TaskNotFound { task_id: TaskId },

    #[error("No drag in progress")]
    NoDragSession,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BoardError {
    /// True when the server (or transport) was involved, as opposed to a
    /// locally refused gesture.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Api(_))
    }
}

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt session file at {path}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session lock poisoned")]
    LockPoisoned,
}
