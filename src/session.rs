//! Session state: the signed-in user plus access/refresh tokens.
//!
//! A [`Session`] is created explicitly at start-up ([`Session::restore`])
//! and handed to whatever needs it; there is no global. Persistence goes
//! through a [`SessionStore`] so tests can keep everything in memory.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use studio_common::{TokenPair, User};
use tokio::sync::broadcast;

use crate::errors::SessionError;

/// What gets persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

/// Lifecycle notifications. `Expired` is the signal to send the user back
/// to the login flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn,
    Refreshed,
    Expired,
    LoggedOut,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionData>, SessionError>;
    fn save(&self, data: &SessionData) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file on disk.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        let data = serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(data))
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let content = serde_json::to_string_pretty(data).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, content).map_err(|e| self.io_err(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<SessionData>>,
}

impl MemorySessionStore {
    pub fn with_data(data: SessionData) -> Self {
        Self {
            inner: Mutex::new(Some(data)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let guard = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        *guard = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut guard = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        *guard = None;
        Ok(())
    }
}

pub struct Session {
    state: RwLock<SessionData>,
    store: Box<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Empty session backed by `store`. Nothing is read from the store.
    pub fn new(store: impl SessionStore + 'static) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: RwLock::new(SessionData::default()),
            store: Box::new(store),
            events,
        }
    }

    /// Session initialised from whatever `store` holds.
    pub fn restore(store: impl SessionStore + 'static) -> Result<Self, SessionError> {
        let data = store.load()?.unwrap_or_default();
        let session = Self::new(store);
        *session.write()? = data;
        if session.is_authenticated() {
            tracing::debug!("restored persisted session");
        }
        Ok(session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().ok().and_then(|s| s.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().ok().and_then(|s| s.refresh.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.read().ok().and_then(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn snapshot(&self) -> Result<SessionData, SessionError> {
        Ok(self.read()?.clone())
    }

    /// Store a fresh token pair after login.
    pub fn establish(&self, pair: TokenPair) -> Result<(), SessionError> {
        let data = {
            let mut state = self.write()?;
            state.access = Some(pair.access);
            state.refresh = Some(pair.refresh);
            if pair.user.is_some() {
                state.user = pair.user;
            }
            state.clone()
        };
        self.store.save(&data)?;
        self.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Replace the access token after a successful refresh.
    pub fn set_access_token(&self, access: String) -> Result<(), SessionError> {
        let data = {
            let mut state = self.write()?;
            state.access = Some(access);
            state.clone()
        };
        self.store.save(&data)?;
        self.emit(SessionEvent::Refreshed);
        Ok(())
    }

    pub fn set_user(&self, user: User) -> Result<(), SessionError> {
        let data = {
            let mut state = self.write()?;
            state.user = Some(user);
            state.clone()
        };
        self.store.save(&data)
    }

    /// Tear down after the refresh token was rejected.
    pub fn expire(&self) -> Result<(), SessionError> {
        self.clear()?;
        self.emit(SessionEvent::Expired);
        Ok(())
    }

    /// Tear down on explicit logout.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.clear()?;
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.write()? = SessionData::default();
        self.store.clear()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, SessionData>, SessionError> {
        self.state.read().map_err(|_| SessionError::LockPoisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, SessionData>, SessionError> {
        self.state.write().map_err(|_| SessionError::LockPoisoned)
    }
}
