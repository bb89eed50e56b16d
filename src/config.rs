//! Client configuration, read from `studio.toml`.
//!
//! Layering is file → environment → CLI. The file is looked up at
//! `$STUDIO_CONFIG`, then `<config dir>/studio/studio.toml`; a missing file
//! means defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api"
//! timeout_secs = 30
//!
//! [session]
//! file = "/home/me/.local/share/studio/session.json"
//!
//! [board]
//! refetch_after_transition = true
//!
//! [notifications]
//! poll_interval_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout applied to every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// Where tokens and the signed-in user are persisted
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSection {
    /// Refetch the task list after every confirmed transition
    #[serde(default = "default_refetch")]
    pub refetch_after_transition: bool,
}

fn default_refetch() -> bool {
    true
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            refetch_after_transition: default_refetch(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsSection {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Root of `studio.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub notifications: NotificationsSection,
}

impl StudioToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse studio.toml")
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize studio.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Problems worth telling the user about. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            warnings.push(format!(
                "api.base_url '{}' is not an http(s) URL",
                self.api.base_url
            ));
        }
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs is 0; every request would time out".to_string());
        }
        if self.notifications.poll_interval_secs == 0 {
            warnings.push("notifications.poll_interval_secs must be at least 1".to_string());
        }
        warnings
    }
}

/// Default location of `studio.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("STUDIO_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studio")
        .join("studio.toml")
}

fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studio")
        .join("session.json")
}

/// Effective runtime configuration after env and CLI overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub session_file: PathBuf,
    pub refetch_after_transition: bool,
    pub poll_interval: Duration,
}

impl Config {
    /// Resolve the configuration: file at `config_path` (or the default
    /// location), then `STUDIO_API_URL`/`STUDIO_TIMEOUT_SECS`, then `api_url`.
    pub fn load(config_path: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(default_config_path);
        let toml = StudioToml::load_or_default(&config_path)?;
        Self::from_toml(config_path, toml, api_url)
    }

    pub fn from_toml(
        config_path: PathBuf,
        toml: StudioToml,
        api_url: Option<String>,
    ) -> Result<Self> {
        let api_url = api_url
            .or_else(|| std::env::var("STUDIO_API_URL").ok())
            .unwrap_or(toml.api.base_url);

        let timeout_secs = match std::env::var("STUDIO_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("STUDIO_TIMEOUT_SECS is not a number: {}", raw))?,
            Err(_) => toml.api.timeout_secs,
        };

        Ok(Self {
            config_path,
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
            session_file: toml.session.file.unwrap_or_else(default_session_path),
            refetch_after_transition: toml.board.refetch_after_transition,
            poll_interval: Duration::from_secs(toml.notifications.poll_interval_secs.max(1)),
        })
    }
}
