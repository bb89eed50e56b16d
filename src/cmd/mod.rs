//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                       |
//! |-----------------|--------------------------------------------------------|
//! | `session`       | `Login`, `Logout`, `Whoami`, `Passwd`                  |
//! | `dashboard`     | `Dashboard`                                            |
//! | `board`         | `Board`, `Move`, `Revise`, `Complete`                  |
//! | `tasks`         | `Tasks`, `Task`, `Progress`, `Assign`                  |
//! | `resources`     | `Projects`, `Clients`, `Employees`, `Files`, `Reports` |
//! | `notifications` | `Notifications`                                        |
//! | `config`        | `Config`                                               |

pub mod board;
pub mod config;
pub mod dashboard;
pub mod notifications;
pub mod resources;
pub mod session;
pub mod tasks;

pub use board::{cmd_board, cmd_complete, cmd_move, cmd_revise};
pub use config::cmd_config;
pub use dashboard::cmd_dashboard;
pub use notifications::cmd_notifications;
pub use resources::{cmd_clients, cmd_employees, cmd_files, cmd_projects, cmd_reports};
pub use session::{cmd_login, cmd_logout, cmd_passwd, cmd_whoami};
pub use tasks::{TaskListing, cmd_assign, cmd_progress, cmd_task, cmd_tasks};

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use studio::config::Config;
use studio::{ApiClient, FileSessionStore, Session};
use studio_common::{Capabilities, Section, User, capabilities};

use crate::Cli;

/// Everything a command needs: resolved config and an API client bound
/// to the persisted session.
pub struct App {
    pub config: Config,
    pub client: Arc<ApiClient>,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.clone(), cli.api_url.clone())?;
        let session = match Session::restore(FileSessionStore::new(&config.session_file)) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                Session::new(FileSessionStore::new(&config.session_file))
            }
        };
        let client = ApiClient::new(&config.api_url, config.timeout, Arc::new(session))
            .context("Failed to build HTTP client")?;
        tracing::debug!(api_url = %config.api_url, "client ready");
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.client
    }

    /// The signed-in user, asking the server when only tokens were stored.
    pub async fn user(&self) -> Result<User> {
        if let Some(user) = self.client.session().user() {
            return Ok(user);
        }
        self.api()
            .auth()
            .check()
            .await?
            .ok_or_else(|| anyhow!("Not logged in. Run 'studio login' first."))
    }

    /// The signed-in user, provided their role can open `section`.
    pub async fn require(&self, section: Section) -> Result<(User, Capabilities)> {
        let user = self.user().await?;
        let caps = capabilities(user.role);
        if !caps.can_view(section) {
            bail!(
                "The {} section is not available to the {} role",
                section.as_str(),
                user.role
            );
        }
        Ok((user, caps))
    }
}
