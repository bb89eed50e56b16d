use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "studio")]
#[command(version, about = "Command-line client for the studio project-management API")]
pub struct Cli {
    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// API base URL. Overrides studio.toml and STUDIO_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to studio.toml
    #[arg(long, global = true, env = "STUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        username: Option<String>,
        /// Password; prompted for when omitted
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in user and what their role can see
    Whoami,
    /// Change the signed-in user's password
    Passwd,
    /// Summary of my tasks, overdue work and projects
    Dashboard {
        /// Only tasks assigned to me
        #[arg(long)]
        mine: bool,
    },
    /// Show the task board
    Board {
        /// Only tasks assigned to me
        #[arg(long)]
        mine: bool,
    },
    /// Move a task to another board column
    Move {
        task_id: i64,
        /// Target column: created, in_work, on_review, completed, cancelled
        column: String,
    },
    /// Return a task under review to work
    Revise { task_id: i64 },
    /// Complete a task under review
    Complete { task_id: i64 },
    /// Set a task's progress percentage
    Progress {
        task_id: i64,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Reassign a task
    Assign { task_id: i64, user_id: i64 },
    /// List tasks
    Tasks {
        #[arg(long, conflicts_with = "overdue")]
        mine: bool,
        #[arg(long)]
        overdue: bool,
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Single-task operations
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// List projects
    Projects {
        #[arg(long)]
        archived: bool,
        /// Show one project with its members and tasks
        #[arg(long)]
        id: Option<i64>,
    },
    /// List clients
    Clients,
    /// List employees
    Employees,
    /// List, upload or download project files
    Files {
        #[command(subcommand)]
        command: Option<FilesCommands>,
    },
    /// List, generate or download reports
    Reports {
        #[command(subcommand)]
        command: Option<ReportsCommands>,
    },
    /// Show notifications
    Notifications {
        /// Keep polling and print the unread count as it changes
        #[arg(long)]
        watch: bool,
        /// Mark one notification as read
        #[arg(long, conflicts_with = "read_all")]
        read: Option<i64>,
        /// Mark every notification as read
        #[arg(long)]
        read_all: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Show one task
    Show { id: i64 },
    /// Delete a task
    Delete {
        id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum FilesCommands {
    List,
    Upload {
        path: PathBuf,
        #[arg(long)]
        project: Option<i64>,
    },
    Download {
        id: i64,
        /// File or directory to write to
        #[arg(default_value = ".")]
        dest: PathBuf,
    },
}

#[derive(Subcommand, Clone)]
pub enum ReportsCommands {
    List,
    Templates,
    Generate {
        /// Report type, e.g. project_status or employee_performance
        report_type: String,
        /// Start date (YYYY-MM-DD)
        start: chrono::NaiveDate,
        /// End date (YYYY-MM-DD)
        end: chrono::NaiveDate,
        #[arg(long, default_value = "pdf")]
        format: String,
    },
    Download {
        id: i64,
        #[arg(default_value = ".")]
        dest: PathBuf,
    },
    Archive { id: i64 },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default studio.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    studio::logging::init(studio::logging::LogOptions {
        verbose: cli.verbose,
        json: cli.log_json,
    });

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(&cli, command.clone());
    }

    let app = cmd::App::new(&cli)?;
    match &cli.command {
        Commands::Login { username, password } => {
            cmd::cmd_login(&app, username.clone(), password.clone()).await?
        }
        Commands::Logout => cmd::cmd_logout(&app)?,
        Commands::Whoami => cmd::cmd_whoami(&app).await?,
        Commands::Passwd => cmd::cmd_passwd(&app).await?,
        Commands::Dashboard { mine } => cmd::cmd_dashboard(&app, *mine).await?,
        Commands::Board { mine } => cmd::cmd_board(&app, *mine).await?,
        Commands::Move { task_id, column } => cmd::cmd_move(&app, *task_id, column).await?,
        Commands::Revise { task_id } => cmd::cmd_revise(&app, *task_id).await?,
        Commands::Complete { task_id } => cmd::cmd_complete(&app, *task_id).await?,
        Commands::Progress { task_id, percent } => {
            cmd::cmd_progress(&app, *task_id, *percent).await?
        }
        Commands::Assign { task_id, user_id } => cmd::cmd_assign(&app, *task_id, *user_id).await?,
        Commands::Tasks {
            mine,
            overdue,
            project,
            status,
            search,
        } => {
            cmd::cmd_tasks(
                &app,
                cmd::TaskListing {
                    mine: *mine,
                    overdue: *overdue,
                    project: *project,
                    status: status.clone(),
                    search: search.clone(),
                },
            )
            .await?
        }
        Commands::Task { command } => cmd::cmd_task(&app, command.clone()).await?,
        Commands::Projects { archived, id } => cmd::cmd_projects(&app, *archived, *id).await?,
        Commands::Clients => cmd::cmd_clients(&app).await?,
        Commands::Employees => cmd::cmd_employees(&app).await?,
        Commands::Files { command } => cmd::cmd_files(&app, command.clone()).await?,
        Commands::Reports { command } => cmd::cmd_reports(&app, command.clone()).await?,
        Commands::Notifications {
            watch,
            read,
            read_all,
        } => cmd::cmd_notifications(&app, *watch, *read, *read_all).await?,
        // Handled above, before a session is opened.
        Commands::Config { .. } => {}
    }

    Ok(())
}
