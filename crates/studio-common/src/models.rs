use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// Server-defined task lifecycle. The client mirrors these values and
/// never derives a new one on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    InWork,
    OnReview,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Every status in board order.
    pub const ALL: [TaskStatus; 5] = [
        Self::Created,
        Self::InWork,
        Self::OnReview,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InWork => "in_work",
            Self::OnReview => "on_review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable column heading.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::InWork => "In work",
            Self::OnReview => "On review",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "in_work" => Ok(Self::InWork),
            "on_review" => Ok(Self::OnReview),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// A user reference as the API sends it: list serializers emit the bare id,
/// detail serializers embed a summary object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UserRef {
    Id(i64),
    Embedded(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> i64 {
        match self {
            Self::Id(id) => *id,
            Self::Embedded(summary) => summary.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<UserRef>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub days_until_deadline: Option<i64>,
    /// Decimal hours; the API serializes decimals as strings.
    #[serde(default)]
    pub estimated_hours: Option<String>,
    #[serde(default)]
    pub actual_hours: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Task {
    pub fn assignee_id(&self) -> Option<i64> {
        self.assigned_to.as_ref().map(UserRef::id)
    }
}

fn default_true() -> bool {
    true
}

/// Payload for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project: i64,
    pub deadline: NaiveDate,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
}

/// Partial update; unset fields are left out of the PATCH body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub role: crate::role::Role,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {} {}", self.last_name, self.first_name, self.middle_name);
        let full = full.split_whitespace().collect::<Vec<_>>().join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// Response of the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub manager: Option<UserRef>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_archived: bool,
}

/// Project counts by status, as served by `projects/dashboard_stats/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectStats {
    pub total_projects: u64,
    pub active_projects: u64,
    pub planned_projects: u64,
    pub on_approval_projects: u64,
    pub completed_projects: u64,
    pub paused_projects: u64,
}

impl ProjectStats {
    /// Count a project list locally; used when the stats endpoint is absent.
    pub fn from_projects(projects: &[Project]) -> Self {
        let count = |status: &str| projects.iter().filter(|p| p.status == status).count() as u64;
        Self {
            total_projects: projects.len() as u64,
            active_projects: count("in_work"),
            planned_projects: count("planned"),
            on_approval_projects: count("on_approval"),
            completed_projects: count("completed"),
            paused_projects: count("paused"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: i64,
    #[serde(default)]
    pub employee: Option<UserRef>,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub work_email: String,
    #[serde(default)]
    pub employment_status: String,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub report_type: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub export_format: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_success: bool,
    #[serde(default)]
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub template_type: String,
    #[serde(default)]
    pub description: String,
}

/// Body for `reports/generate/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub export_format: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub notification_type: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
