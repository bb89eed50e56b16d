//! User roles and what each role may see and do in the client.
//!
//! Visibility is a pure function of the role: [`capabilities`] is evaluated
//! wherever a UI decision depends on it, nothing is cached per session.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Manager,
    Designer,
    Copywriter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Manager => "manager",
            Self::Designer => "designer",
            Self::Copywriter => "copywriter",
        }
    }

    /// Directors and managers run projects; designers and copywriters execute tasks.
    pub fn is_management(&self) -> bool {
        matches!(self, Self::Director | Self::Manager)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "director" => Ok(Self::Director),
            "manager" => Ok(Self::Manager),
            "designer" => Ok(Self::Designer),
            "copywriter" => Ok(Self::Copywriter),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Navigation sections of the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Dashboard,
    Tasks,
    Profile,
    Projects,
    Clients,
    Employees,
    Reports,
    Files,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Tasks => "tasks",
            Self::Profile => "profile",
            Self::Projects => "projects",
            Self::Clients => "clients",
            Self::Employees => "employees",
            Self::Reports => "reports",
            Self::Files => "files",
        }
    }
}

/// Which task set a board shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoardScope {
    #[default]
    All,
    Mine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub sections: Vec<Section>,
    pub board_scope: BoardScope,
    pub manage_tasks: bool,
    pub return_for_revision: bool,
    /// Completing an on-review task is open to management, and to the
    /// assignee for their own tasks.
    pub complete_any_on_review: bool,
}

impl Capabilities {
    pub fn can_view(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    pub fn can_complete(&self, is_assignee: bool) -> bool {
        self.complete_any_on_review || is_assignee
    }
}

pub fn capabilities(role: Role) -> Capabilities {
    let mut sections = vec![
        Section::Dashboard,
        Section::Tasks,
        Section::Profile,
        Section::Files,
    ];
    match role {
        Role::Director => sections.extend([
            Section::Projects,
            Section::Clients,
            Section::Employees,
            Section::Reports,
        ]),
        Role::Manager => sections.extend([Section::Projects, Section::Clients, Section::Reports]),
        Role::Designer | Role::Copywriter => {}
    }

    let management = role.is_management();
    Capabilities {
        sections,
        board_scope: if management {
            BoardScope::All
        } else {
            BoardScope::Mine
        },
        manage_tasks: management,
        return_for_revision: management,
        complete_any_on_review: management,
    }
}
