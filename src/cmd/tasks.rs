//! Task list and single-task commands.

use anyhow::{Result, anyhow, bail};
use console::style;
use dialoguer::Confirm;
use studio::api::TaskFilter;
use studio_common::{Priority, Section, Task, TaskStatus};

use super::App;
use crate::TaskCommands;

pub struct TaskListing {
    pub mine: bool,
    pub overdue: bool,
    pub project: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// One-line rendering shared by the list and the board.
pub(crate) fn task_line(task: &Task) -> String {
    let priority = match task.priority {
        Priority::Critical => style(task.priority.as_str()).red().bold(),
        Priority::High => style(task.priority.as_str()).red(),
        Priority::Medium => style(task.priority.as_str()).yellow(),
        Priority::Low => style(task.priority.as_str()).dim(),
    };
    let mut details = Vec::new();
    if let Some(name) = &task.assigned_to_name {
        details.push(name.clone());
    }
    if let Some(deadline) = task.deadline {
        let due = format!("due {}", deadline);
        details.push(if task.is_overdue {
            style(due).red().to_string()
        } else {
            due
        });
    }
    if task.progress > 0 {
        details.push(format!("{}%", task.progress));
    }
    let details = if details.is_empty() {
        String::new()
    } else {
        format!(" {}", style(format!("({})", details.join(", "))).dim())
    };
    format!(
        "{} [{}] {}{}",
        style(format!("#{}", task.id)).cyan(),
        priority,
        task.title,
        details
    )
}

pub async fn cmd_tasks(app: &App, listing: TaskListing) -> Result<()> {
    app.require(Section::Tasks).await?;
    let tasks = app.api().tasks();
    let list = if listing.mine {
        tasks.mine().await?
    } else if listing.overdue {
        tasks.overdue().await?
    } else {
        let status = listing
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()
            .map_err(|e| anyhow!(e))?;
        tasks
            .list(&TaskFilter {
                project: listing.project,
                status,
                search: listing.search,
                ..Default::default()
            })
            .await?
    };

    if list.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in &list {
        println!("{}  {}", task_line(task), style(task.status.as_str()).dim());
    }
    Ok(())
}

pub async fn cmd_task(app: &App, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Show { id } => {
            app.require(Section::Tasks).await?;
            let task = app.api().tasks().get(id).await?;
            println!();
            println!("{}", task_line(&task));
            println!("  status:   {}", task.status.title());
            if let Some(project) = &task.project_title {
                println!("  project:  {}", project);
            }
            if let Some(creator) = &task.created_by_name {
                println!("  created:  by {}", creator);
            }
            if let Some(hours) = &task.estimated_hours {
                println!(
                    "  hours:    {} estimated, {} spent",
                    hours,
                    task.actual_hours.as_deref().unwrap_or("0")
                );
            }
            if !task.description.is_empty() {
                println!();
                println!("{}", task.description);
            }
            println!();
        }
        TaskCommands::Delete { id, force } => {
            let (_, caps) = app.require(Section::Tasks).await?;
            if !caps.manage_tasks {
                bail!("Only directors and managers can delete tasks");
            }
            if !force
                && !Confirm::new()
                    .with_prompt(format!("Delete task #{}?", id))
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }
            app.api().tasks().delete(id).await?;
            println!("Deleted task #{}.", id);
        }
    }
    Ok(())
}

pub async fn cmd_progress(app: &App, task_id: i64, percent: u8) -> Result<()> {
    app.require(Section::Tasks).await?;
    app.api().tasks().update_progress(task_id, percent).await?;
    println!("Task #{} progress set to {}%.", task_id, percent);
    Ok(())
}

pub async fn cmd_assign(app: &App, task_id: i64, user_id: i64) -> Result<()> {
    let (_, caps) = app.require(Section::Tasks).await?;
    if !caps.manage_tasks {
        bail!("Only directors and managers can reassign tasks");
    }
    app.api().tasks().change_assignee(task_id, user_id).await?;
    println!("Task #{} assigned to user {}.", task_id, user_id);
    Ok(())
}
