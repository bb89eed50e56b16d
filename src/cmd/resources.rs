//! Read-mostly listings for the other API entities.

use anyhow::{Result, bail};
use console::style;
use studio_common::{ReportRequest, Section};

use super::App;
use super::tasks::task_line;
use crate::{FilesCommands, ReportsCommands};

pub async fn cmd_projects(app: &App, archived: bool, id: Option<i64>) -> Result<()> {
    app.require(Section::Projects).await?;
    let projects = app.api().projects();

    if let Some(id) = id {
        let project = projects.get(id).await?;
        let members = projects.members(id).await?;
        let tasks = projects.tasks(id).await?;
        println!();
        println!(
            "{} {}",
            style(&project.title).bold(),
            style(format!("[{}]", project.status)).dim()
        );
        if let Some(client) = &project.client_name {
            println!("  client:  {}", client);
        }
        if let (Some(start), Some(end)) = (project.start_date, project.planned_end_date) {
            println!("  dates:   {} → {}", start, end);
        }
        println!("  members: {}", members.len());
        for member in &members {
            let who = member
                .employee
                .as_ref()
                .map(|e| e.id().to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("    employee {} ({})", who, member.role);
        }
        println!("  tasks:   {}", tasks.len());
        for task in &tasks {
            println!("    {}", task_line(task));
        }
        println!();
        return Ok(());
    }

    let list = if archived {
        projects.archived().await?
    } else {
        projects.list().await?
    };
    if list.is_empty() {
        println!("No projects.");
    }
    for project in &list {
        println!(
            "{} {} {}",
            style(format!("#{}", project.id)).cyan(),
            project.title,
            style(format!("[{}, {}]", project.status, project.priority.as_str())).dim()
        );
    }
    Ok(())
}

pub async fn cmd_clients(app: &App) -> Result<()> {
    app.require(Section::Clients).await?;
    let clients = app.api().clients().list().await?;
    if clients.is_empty() {
        println!("No clients.");
    }
    for client in clients.iter().filter(|c| !c.is_archived) {
        println!(
            "{} {} {}",
            style(format!("#{}", client.id)).cyan(),
            client.name,
            style(format!("{} {}", client.contact_person, client.email).trim().to_string()).dim()
        );
    }
    Ok(())
}

pub async fn cmd_employees(app: &App) -> Result<()> {
    app.require(Section::Employees).await?;
    let employees = app.api().employees().list().await?;
    if employees.is_empty() {
        println!("No employees.");
    }
    for employee in &employees {
        println!(
            "{} {} {}",
            style(format!("#{}", employee.id)).cyan(),
            employee.full_name.as_deref().unwrap_or("(unnamed)"),
            style(format!("{} {}", employee.position, employee.employment_status).trim().to_string())
                .dim()
        );
    }
    Ok(())
}

pub async fn cmd_files(app: &App, command: Option<FilesCommands>) -> Result<()> {
    app.require(Section::Files).await?;
    let files = app.api().files();
    match command.unwrap_or(FilesCommands::List) {
        FilesCommands::List => {
            let list = files.list().await?;
            if list.is_empty() {
                println!("No files.");
            }
            for file in &list {
                println!(
                    "{} {} {}",
                    style(format!("#{}", file.id)).cyan(),
                    file.name,
                    style(format!("v{}, {} bytes", file.version, file.size)).dim()
                );
            }
        }
        FilesCommands::Upload { path, project } => {
            let file = files.upload(&path, project).await?;
            println!("{} Uploaded {} as #{}", style("✓").green(), file.name, file.id);
        }
        FilesCommands::Download { id, dest } => {
            let written = files.download(id, &dest).await?;
            println!("Saved {}", written.display());
        }
    }
    Ok(())
}

pub async fn cmd_reports(app: &App, command: Option<ReportsCommands>) -> Result<()> {
    app.require(Section::Reports).await?;
    let reports = app.api().reports();
    match command.unwrap_or(ReportsCommands::List) {
        ReportsCommands::List => {
            let list = reports.list().await?;
            if list.is_empty() {
                println!("No reports.");
            }
            for report in &list {
                let state = if report.is_success {
                    style("ok").green()
                } else {
                    style("failed").red()
                };
                println!(
                    "{} {} [{}] {}",
                    style(format!("#{}", report.id)).cyan(),
                    report.name,
                    state,
                    style(&report.report_type).dim()
                );
            }
        }
        ReportsCommands::Templates => {
            for template in reports.templates().await? {
                println!(
                    "{} {} {}",
                    style(format!("#{}", template.id)).cyan(),
                    template.name,
                    style(&template.template_type).dim()
                );
            }
        }
        ReportsCommands::Generate {
            report_type,
            start,
            end,
            format,
        } => {
            if end < start {
                bail!("End date {} is before start date {}", end, start);
            }
            let report = reports
                .generate(&ReportRequest {
                    report_type,
                    start_date: start,
                    end_date: end,
                    export_format: format,
                    projects: Vec::new(),
                    employees: Vec::new(),
                })
                .await?;
            println!("{} Generated report #{}", style("✓").green(), report.id);
        }
        ReportsCommands::Download { id, dest } => {
            let written = reports.download(id, &dest).await?;
            println!("Saved {}", written.display());
        }
        ReportsCommands::Archive { id } => {
            reports.archive(id).await?;
            println!("Archived report #{}.", id);
        }
    }
    Ok(())
}
