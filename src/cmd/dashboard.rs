use anyhow::Result;
use console::style;
use studio::dashboard;
use studio_common::{BoardScope, Section};

use super::App;

pub async fn cmd_dashboard(app: &App, mine: bool) -> Result<()> {
    let (user, caps) = app.require(Section::Dashboard).await?;
    let scope = if mine { BoardScope::Mine } else { caps.board_scope };
    let summary = dashboard::load(app.api(), scope, caps.can_view(Section::Projects)).await?;

    let heading = match scope {
        BoardScope::Mine => "My tasks",
        BoardScope::All => "All tasks",
    };
    println!(
        "{} {}",
        style(format!("Dashboard for {}", user.username)).bold(),
        style(format!("({})", user.role)).dim()
    );
    println!();
    println!("{} {}", style(heading).bold(), summary.total_tasks);
    for (status, count) in &summary.by_status {
        println!("  {:<12} {}", status.title(), count);
    }
    if summary.overdue > 0 {
        println!("  {:<12} {}", style("Overdue").red(), summary.overdue);
    } else {
        println!("  {:<12} 0", "Overdue");
    }

    if let Some(projects) = &summary.projects {
        println!();
        println!("{} {}", style("Projects").bold(), projects.total_projects);
        println!("  {:<12} {}", "Active", projects.active_projects);
        println!("  {:<12} {}", "Planned", projects.planned_projects);
        println!("  {:<12} {}", "On approval", projects.on_approval_projects);
        println!("  {:<12} {}", "Paused", projects.paused_projects);
        println!("  {:<12} {}", "Completed", projects.completed_projects);
    }
    Ok(())
}
