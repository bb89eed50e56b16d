//! Board commands: `studio board|move|revise|complete`.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use console::style;
use studio::board::{DragEvents, TaskBoard, TransitionOutcome};
use studio::{ApiClient, BoardOptions};
use studio_common::{BoardScope, Capabilities, Section, TaskId, TaskStatus, User};

use super::App;
use super::tasks::task_line;

type Board = TaskBoard<Arc<ApiClient>>;

async fn open_board(app: &App, mine: bool) -> Result<(Board, User, Capabilities)> {
    let (user, caps) = app.require(Section::Tasks).await?;
    let scope = if mine { BoardScope::Mine } else { caps.board_scope };
    let board = TaskBoard::new(
        app.client.clone(),
        scope,
        BoardOptions {
            refetch_after_transition: app.config.refetch_after_transition,
        },
    );
    board.load().await?;
    Ok((board, user, caps))
}

fn print_board(board: &Board) {
    for column in board.columns() {
        println!();
        println!(
            "{} {}",
            style(column.title()).bold(),
            style(format!("({})", column.len())).dim()
        );
        for task in &column.tasks {
            println!("  {}", task_line(task));
        }
    }
    println!();
}

fn report(board: &Board, task_id: TaskId, outcome: TransitionOutcome) {
    match outcome {
        TransitionOutcome::Unchanged => println!("Task #{} is already there.", task_id),
        TransitionOutcome::Moved { from, to } => println!(
            "{} Task #{}: {} → {}",
            style("✓").green(),
            task_id,
            from.title(),
            to.title()
        ),
        TransitionOutcome::Superseded => match board.last_error() {
            None => println!(
                "Task #{} was accepted by the server; now in {}.",
                task_id,
                board
                    .column_of(task_id)
                    .map(|status| status.title())
                    .unwrap_or("(not on board)")
            ),
            Some(err) => println!(
                "Task #{} was accepted by the server, but the board could not be reloaded: {}",
                task_id, err
            ),
        },
    }
}

/// Refuse completing tasks the role cannot complete.
fn check_complete(board: &Board, user: &User, caps: &Capabilities, task_id: TaskId) -> Result<()> {
    let task = board
        .task(task_id)
        .ok_or_else(|| anyhow!("Task #{} is not on your board", task_id))?;
    if !caps.can_complete(task.assignee_id() == Some(user.id)) {
        bail!("Only the assignee or management can complete task #{}", task_id);
    }
    Ok(())
}

pub async fn cmd_board(app: &App, mine: bool) -> Result<()> {
    let (board, _, _) = open_board(app, mine).await?;
    print_board(&board);
    Ok(())
}

pub async fn cmd_move(app: &App, task_id: TaskId, column: &str) -> Result<()> {
    let target: TaskStatus = column.parse().map_err(|e: String| anyhow!(e))?;
    let (board, user, caps) = open_board(app, false).await?;
    if target == TaskStatus::Completed {
        check_complete(&board, &user, &caps, task_id)?;
    }

    board.drag_start(task_id)?;
    if !board.drag_over(target)? {
        board.drag_cancel();
        bail!(
            "Tasks cannot be moved to {}; use in_work, on_review or completed",
            target
        );
    }
    let outcome = board.drop_on(target).await?;
    report(&board, task_id, outcome);
    Ok(())
}

pub async fn cmd_revise(app: &App, task_id: TaskId) -> Result<()> {
    let (board, _, caps) = open_board(app, false).await?;
    if !caps.return_for_revision {
        bail!("Only directors and managers can return tasks for revision");
    }
    let outcome = board.return_for_revision(task_id).await?;
    report(&board, task_id, outcome);
    Ok(())
}

pub async fn cmd_complete(app: &App, task_id: TaskId) -> Result<()> {
    let (board, user, caps) = open_board(app, false).await?;
    check_complete(&board, &user, &caps, task_id)?;
    let outcome = board.complete(task_id).await?;
    report(&board, task_id, outcome);
    Ok(())
}
