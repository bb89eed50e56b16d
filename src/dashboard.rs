//! Landing summary: task counts per board column, overdue work and
//! project totals, scoped by role the same way the board is.

use chrono::NaiveDate;
use studio_common::{BoardScope, ProjectStats, Task, TaskStatus};

use crate::board::TaskActions;
use crate::errors::ApiError;
use crate::gateway::ApiClient;

/// Summary shown by `studio dashboard`.
#[derive(Debug, Clone, Default)]
pub struct DashboardSummary {
    pub scope: BoardScope,
    /// Tasks in scope
    pub total_tasks: usize,
    /// One entry per status, in board order
    pub by_status: Vec<(TaskStatus, usize)>,
    /// Open tasks past their deadline
    pub overdue: usize,
    /// `None` when the role has no projects section
    pub projects: Option<ProjectStats>,
}

impl DashboardSummary {
    pub fn from_tasks(scope: BoardScope, tasks: &[Task], today: NaiveDate) -> Self {
        let by_status = TaskStatus::ALL
            .iter()
            .map(|&status| (status, tasks.iter().filter(|t| t.status == status).count()))
            .collect();
        Self {
            scope,
            total_tasks: tasks.len(),
            by_status,
            overdue: tasks.iter().filter(|t| is_overdue(t, today)).count(),
            projects: None,
        }
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    }
}

fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    if matches!(task.status, TaskStatus::Completed | TaskStatus::Cancelled) {
        return false;
    }
    task.is_overdue || task.deadline.is_some_and(|deadline| deadline < today)
}

/// Build the summary. Project totals come from the stats endpoint, or are
/// counted from the project list when that endpoint fails.
pub async fn load(
    api: &ApiClient,
    scope: BoardScope,
    with_projects: bool,
) -> Result<DashboardSummary, ApiError> {
    let today = chrono::Local::now().date_naive();
    let (tasks, projects) = tokio::join!(api.fetch(scope), async {
        if with_projects {
            project_stats(api).await.map(Some)
        } else {
            Ok(None)
        }
    });

    let mut summary = DashboardSummary::from_tasks(scope, &tasks?, today);
    summary.projects = projects?;
    Ok(summary)
}

async fn project_stats(api: &ApiClient) -> Result<ProjectStats, ApiError> {
    match api.projects().dashboard_stats().await {
        Ok(stats) => Ok(stats),
        Err(e @ (ApiError::SessionExpired | ApiError::Unauthorized)) => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "project stats unavailable, counting project list");
            let projects = api.projects().list().await?;
            Ok(ProjectStats::from_projects(&projects))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::task;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_counts_every_status_in_board_order() {
        let tasks = vec![
            task(1, TaskStatus::Created),
            task(2, TaskStatus::InWork),
            task(3, TaskStatus::InWork),
            task(4, TaskStatus::OnReview),
        ];
        let summary = DashboardSummary::from_tasks(BoardScope::Mine, &tasks, date("2026-10-18"));

        assert_eq!(summary.total_tasks, 4);
        assert_eq!(
            summary.by_status.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            TaskStatus::ALL.to_vec()
        );
        assert_eq!(summary.count(TaskStatus::InWork), 2);
        assert_eq!(summary.count(TaskStatus::Completed), 0);
        assert_eq!(summary.overdue, 0);
        assert!(summary.projects.is_none());
    }

    #[test]
    fn test_overdue_ignores_closed_tasks() {
        let today = date("2026-10-18");
        let mut late = task(1, TaskStatus::InWork);
        late.deadline = Some(date("2026-10-01"));
        let mut due_today = task(2, TaskStatus::Created);
        due_today.deadline = Some(today);
        let mut done_late = task(3, TaskStatus::Completed);
        done_late.deadline = Some(date("2026-09-01"));
        let mut flagged = task(4, TaskStatus::OnReview);
        flagged.is_overdue = true;

        let summary = DashboardSummary::from_tasks(
            BoardScope::All,
            &[late, due_today, done_late, flagged],
            today,
        );
        assert_eq!(summary.overdue, 2);
    }
}
