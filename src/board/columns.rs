//! Column view over the authoritative task list.

use studio_common::{Task, TaskId, TaskStatus};

/// One board column: every task whose status is `status`, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

impl ColumnView {
    pub fn title(&self) -> &'static str {
        self.status.title()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == task_id)
    }
}

/// Split `tasks` into one column per status. Each task lands in exactly
/// the column matching its status; relative order is preserved.
pub fn partition(tasks: &[Task]) -> Vec<ColumnView> {
    TaskStatus::ALL
        .iter()
        .map(|&status| ColumnView {
            status,
            tasks: tasks.iter().filter(|t| t.status == status).cloned().collect(),
        })
        .collect()
}
