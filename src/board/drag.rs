//! Pointer-driven moves. A drag session lives between `drag_start` and
//! `drop_on`/`drag_cancel` and is never persisted.

use async_trait::async_trait;
use studio_common::{TaskId, TaskStatus};

use super::{TaskActions, TaskBoard, TransitionOutcome};
use crate::api::tasks::TaskAction;
use crate::errors::BoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub task_id: TaskId,
    pub source: TaskStatus,
    pub hovering: Option<TaskStatus>,
}

impl DragSession {
    /// Whether dropping on `column` would be accepted.
    pub fn accepts(&self, column: TaskStatus) -> bool {
        column == self.source || TaskAction::for_drop_target(column).is_some()
    }
}

#[async_trait]
pub trait DragEvents: Send + Sync {
    /// Pick up a task. Busy and unknown tasks cannot be picked up.
    fn drag_start(&self, task_id: TaskId) -> Result<DragSession, BoardError>;

    /// Hover over a column; returns whether it would accept the drop.
    fn drag_over(&self, column: TaskStatus) -> Result<bool, BoardError>;

    /// Release over a column. Ends the session and requests the move.
    async fn drop_on(&self, column: TaskStatus) -> Result<TransitionOutcome, BoardError>;

    /// Abandon the drag without contacting the server.
    fn drag_cancel(&self) -> Option<DragSession>;
}

impl<A: TaskActions> TaskBoard<A> {
    pub fn drag(&self) -> Option<DragSession> {
        self.state().drag
    }
}

#[async_trait]
impl<A: TaskActions> DragEvents for TaskBoard<A> {
    fn drag_start(&self, task_id: TaskId) -> Result<DragSession, BoardError> {
        let mut state = self.state();
        let source = state
            .status_of(task_id)
            .ok_or(BoardError::TaskNotFound { task_id })?;
        if state.in_flight.contains(&task_id) {
            return Err(BoardError::Busy { task_id });
        }
        let session = DragSession {
            task_id,
            source,
            hovering: None,
        };
        state.drag = Some(session);
        Ok(session)
    }

    fn drag_over(&self, column: TaskStatus) -> Result<bool, BoardError> {
        let mut state = self.state();
        let drag = state.drag.as_mut().ok_or(BoardError::NoDragSession)?;
        drag.hovering = Some(column);
        Ok(drag.accepts(column))
    }

    async fn drop_on(&self, column: TaskStatus) -> Result<TransitionOutcome, BoardError> {
        let session = self
            .state()
            .drag
            .take()
            .ok_or(BoardError::NoDragSession)?;
        tracing::debug!(task_id = session.task_id, from = %session.source, to = %column, "drop");
        self.initiate_transition(session.task_id, column).await
    }

    fn drag_cancel(&self) -> Option<DragSession> {
        self.state().drag.take()
    }
}
