//! Task board: the client-side mirror of task statuses.
//!
//! The board holds the authoritative task list as last confirmed by the
//! server and derives one column per status from it. Moves are requested
//! with [`TaskBoard::initiate_transition`] (or through [`DragEvents`]); a
//! task only changes column once the server has accepted the matching
//! workflow action.
//!
//! Every fetch and every transition takes a stamp from one increasing
//! sequence when it is issued. A result touches a task only when its stamp
//! is newer than whatever was last applied to that task, so a slow snapshot
//! cannot undo a confirmed move and a slow confirmation cannot undo a newer
//! snapshot.
//!
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`; network calls run unlocked.

mod columns;
mod drag;

pub use columns::{ColumnView, partition};
pub use drag::{DragEvents, DragSession};

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use studio_common::{BoardScope, Task, TaskId, TaskStatus};

use crate::api::TaskFilter;
use crate::api::tasks::TaskAction;
use crate::errors::{ApiError, BoardError};
use crate::gateway::ApiClient;

/// Server operations the board depends on.
/// Real implementation: [`ApiClient`]. Tests use an in-memory double.
#[async_trait]
pub trait TaskActions: Send + Sync {
    async fn fetch(&self, scope: BoardScope) -> Result<Vec<Task>, ApiError>;

    async fn run(&self, task_id: TaskId, action: TaskAction) -> Result<(), ApiError>;
}

#[async_trait]
impl TaskActions for ApiClient {
    async fn fetch(&self, scope: BoardScope) -> Result<Vec<Task>, ApiError> {
        match scope {
            BoardScope::All => self.tasks().list(&TaskFilter::default()).await,
            BoardScope::Mine => self.tasks().mine().await,
        }
    }

    async fn run(&self, task_id: TaskId, action: TaskAction) -> Result<(), ApiError> {
        self.tasks().action(task_id, action).await.map(|_| ())
    }
}

#[async_trait]
impl<T: TaskActions + ?Sized> TaskActions for Arc<T> {
    async fn fetch(&self, scope: BoardScope) -> Result<Vec<Task>, ApiError> {
        (**self).fetch(scope).await
    }

    async fn run(&self, task_id: TaskId, action: TaskAction) -> Result<(), ApiError> {
        (**self).run(task_id, action).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoardOptions {
    /// Reload the whole list after every confirmed transition.
    pub refetch_after_transition: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            refetch_after_transition: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Dropped back onto its own column; nothing was sent.
    Unchanged,
    /// The server accepted the action and the task now sits in `to`.
    Moved { from: TaskStatus, to: TaskStatus },
    /// The server accepted the action, but a snapshot issued later had
    /// already been applied to the task. The board has been refetched
    /// (or `last_error` holds why it could not be).
    Superseded,
}

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    /// Stamp of the last result applied to each task.
    applied: HashMap<TaskId, u64>,
    last_snapshot: u64,
    in_flight: HashSet<TaskId>,
    drag: Option<DragSession>,
    last_error: Option<String>,
}

impl BoardState {
    fn status_of(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.id == task_id).map(|t| t.status)
    }

    /// Replace the list with a fetched snapshot. Returns false when a newer
    /// snapshot is already in place.
    fn apply_snapshot(&mut self, stamp: u64, fetched: Vec<Task>) -> bool {
        if stamp < self.last_snapshot {
            return false;
        }
        self.last_snapshot = stamp;

        let previous: HashMap<TaskId, TaskStatus> =
            self.tasks.iter().map(|t| (t.id, t.status)).collect();
        let mut applied = HashMap::with_capacity(fetched.len());
        let tasks: Vec<Task> = fetched
            .into_iter()
            .map(|mut task| {
                let last = self.applied.get(&task.id).copied().unwrap_or(0);
                match previous.get(&task.id) {
                    Some(&status) if last > stamp => {
                        task.status = status;
                        applied.insert(task.id, last);
                    }
                    _ => {
                        applied.insert(task.id, stamp);
                    }
                }
                task
            })
            .collect();
        self.tasks = tasks;
        self.applied = applied;

        if let Some(drag) = self.drag {
            if self.status_of(drag.task_id).is_none() {
                self.drag = None;
            }
        }
        true
    }

    /// Record a confirmed status. Returns false when the task is gone or
    /// something newer was applied in the meantime.
    fn apply_transition(&mut self, stamp: u64, task_id: TaskId, to: TaskStatus) -> bool {
        let last = self.applied.get(&task_id).copied().unwrap_or(0);
        if last > stamp {
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return false;
        };
        task.status = to;
        self.applied.insert(task_id, stamp);
        true
    }
}

/// Clears a task's in-flight mark when the transition finishes or its
/// future is dropped.
struct InFlight<'a> {
    state: &'a Mutex<BoardState>,
    task_id: TaskId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight.remove(&self.task_id);
    }
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TaskBoard<A> {
    actions: A,
    scope: BoardScope,
    options: BoardOptions,
    state: Mutex<BoardState>,
    sequence: AtomicU64,
}

impl<A: TaskActions> TaskBoard<A> {
    pub fn new(actions: A, scope: BoardScope, options: BoardOptions) -> Self {
        Self {
            actions,
            scope,
            options,
            state: Mutex::new(BoardState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn scope(&self) -> BoardScope {
        self.scope
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        lock(&self.state)
    }

    fn next_stamp(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Initial fetch. Same as [`refresh`](Self::refresh).
    pub async fn load(&self) -> Result<usize, BoardError> {
        self.refresh().await
    }

    /// Fetch the task list for the board's scope and reconcile it.
    /// Returns the number of tasks in the snapshot.
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        self.fetch_snapshot(true).await
    }

    async fn fetch_snapshot(&self, record_error: bool) -> Result<usize, BoardError> {
        let stamp = self.next_stamp();
        match self.actions.fetch(self.scope).await {
            Ok(tasks) => {
                let count = tasks.len();
                let mut state = self.state();
                if state.apply_snapshot(stamp, tasks) {
                    state.last_error = None;
                    tracing::debug!(stamp, count, "board snapshot applied");
                } else {
                    tracing::debug!(stamp, "discarding stale board snapshot");
                }
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load tasks");
                if record_error {
                    self.state().last_error = Some(e.user_message());
                }
                Err(e.into())
            }
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.state().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    pub fn columns(&self) -> Vec<ColumnView> {
        partition(&self.state().tasks)
    }

    pub fn column_of(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.state().status_of(task_id)
    }

    pub fn is_busy(&self, task_id: TaskId) -> bool {
        self.state().in_flight.contains(&task_id)
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn take_error(&self) -> Option<String> {
        self.state().last_error.take()
    }

    /// Ask the server to move `task_id` into `target`.
    ///
    /// Dropping onto the current column does nothing. Only `in_work`,
    /// `on_review` and `completed` accept drops; anything else is refused
    /// locally. A task with a transition already in flight is refused with
    /// [`BoardError::Busy`].
    pub async fn initiate_transition(
        &self,
        task_id: TaskId,
        target: TaskStatus,
    ) -> Result<TransitionOutcome, BoardError> {
        self.dispatch(task_id, |source| {
            if source == target {
                return Ok(None);
            }
            TaskAction::for_drop_target(target)
                .map(Some)
                .ok_or(BoardError::NoTransition {
                    from: source,
                    to: target,
                })
        })
        .await
    }

    /// Send a task under review back to work.
    pub async fn return_for_revision(
        &self,
        task_id: TaskId,
    ) -> Result<TransitionOutcome, BoardError> {
        self.dispatch(task_id, |source| match source {
            TaskStatus::OnReview => Ok(Some(TaskAction::ReturnForRevision)),
            from => Err(BoardError::NoTransition {
                from,
                to: TaskStatus::InWork,
            }),
        })
        .await
    }

    pub async fn complete(&self, task_id: TaskId) -> Result<TransitionOutcome, BoardError> {
        self.initiate_transition(task_id, TaskStatus::Completed)
            .await
    }

    /// Validate under the lock with `plan`, then run the chosen action
    /// unlocked and reconcile its result.
    async fn dispatch<P>(&self, task_id: TaskId, plan: P) -> Result<TransitionOutcome, BoardError>
    where
        P: FnOnce(TaskStatus) -> Result<Option<TaskAction>, BoardError>,
    {
        let (source, action, stamp) = {
            let mut state = self.state();
            let source = state
                .status_of(task_id)
                .ok_or(BoardError::TaskNotFound { task_id })?;
            let Some(action) = plan(source)? else {
                return Ok(TransitionOutcome::Unchanged);
            };
            if !state.in_flight.insert(task_id) {
                return Err(BoardError::Busy { task_id });
            }
            (source, action, self.next_stamp())
        };
        let guard = InFlight {
            state: &self.state,
            task_id,
        };

        tracing::debug!(task_id, action = %action, stamp, "transition dispatched");
        let result = self.actions.run(task_id, action).await;

        match result {
            Ok(()) => {
                let to = action.resulting_status();
                let applied = self.state().apply_transition(stamp, task_id, to);
                drop(guard);

                if applied {
                    tracing::info!(task_id, from = %source, to = %to, "task moved");
                    if self.options.refetch_after_transition {
                        if let Err(e) = self.fetch_snapshot(false).await {
                            tracing::warn!(error = %e, "refetch after transition failed");
                        }
                    }
                } else {
                    // The snapshot that won may predate the action on the
                    // server, so only a fresh one settles the column.
                    tracing::debug!(task_id, stamp, "transition superseded by newer snapshot");
                    if let Err(e) = self.fetch_snapshot(true).await {
                        tracing::warn!(task_id, error = %e, "reconciling refetch failed");
                    }
                }

                Ok(if applied {
                    TransitionOutcome::Moved { from: source, to }
                } else {
                    TransitionOutcome::Superseded
                })
            }
            Err(e) => {
                let message = e.user_message();
                self.state().last_error = Some(message.clone());
                drop(guard);
                tracing::warn!(task_id, action = %action, error = %message, "transition rejected");
                Err(BoardError::Api(e))
            }
        }
    }
}
