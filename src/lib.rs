pub mod api;
pub mod board;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod gateway;
pub mod logging;
pub mod notify;
pub mod session;

pub use board::{BoardOptions, TaskActions, TaskBoard, TransitionOutcome};
pub use errors::{ApiError, BoardError, SessionError};
pub use gateway::ApiClient;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionEvent, SessionStore};
