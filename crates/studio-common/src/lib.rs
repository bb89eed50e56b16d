//! Shared domain types for the studio client: tasks and their statuses,
//! the other API entities, and role capabilities.

pub mod models;
pub mod role;

pub use models::*;
pub use role::{BoardScope, Capabilities, Role, Section, capabilities};
