//! Client-side view logic for the task views.
//!
//! Everything here talks to the server through the [`TaskEndpoints`] trait, so the same
//! list, board and dialog behaviour can be driven by any transport (the HTTP client in the
//! `taskboard` binary, or a mock in tests).

use crate::task::{NewTask, Task, TaskError, TaskId, TaskPatch};
use mockall::automock;
use thiserror::Error;

pub mod dialog;
pub mod kanban;
pub mod list;

pub use dialog::{SubmitOutcome, TaskDialog};
pub use kanban::{Column, DropOutcome, KanbanBoard};
pub use list::TaskList;

/// Errors surfaced to the views when calling an endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server rejected the call with one of the task error codes.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),
    /// The server answered with something other than a task error.
    #[error("Unexpected response ({status}): {message}")]
    Server { status: u16, message: String },
}

/// The public task operations, as seen from a client.
#[automock]
pub trait TaskEndpoints {
    /// Lists every task owned by the caller.
    async fn list(&self) -> Result<Vec<Task>, ClientError>;
    /// Fetches one task owned by the caller.
    async fn get(&self, id: TaskId) -> Result<Task, ClientError>;
    /// Creates a task and returns its new ID.
    async fn create(&self, task: NewTask) -> Result<TaskId, ClientError>;
    /// Applies a sparse patch to a task.
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<(), ClientError>;
    /// Deletes a task.
    async fn remove(&self, id: TaskId) -> Result<(), ClientError>;
}
