use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod status;

pub use status::{ParseStatusError, TaskStatus};

/// Public alias representing the identifier of a task owner.
pub type OwnerId = String;

/// Store-assigned identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TaskId(i32);

impl TaskId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl From<i32> for TaskId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// A single task owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: OwnerId,
    pub title: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a task. Owner and creation time are assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct NewTask {
    pub title: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub is_completed: bool,
}

impl NewTask {
    /// A fresh `todo` task with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            is_completed: false,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the status together with the completion flag that agrees with it.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self.is_completed = status.is_completed();
        self
    }
}

/// A sparse update: only the fields that are `Some` are written.
///
/// The coupled constructors ([`TaskPatch::move_to`], [`TaskPatch::completion`]) are the single
/// place where `status` and `is_completed` are kept in agreement. The raw `with_*` setters write
/// exactly what they are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TaskPatch {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub title: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub status: Option<TaskStatus>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// Moves a task to `status`, setting the completion flag to match.
    pub fn move_to(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            is_completed: Some(status.is_completed()),
            ..Default::default()
        }
    }

    /// Marks a task complete or incomplete, landing on `completed` or `todo`.
    pub fn completion(completed: bool) -> Self {
        Self {
            status: Some(TaskStatus::for_completion(completed)),
            is_completed: Some(completed),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.is_completed = Some(completed);
        self
    }

    /// Returns `true` when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.is_completed.is_none()
    }

    /// Writes the supplied fields onto `task`, leaving the rest untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
    }
}

/// Failures every task operation can report, in the order they are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// No authenticated caller could be resolved.
    #[error("Authentication required to access this resource")]
    Unauthenticated,
    /// The task exists but belongs to someone else.
    #[error("You do not have access to this task")]
    Unauthorized,
    /// No task with the requested ID exists.
    #[error("Task not found")]
    NotFound,
}

impl TaskError {
    /// Stable error code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::Unauthenticated => "UNAUTHENTICATED",
            TaskError::Unauthorized => "UNAUTHORIZED",
            TaskError::NotFound => "NOT_FOUND",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "UNAUTHENTICATED" => Some(TaskError::Unauthenticated),
            "UNAUTHORIZED" => Some(TaskError::Unauthorized),
            "NOT_FOUND" => Some(TaskError::NotFound),
            _ => None,
        }
    }
}
