use super::TaskEndpoints;
use crate::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

/// Result of submitting the dialog form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The title was blank, or the dialog is not open; no request was sent.
    Rejected,
    /// A new task was created and the dialog closed.
    Created(TaskId),
    /// The bound task was updated and the dialog closed.
    Updated,
    /// The request failed; the error was logged and the dialog stays open.
    Failed,
}

/// The create/edit form. Bound to one existing task, or blank for creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDialog {
    open: bool,
    editing: Option<TaskId>,
    title: String,
    description: String,
    status: TaskStatus,
}

impl TaskDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a blank form for a new task.
    pub fn open_for_create(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    /// Opens the form pre-filled from `task`.
    pub fn open_for_edit(&mut self, task: &Task) {
        *self = Self {
            open: true,
            editing: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
        };
    }

    /// Closes the form without sending anything.
    pub fn close(&mut self) {
        self.open = false;
        self.editing = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Task"
        } else {
            "Create New Task"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Update"
        } else {
            "Create"
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Validates and sends the form.
    ///
    /// Title and description are trimmed and a blank description is sent as absent. The
    /// completion flag always follows the chosen status. Failures are logged, never returned.
    #[tracing::instrument(skip(self, endpoints), fields(editing = ?self.editing))]
    pub async fn submit<E: TaskEndpoints>(&mut self, endpoints: &E) -> SubmitOutcome {
        if !self.open {
            return SubmitOutcome::Rejected;
        }

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return SubmitOutcome::Rejected;
        }

        let description = Some(self.description.trim())
            .filter(|description| !description.is_empty())
            .map(str::to_string);

        let result = match self.editing {
            Some(id) => {
                let patch = TaskPatch::move_to(self.status)
                    .with_title(title)
                    .with_description(description);
                endpoints
                    .update(id, patch)
                    .await
                    .map(|()| SubmitOutcome::Updated)
            }
            None => {
                let new_task = NewTask::new(title)
                    .with_description(description)
                    .with_status(self.status);
                endpoints
                    .create(new_task)
                    .await
                    .map(SubmitOutcome::Created)
            }
        };

        match result {
            Ok(outcome) => {
                self.close();
                outcome
            }
            Err(err) => {
                tracing::error!("Error saving task: {}", err);
                SubmitOutcome::Failed
            }
        }
    }
}
