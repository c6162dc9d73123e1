use super::{ClientError, TaskEndpoints};
use crate::task::{Task, TaskId, TaskPatch, TaskStatus};

/// One board column and the tasks currently in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

impl Column<'_> {
    /// Column id, identical to the status wire value.
    pub fn id(&self) -> &'static str {
        self.status.as_str()
    }

    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

/// Groups tasks into the three fixed columns, keeping their relative order.
pub fn columns(tasks: &[Task]) -> Vec<Column<'_>> {
    TaskStatus::ALL
        .into_iter()
        .map(|status| Column {
            status,
            tasks: tasks.iter().filter(|task| task.status == status).collect(),
        })
        .collect()
}

/// Maps whatever was under the pointer on drop to a column, if it was one.
pub fn resolve_drop_target(over: Option<&str>) -> Option<TaskStatus> {
    over.and_then(|id| id.parse().ok())
}

/// What a finished drag did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// One update was sent moving the task between columns.
    Moved { from: TaskStatus, to: TaskStatus },
    /// Dropped back on its own column; nothing was sent.
    SameColumn,
    /// No column under the pointer, or the dragged task is gone; nothing was sent.
    Discarded,
}

/// Kanban board state: the tasks on display and the card being dragged.
pub struct KanbanBoard<'a, E> {
    endpoints: &'a E,
    tasks: Vec<Task>,
    dragged: Option<TaskId>,
}

impl<'a, E: TaskEndpoints> KanbanBoard<'a, E> {
    pub fn new(endpoints: &'a E, tasks: Vec<Task>) -> Self {
        Self {
            endpoints,
            tasks,
            dragged: None,
        }
    }

    /// Replaces the displayed tasks with a fresh query result.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn columns(&self) -> Vec<Column<'_>> {
        columns(&self.tasks)
    }

    pub fn start_drag(&mut self, id: TaskId) {
        self.dragged = Some(id);
    }

    pub fn dragged(&self) -> Option<TaskId> {
        self.dragged
    }

    /// Finishes the current drag over `over` (the id of the element under the pointer).
    ///
    /// Sends at most one update, and only when the task lands in a different column.
    #[tracing::instrument(skip(self))]
    pub async fn end_drag(&mut self, over: Option<&str>) -> Result<DropOutcome, ClientError> {
        let dragged = self.dragged.take();

        let Some(target) = resolve_drop_target(over) else {
            tracing::debug!("Drop outside of any column, discarding");
            return Ok(DropOutcome::Discarded);
        };

        let Some(task) = dragged.and_then(|id| self.tasks.iter_mut().find(|task| task.id == id))
        else {
            return Ok(DropOutcome::Discarded);
        };

        if task.status == target {
            return Ok(DropOutcome::SameColumn);
        }

        let from = task.status;
        let patch = TaskPatch::move_to(target);
        self.endpoints.update(task.id, patch.clone()).await?;
        // The board shows the move until the next refresh replaces its tasks.
        patch.apply_to(task);
        Ok(DropOutcome::Moved { from, to: target })
    }

    /// Deletes a card from the board. There is no undo.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        self.endpoints.remove(id).await
    }
}
