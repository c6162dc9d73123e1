use super::{ClientError, TaskEndpoints};
use crate::task::{Task, TaskId, TaskPatch};

/// Shown instead of the cards when the caller has no tasks.
pub const EMPTY_LIST_MESSAGE: &str = "No tasks yet. Create one to get started!";

/// The patch a completion checkbox click sends for `task`.
pub fn completion_toggle(task: &Task) -> TaskPatch {
    TaskPatch::completion(!task.is_completed)
}

/// Actions available from the list view cards.
pub struct TaskList<'a, E> {
    endpoints: &'a E,
}

impl<'a, E: TaskEndpoints> TaskList<'a, E> {
    pub fn new(endpoints: &'a E) -> Self {
        Self { endpoints }
    }

    /// Flips the completion flag of `task`, moving it to `completed` or back to `todo`.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn toggle_complete(&self, task: &Task) -> Result<(), ClientError> {
        self.endpoints
            .update(task.id, completion_toggle(task))
            .await
    }

    /// Deletes a task straight away. There is no undo.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TaskId) -> Result<(), ClientError> {
        self.endpoints.remove(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockTaskEndpoints;
    use crate::task::{TaskError, TaskStatus};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn open_task() -> Task {
        Task {
            id: TaskId::new(1),
            owner_id: "alice".to_string(),
            title: "Write report".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            is_completed: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn toggling_twice_returns_to_todo() {
        let mut task = open_task();

        completion_toggle(&task).apply_to(&mut task);
        assert!(task.is_completed);
        assert_eq!(task.status, TaskStatus::Completed);

        completion_toggle(&task).apply_to(&mut task);
        assert!(!task.is_completed);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn can_toggle_open_task_to_completed() {
        let mut endpoints = MockTaskEndpoints::new();
        endpoints
            .expect_update()
            .with(
                eq(TaskId::new(1)),
                eq(TaskPatch {
                    status: Some(TaskStatus::Completed),
                    is_completed: Some(true),
                    ..Default::default()
                }),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let list = TaskList::new(&endpoints);
        list.toggle_complete(&open_task()).await.unwrap();
    }

    #[tokio::test]
    async fn can_delete_task_immediately() {
        let mut endpoints = MockTaskEndpoints::new();
        endpoints
            .expect_remove()
            .with(eq(TaskId::new(1)))
            .times(1)
            .returning(|_| Ok(()));

        let list = TaskList::new(&endpoints);
        list.delete(TaskId::new(1)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_endpoint_errors() {
        let mut endpoints = MockTaskEndpoints::new();
        endpoints
            .expect_remove()
            .returning(|_| Err(ClientError::Task(TaskError::Unauthorized)));

        let list = TaskList::new(&endpoints);
        let result = list.delete(TaskId::new(1)).await;

        assert_eq!(result, Err(ClientError::Task(TaskError::Unauthorized)));
    }
}
