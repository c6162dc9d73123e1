use crate::auth::{CurrentUser, RequestAuth};
use crate::entities::{sea_orm_active_enums, task};
use chrono::Utc;
use futures::Stream;
use sea_orm::*;
use taskboard_core::{NewTask, Task, TaskError, TaskId, TaskPatch, TaskStatus};

pub mod api;
pub mod events;

pub use api::TaskState;
pub use events::{ChangeKind, TaskChange, TaskChangeEvent, TaskEvents};

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// The caller is missing, or not allowed to see the task, or the task does not exist.
    #[error(transparent)]
    Access(#[from] TaskError),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<sea_orm_active_enums::TaskStatus> for TaskStatus {
    fn from(status: sea_orm_active_enums::TaskStatus) -> Self {
        match status {
            sea_orm_active_enums::TaskStatus::Todo => TaskStatus::Todo,
            sea_orm_active_enums::TaskStatus::InProgress => TaskStatus::InProgress,
            sea_orm_active_enums::TaskStatus::Completed => TaskStatus::Completed,
        }
    }
}

impl From<TaskStatus> for sea_orm_active_enums::TaskStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => sea_orm_active_enums::TaskStatus::Todo,
            TaskStatus::InProgress => sea_orm_active_enums::TaskStatus::InProgress,
            TaskStatus::Completed => sea_orm_active_enums::TaskStatus::Completed,
        }
    }
}

fn task_from_model(model: task::Model) -> Task {
    Task {
        id: TaskId::new(model.id),
        owner_id: model.owner_id,
        title: model.title,
        description: model.description,
        status: model.status.into(),
        is_completed: model.is_completed,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

/// Data access for tasks, enforcing that callers only ever touch their own tasks.
///
/// Every operation resolves the caller from the request's [`RequestAuth`] itself, whether or
/// not the endpoint in front of it already did.
pub struct TaskService<'a> {
    db: &'a DatabaseConnection,
    auth: &'a RequestAuth,
    events: Option<&'a TaskEvents>,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a DatabaseConnection, auth: &'a RequestAuth) -> TaskService<'a> {
        TaskService {
            db,
            auth,
            events: None,
        }
    }

    /// Publishes a change notification after every successful mutation.
    pub fn with_events(mut self, events: &'a TaskEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Retrieves all tasks owned by the caller, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_owner(&self) -> Result<Vec<Task>, TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        let tasks = task::Entity::find()
            .filter(task::Column::OwnerId.eq(caller.user_id.as_str()))
            .order_by_asc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(task_from_model)
            .collect();
        Ok(tasks)
    }

    /// Retrieves one task by its ID.
    ///
    /// # Returns
    ///
    /// `NotFound` if no task has this ID, otherwise `Unauthorized` if the caller does not own it.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        let model = self.find_owned(id, caller).await?;
        Ok(task_from_model(model))
    }

    /// Creates a new task owned by the caller and returns its ID.
    #[tracing::instrument(skip(self, new_task), fields(title = %new_task.title))]
    pub async fn create(&self, new_task: NewTask) -> Result<TaskId, TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        let active_model = task::ActiveModel {
            owner_id: ActiveValue::Set(caller.user_id.clone()),
            title: ActiveValue::Set(new_task.title),
            description: ActiveValue::Set(new_task.description),
            status: ActiveValue::Set(new_task.status.into()),
            is_completed: ActiveValue::Set(new_task.is_completed),
            created_at: ActiveValue::Set(Utc::now().into()),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        let id = TaskId::new(created_model.id);

        tracing::info!("Created task {}", id);
        self.publish(caller, id, ChangeKind::Created);
        Ok(id)
    }

    /// Applies exactly the supplied fields of `patch` to a task owned by the caller.
    ///
    /// Status and completion flag are written independently; nothing here keeps them in step.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<(), TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        let existing = self.find_owned(id, caller).await?;

        if patch.is_empty() {
            return Ok(());
        }

        let mut active_model: task::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = patch.description {
            active_model.description = ActiveValue::Set(Some(description));
        }
        if let Some(status) = patch.status {
            active_model.status = ActiveValue::Set(status.into());
        }
        if let Some(is_completed) = patch.is_completed {
            active_model.is_completed = ActiveValue::Set(is_completed);
        }
        active_model.update(self.db).await?;

        self.publish(caller, id, ChangeKind::Updated);
        Ok(())
    }

    /// Deletes a task owned by the caller.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: TaskId) -> Result<(), TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        self.find_owned(id, caller).await?;

        task::Entity::delete_by_id(id.get()).exec(self.db).await?;

        tracing::info!("Removed task {}", id);
        self.publish(caller, id, ChangeKind::Removed);
        Ok(())
    }

    /// Subscribes to changes made to the caller's tasks from now on.
    pub fn watch(
        &self,
        events: &TaskEvents,
    ) -> Result<impl Stream<Item = TaskChangeEvent> + Send + use<>, TaskServiceError> {
        let caller = self.auth.resolve_caller()?;
        tracing::info!("User '{}' subscribed to task changes", caller.user_id);
        Ok(events.owner_stream(caller.user_id.clone()))
    }

    /// Loads a task and checks it belongs to `caller`. Existence is checked before ownership.
    async fn find_owned(
        &self,
        id: TaskId,
        caller: &CurrentUser,
    ) -> Result<task::Model, TaskServiceError> {
        let model = task::Entity::find_by_id(id.get())
            .one(self.db)
            .await?
            .ok_or(TaskError::NotFound)?;

        if model.owner_id != caller.user_id {
            tracing::warn!(
                "User '{}' attempted to access task {} owned by someone else",
                caller.user_id,
                id
            );
            return Err(TaskError::Unauthorized.into());
        }

        Ok(model)
    }

    fn publish(&self, caller: &CurrentUser, task_id: TaskId, kind: ChangeKind) {
        if let Some(events) = self.events {
            events.publish(TaskChange {
                owner_id: caller.user_id.clone(),
                task_id,
                kind,
            });
        }
    }
}
