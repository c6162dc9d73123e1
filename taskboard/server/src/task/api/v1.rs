use super::TaskState;
use crate::auth::RequestAuth;
use crate::task::events::sse_response;
use crate::task::{TaskService, TaskServiceError};
use crate::web::api::ErrorResponse;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskboard_core::{NewTask, Task, TaskError, TaskId, TaskPatch, TaskStatus};
use utoipa::ToSchema;

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier for the task
    #[schema(value_type = i32)]
    pub id: TaskId,
    /// User that created and owns the task
    pub owner_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// One of `todo`, `in-progress`, `completed`
    #[schema(value_type = String, example = "todo")]
    pub status: TaskStatus,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            status: task.status,
            is_completed: task.is_completed,
            created_at: task.created_at,
        }
    }
}

/// API response for listing the caller's tasks.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksResponse {
    /// Tasks owned by the caller, oldest first
    pub tasks: Vec<TaskJson>,
    /// Total number of tasks
    pub count: usize,
}

/// JSON request payload for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, example = "todo")]
    pub status: TaskStatus,
    pub is_completed: bool,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(request: CreateTaskRequest) -> Self {
        NewTask {
            title: request.title,
            description: request.description,
            status: request.status,
            is_completed: request.is_completed,
        }
    }
}

/// JSON response for a created task.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskResponse {
    #[schema(value_type = i32)]
    pub id: TaskId,
}

/// JSON request payload for a partial update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "in-progress")]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(request: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: request.title,
            description: request.description,
            status: request.status,
            is_completed: request.is_completed,
        }
    }
}

impl IntoResponse for TaskServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            TaskServiceError::Access(TaskError::Unauthenticated) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(
                    TaskError::Unauthenticated.code(),
                    "Authentication required to access this resource",
                ),
            ),
            TaskServiceError::Access(TaskError::Unauthorized) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(
                    TaskError::Unauthorized.code(),
                    "You do not have access to this task",
                ),
            ),
            TaskServiceError::Access(TaskError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(TaskError::NotFound.code(), "Task not found"),
            ),
            TaskServiceError::Database(err) => {
                tracing::error!("Task request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks.
#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 401, description = "No valid bearer token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
) -> Result<Json<TasksResponse>, TaskServiceError> {
    auth.resolve_caller()?;

    let tasks: Vec<TaskJson> = TaskService::new(&state.db, &auth)
        .list_for_owner()
        .await?
        .into_iter()
        .map(TaskJson::from)
        .collect();
    let count = tasks.len();

    Ok(Json(TasksResponse { tasks, count }))
}

/// Handler for GET /api/v1/tasks/{id}
#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = TaskJson),
        (status = 401, description = "No valid bearer token", body = ErrorResponse),
        (status = 403, description = "Task belongs to another user", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskJson>, TaskServiceError> {
    auth.resolve_caller()?;

    let task = TaskService::new(&state.db, &auth).get_by_id(id).await?;
    Ok(Json(task.into()))
}

/// Handler for POST /api/v1/tasks
#[tracing::instrument(skip(state, auth, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = CreateTaskResponse),
        (status = 401, description = "No valid bearer token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), TaskServiceError> {
    auth.resolve_caller()?;

    let id = TaskService::new(&state.db, &auth)
        .with_events(&state.events)
        .create(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(CreateTaskResponse { id })))
}

/// Handler for PATCH /api/v1/tasks/{id}
#[tracing::instrument(skip(state, auth, payload))]
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 204, description = "Task updated"),
        (status = 401, description = "No valid bearer token", body = ErrorResponse),
        (status = 403, description = "Task belongs to another user", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
    Path(id): Path<TaskId>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<StatusCode, TaskServiceError> {
    auth.resolve_caller()?;

    TaskService::new(&state.db, &auth)
        .with_events(&state.events)
        .update(id, payload.into())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /api/v1/tasks/{id}
#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "No valid bearer token", body = ErrorResponse),
        (status = 403, description = "Task belongs to another user", body = ErrorResponse),
        (status = 404, description = "No such task", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, TaskServiceError> {
    auth.resolve_caller()?;

    TaskService::new(&state.db, &auth)
        .with_events(&state.events)
        .remove(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/v1/tasks/events - Streams changes to the caller's tasks.
///
/// Each change is sent as `event: created|updated|removed` with the task ID as data. A
/// `resync` event means changes were missed and the task list should be reloaded.
#[tracing::instrument(skip(state, auth))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/events",
    responses(
        (status = 200, description = "Server-sent event stream", content_type = "text/event-stream", body = String),
        (status = 401, description = "No valid bearer token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Tasks"
)]
pub async fn task_events_handler(
    State(state): State<Arc<TaskState>>,
    auth: RequestAuth,
) -> Result<Response, TaskServiceError> {
    auth.resolve_caller()?;

    let changes = TaskService::new(&state.db, &auth).watch(&state.events)?;
    Ok(sse_response(changes).into_response())
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route("/tasks/events", get(task_events_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .patch(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn access_errors_map_to_status_codes() {
        let cases = [
            (TaskError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (TaskError::Unauthorized, StatusCode::FORBIDDEN),
            (TaskError::NotFound, StatusCode::NOT_FOUND),
        ];

        for (error, expected) in cases {
            let response = TaskServiceError::from(error).into_response();
            assert_eq!(response.status(), expected);
            assert_eq!(body_json(response).await["error"], error.code());
        }
    }

    #[tokio::test]
    async fn database_errors_hide_details() {
        let error = TaskServiceError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An unexpected error occurred");
    }

    #[test]
    fn can_convert_update_request_to_patch() {
        let request: UpdateTaskRequest =
            serde_json::from_str(r#"{"status":"completed"}"#).unwrap();
        let patch = TaskPatch::from(request);

        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert_eq!(patch.is_completed, None);
        assert_eq!(patch.title, None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let request = serde_json::from_str::<CreateTaskRequest>(
            r#"{"title":"x","status":"blocked","isCompleted":false}"#,
        );
        assert!(request.is_err());
    }
}
