use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    task::{self, TaskState},
};

use axum::{Router, middleware::from_fn_with_state};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// JSON body returned for every failed API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `NOT_FOUND`
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        task::api::v1::list_tasks_handler,
        task::api::v1::get_task_handler,
        task::api::v1::create_task_handler,
        task::api::v1::update_task_handler,
        task::api::v1::delete_task_handler,
        task::api::v1::task_events_handler,
    ),
    components(schemas(
        ErrorResponse,
        auth::api::v1::JsonLoginRequest,
        auth::api::v1::LoginResponse,
        task::api::v1::TaskJson,
        task::api::v1::TasksResponse,
        task::api::v1::CreateTaskRequest,
        task::api::v1::CreateTaskResponse,
        task::api::v1::UpdateTaskRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Bearer token issuance"),
        (name = "Tasks", description = "Tasks owned by the calling user")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Creates the API routes for JSON API endpoints.
///
/// Every route sits behind the bearer token middleware, which only identifies the caller.
/// Whether a caller is required is decided by each endpoint.
pub fn create_api_router(auth_state: Arc<AuthState>, task_state: Arc<TaskState>) -> Router {
    let login_router = auth::api::v1::create_api_router(auth_state.clone());
    let tasks_router = task::api::v1::create_api_router(task_state);
    let api_routes = login_router.merge(tasks_router);
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::auth_user_middleware,
        )))
}
