#![allow(dead_code)] // each test binary uses a different subset of these helpers

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Serialize;
use std::sync::Arc;
use taskboard_server::auth::{AuthState, encode_jwt};
use taskboard_server::config::Config;
use taskboard_server::task::TaskState;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "some_secret";

pub fn test_config() -> Config {
    Config {
        db_url: "sqlite::memory:".to_string(),
        port: 8080,
        admin_username: "admin".to_string(),
        admin_password: "password".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
    }
}

/// Opens a fresh, migrated in-memory SQLite database.
///
/// The pool is pinned to a single connection because every SQLite memory connection is its own
/// database.
pub async fn setup_sqlite() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Router for `/api/v1` backed by `db`, plus the task state so tests can subscribe to changes.
pub fn api_app(db: DatabaseConnection) -> (axum::Router, Arc<TaskState>) {
    let auth_state = Arc::new(AuthState::from_config(&test_config()));
    let task_state = Arc::new(TaskState::new(db));
    let app = taskboard_server::web::api::create_api_router(auth_state, task_state.clone());
    (app, task_state)
}

pub fn bearer(user_id: &str) -> String {
    let token = encode_jwt(user_id.to_string(), JWT_SECRET).unwrap();
    format!("Bearer {}", token)
}

/// A response with its body read out.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Sends one request to `app`, optionally as `user` and optionally with a JSON body.
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<serde_json::Value>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("authorization", bearer(user));
    }
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        content_type,
        body: body.to_vec(),
    }
}

/// Snapshot of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorSnapshot {
    pub status: u16,
    pub body: serde_json::Value,
}

impl From<&TestResponse> for ErrorSnapshot {
    fn from(response: &TestResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            body: response.json(),
        }
    }
}
