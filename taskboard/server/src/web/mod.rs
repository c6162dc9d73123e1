use axum::Router;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthState, FilteredMakeSpan};
use crate::config::Config;
use crate::task::TaskState;

pub mod api;

/// Builds the full application router from an already migrated database connection.
pub fn create_app(config: &Config, db: DatabaseConnection) -> Router {
    let auth_state = Arc::new(AuthState::from_config(config));
    let task_state = Arc::new(TaskState::new(db));

    let public_routes = Router::new().route("/health", axum::routing::get(health_check_handler));

    Router::new()
        .merge(public_routes)
        .merge(api::create_api_router(auth_state, task_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    serve(listener, &config, db).await
}

/// Serves the application on an already bound listener until it fails.
pub async fn serve(
    listener: TcpListener,
    config: &Config,
    db: DatabaseConnection,
) -> anyhow::Result<()> {
    let app = create_app(config, db);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            db_url: "sqlite::memory:".to_string(),
            port: 8080,
            admin_username: "admin".to_string(),
            admin_password: "password".to_string(),
            jwt_secret: "test_secret".to_string(),
        }
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let (status, body) = get(create_app(&test_config(), db), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let (status, body) = get(create_app(&test_config(), db), "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/api/v1/tasks/{id}"].is_object());
    }
}
