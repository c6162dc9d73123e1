use axum::http::{Method, StatusCode};
use insta::assert_yaml_snapshot;
use serde_json::json;
use taskboard_server::auth::decode_jwt;

mod common;

use common::{ErrorSnapshot, JWT_SECRET, api_app, send};

#[tokio::test]
async fn can_login_with_valid_credentials() {
    let (app, _) = api_app(common::setup_sqlite().await.unwrap());

    let response = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "username": "admin", "password": "password" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let token = response.json()["token"].as_str().unwrap().to_string();
    let claims = decode_jwt(&token, JWT_SECRET).unwrap();
    assert_eq!(claims.sub, "admin");
}

#[tokio::test]
async fn issued_token_grants_access_to_tasks() {
    let (app, _) = api_app(common::setup_sqlite().await.unwrap());
    let login = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "username": "admin", "password": "password" })),
    )
    .await;
    let token = login.json()["token"].as_str().unwrap().to_string();

    let request = axum::http::Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn can_reject_invalid_credentials() {
    let (app, _) = api_app(common::setup_sqlite().await.unwrap());

    let response = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;

    assert_yaml_snapshot!(ErrorSnapshot::from(&response), @r###"
    status: 401
    body:
      error: INVALID_CREDENTIALS
      message: Invalid username or password
    "###);
}

#[tokio::test]
async fn unknown_user_cannot_login() {
    let (app, _) = api_app(common::setup_sqlite().await.unwrap());

    let response = send(
        &app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(json!({ "username": "alice", "password": "password" })),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
