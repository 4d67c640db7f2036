use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::env;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use flatmart::config::Config;
use flatmart::database::{init_db, AppState};
use flatmart::notifier::LogNotifier;
use flatmart::route::create_app;

// Mutex to ensure tests that modify env vars don't run in parallel
static ENV_MUTEX: Mutex<()> = Mutex::new(());

async fn setup_test_app(admin_token: Option<&str>) -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = init_db(temp_dir.path())
        .await
        .expect("Failed to initialize test data directory");
    let state = AppState::new(db, Arc::new(LogNotifier))
        .with_admin_token(admin_token.map(str::to_string));
    (create_app(state), temp_dir)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

fn add_product_request(token: Option<&str>) -> Request<Body> {
    let payload = json!({
        "id": "101-001",
        "name": "Kandura",
        "price": "49.99",
        "quantity": 5,
        "description": "White"
    });
    let mut request = Request::builder()
        .method("POST")
        .uri("/addProduct")
        .header("content-type", "application/json");
    if let Some(token) = token {
        request = request.header("Authorization", token);
    }
    request.body(Body::from(payload.to_string())).unwrap()
}

#[tokio::test]
async fn test_admin_route_valid_token() {
    let (app, _temp_dir) = setup_test_app(Some("secret_token")).await;

    let response = app
        .oneshot(add_product_request(Some("secret_token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_admin_route_invalid_token() {
    let (app, _temp_dir) = setup_test_app(Some("secret_token")).await;

    let response = app
        .oneshot(add_product_request(Some("wrong_token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_route_missing_token() {
    let (app, _temp_dir) = setup_test_app(Some("secret_token")).await;

    let response = app
        .clone()
        .oneshot(add_product_request(None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/analytics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_routes_ignore_token() {
    let (app, _temp_dir) = setup_test_app(Some("secret_token")).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_open_without_token() {
    let (app, _temp_dir) = setup_test_app(None).await;

    let response = app.oneshot(add_product_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_token_disables_guard() {
    let (app, _temp_dir) = setup_test_app(Some("")).await;

    let response = app.oneshot(add_product_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[test]
fn test_config_reads_environment() {
    let _guard = ENV_MUTEX.lock().unwrap();
    env::set_var("HOST", "127.0.0.1");
    env::set_var("PORT", "9090");
    env::set_var("DATA_DIR", "/tmp/flatmart-test");
    env::set_var("AUTHORIZATION", "secret_token");

    let config = Config::from_env().unwrap();

    assert_eq!(config.addr().to_string(), "127.0.0.1:9090");
    assert_eq!(config.data_dir.to_str(), Some("/tmp/flatmart-test"));
    assert_eq!(config.admin_token.as_deref(), Some("secret_token"));

    env::remove_var("HOST");
    env::remove_var("PORT");
    env::remove_var("DATA_DIR");
    env::remove_var("AUTHORIZATION");
}

#[test]
fn test_config_rejects_bad_port() {
    let _guard = ENV_MUTEX.lock().unwrap();
    env::set_var("PORT", "not-a-port");

    let result = Config::from_env();

    env::remove_var("PORT");
    assert!(result.is_err());
}
