#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use inventory_tracker::{build_router, utils::config::AppConfig, AppState};

pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const TEST_PASSWORD: &str = "Passw0rd";

/// Configuration tuned for fast tests: cheap bcrypt, fixed secret, in-memory store
pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

/// Setup a test application backed by an in-memory store
pub async fn setup_test_app() -> (Router, AppState) {
    setup_test_app_with(test_config()).await
}

pub async fn setup_test_app_with(config: AppConfig) -> (Router, AppState) {
    let app_state = AppState::from_config(config)
        .await
        .expect("Failed to build application state");
    (build_router(app_state.clone()), app_state)
}

/// Response pieces the tests care about
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send a request with an optional JSON body and bearer token
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().uri(uri).method(method);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };

    TestResponse { status, headers, body }
}

pub async fn register(app: &Router, name: &str, email: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "name": name, "email": email, "password": TEST_PASSWORD })),
        None,
    )
    .await
}

pub async fn login(app: &Router, email: &str, password: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": email, "password": password })),
        None,
    )
    .await
}

/// Registers a user and returns `(token, user_id)`
pub async fn register_and_login(app: &Router, email: &str) -> (String, String) {
    let registered = register(app, "Test User", email).await;
    assert_eq!(registered.status, StatusCode::CREATED);

    let logged_in = login(app, email, TEST_PASSWORD).await;
    assert_eq!(logged_in.status, StatusCode::OK);

    (
        logged_in.body["token"].as_str().unwrap().to_string(),
        logged_in.body["user_id"].as_str().unwrap().to_string(),
    )
}

/// Creates an inventory record and returns its JSON view
pub async fn create_inventory(app: &Router, name: &str, quantity: u64) -> Value {
    let response = send(
        app,
        Method::POST,
        "/api/inventory",
        Some(json!({ "name": name, "date": "2024-06-01", "quantity": quantity })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.body
}
