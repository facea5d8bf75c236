// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use workout_tracker::config::Config;
use workout_tracker::db::{Database, FirestoreDb, MemoryDb};
use workout_tracker::routes::create_router;
use workout_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Database::Memory(MemoryDb::new())));
    (create_router(state.clone()), state)
}

/// Create a test app whose Firestore client is offline.
#[allow(dead_code)]
pub fn create_offline_test_app() -> Router {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Database::Firestore(FirestoreDb::new_mock()),
    ));
    create_router(state)
}

/// Send a request with an optional JSON body and bearer token.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as text.
#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Sign up and log in, returning a session token.
#[allow(dead_code)]
pub async fn login_token(app: &Router, username: &str) -> String {
    let credentials = json!({ "username": username, "password": "correct horse" });

    let response = send(app, "POST", "/auth/signup", None, Some(credentials.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(app, "POST", "/auth/login", None, Some(credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);

    session_cookie(&response).expect("login should set the session cookie")
}

/// Value of the session cookie set by a response, if any.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("workout_token="))
        .map(|rest| rest.split(';').next().unwrap_or("").to_string())
}

/// JSON body for a log entry.
#[allow(dead_code)]
pub fn entry(date: &str, body_part: &str, exercise: &str, reps: &str, weight: &str) -> Value {
    json!({
        "date": date,
        "body_part": body_part,
        "exercise": exercise,
        "reps": reps,
        "weight": weight,
    })
}
