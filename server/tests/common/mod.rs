use axum::Router;
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use task_tracker_server::task::MockTaskStore;
use task_tracker_server::web::{AppState, create_app};

/// Build the application router over a stubbed task store.
pub fn test_app(store: MockTaskStore) -> Router {
    let state = AppState {
        store: Arc::new(store),
    };
    create_app(state, "static")
}

/// Collect a response into its status code and parsed JSON body.
pub async fn response_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}
