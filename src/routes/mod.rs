use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.get_store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": "API up!",
            })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "message": "Database unavailable",
            })),
        ),
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

pub mod event;
pub mod referral;
pub mod status;
pub mod user;
