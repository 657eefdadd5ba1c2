use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    app::AppState,
    domain::{errors::ApiError, fields::StatusCheck, model::StatusCheckDocument},
};

const STATUS_CHECK_LIMIT: i64 = 1000;

#[derive(Deserialize)]
pub struct CreateStatusCheck {
    client_name: String,
}

pub async fn create_status_check(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateStatusCheck>,
) -> Result<Json<StatusCheck>, ApiError> {
    let check = StatusCheckDocument::new(payload.client_name);
    state.get_store().insert_status_check(&check).await?;
    Ok(Json(check.into()))
}

pub async fn get_status_checks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    let checks = state
        .get_store()
        .list_status_checks(STATUS_CHECK_LIMIT)
        .await?;
    Ok(Json(checks.into_iter().map(StatusCheck::from).collect()))
}
