use std::sync::Arc;

use crate::{
    app::AppState,
    domain::{
        errors::ApiError,
        events::AppEvent,
        fields::{Email, Transaction, User, UserId, Username},
        model::UserDocument,
    },
    referral::ReferralJob,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    username: Username,
    email: Email,
    password: String,
    referred_by: Option<UserId>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let store = state.get_store();
    tracing::info!("registering user >>> {}", payload.username);

    if store.find_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::UserExists);
    }

    let referred_by = payload.referred_by.filter(|r| !r.as_ref().is_empty());
    let user = UserDocument::new(
        payload.username,
        payload.email,
        payload.password,
        state.config.referral.starting_balance,
        referred_by,
    );
    store.insert_user(&user).await?;

    if let Some(referrer) = &user.referred_by {
        state.referrals().dispatch(ReferralJob {
            referrer: referrer.clone(),
            referred_user: user.id.clone(),
        });
    }

    let user = User::from(user);
    let _ = state.get_sender().send(AppEvent::NewRegister(user.clone()));
    Ok(Json(user))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = UserId::from(id);
    let user = state
        .get_store()
        .find_user(&id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}

pub async fn get_user_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let id = UserId::from(id);
    let store = state.get_store();
    if store.find_user(&id).await?.is_none() {
        return Err(ApiError::UserNotFound);
    }

    let entries = store.transactions_for(&id).await?;
    Ok(Json(entries.into_iter().map(Transaction::from).collect()))
}
