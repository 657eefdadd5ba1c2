use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{
    app::AppState,
    domain::{
        events::{AppEvent, ReferralBonusEvent},
        fields::UserId,
    },
    referral::{BonusOutcome, ReferralBonusResponse},
};

#[derive(Deserialize)]
pub struct ReferralBonusRequest {
    user_id: UserId,
    referred_user_id: UserId,
}

/// Business failures come back as `success: false` with a 200.
pub async fn grant_referral_bonus(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReferralBonusRequest>,
) -> Json<ReferralBonusResponse> {
    tracing::info!(
        "referral bonus requested >>> {} for {}",
        payload.user_id,
        payload.referred_user_id
    );

    let outcome = match state
        .granter()
        .grant(&payload.user_id, &payload.referred_user_id)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = ?e, "granting referral bonus failed");
            return Json(ReferralBonusResponse::store_failure());
        }
    };

    if let BonusOutcome::Granted {
        bonus_amount,
        balance_after,
    } = outcome
    {
        let _ = state
            .get_sender()
            .send(AppEvent::ReferralBonusGranted(ReferralBonusEvent {
                referrer: payload.user_id,
                referred_user: payload.referred_user_id,
                bonus_amount,
                balance_after,
            }));
    }

    Json(outcome.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        repository::faulty::{trip, FaultyStore},
        routes::test_support::{post_json, router},
    };

    #[tokio::test]
    async fn store_failure_is_reported_as_unsuccessful() {
        let store = Arc::new(FaultyStore::new());
        let app = router(store.clone());
        trip(&store.faults.referral_lookup);

        let (status, body) = post_json(
            &app,
            "/api/referral-bonus",
            json!({ "user_id": "a", "referred_user_id": "b" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "An error occurred while processing the referral bonus"
        );
        assert_eq!(body["bonus_amount"], 0.0);
    }
}
