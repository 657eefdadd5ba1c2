mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn referred_registration_grants_bonus_once() {
    let app = TestApp::spawn();
    let alice = app.register("alice", None).await;
    let alice_id = alice["id"].as_str().unwrap();
    assert_eq!(alice["balance"], 5000.0);

    let bob = app.register("bob", Some(alice_id)).await;
    let bob_id = bob["id"].as_str().unwrap();
    assert_eq!(bob["balance"], 5000.0);
    assert_eq!(bob["referred_by"], alice_id);

    assert_eq!(app.wait_for_balance(alice_id, 5500.0).await, 5500.0);
    assert_eq!(app.store.bonus_count().await, 1);

    let (status, body) = app
        .post(
            "/api/referral-bonus",
            json!({ "user_id": alice_id, "referred_user_id": bob_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Referral bonus already granted for this user");
    assert_eq!(body["bonus_amount"], 0.0);

    assert_eq!(app.balance(alice_id).await, 5500.0);
    assert_eq!(app.store.bonus_count().await, 1);
    assert_eq!(app.store.transaction_count().await, 1);
}

#[tokio::test]
async fn mismatched_referrer_is_rejected() {
    let app = TestApp::spawn();
    let alice = app.register("alice", None).await;
    let carol = app.register("carol", None).await;
    let bob = app
        .register("bob", Some(alice["id"].as_str().unwrap()))
        .await;
    let carol_id = carol["id"].as_str().unwrap();

    let (status, body) = app
        .post(
            "/api/referral-bonus",
            json!({ "user_id": carol_id, "referred_user_id": bob["id"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid referral or user not found");
    assert_eq!(app.balance(carol_id).await, 5000.0);
}

#[tokio::test]
async fn unknown_referred_user_is_rejected() {
    let app = TestApp::spawn();
    let alice = app.register("alice", None).await;

    let (status, body) = app
        .post(
            "/api/referral-bonus",
            json!({ "user_id": alice["id"], "referred_user_id": "nobody" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(app.store.bonus_count().await, 0);
    assert_eq!(app.store.transaction_count().await, 0);
}

#[tokio::test]
async fn transaction_history_lists_the_bonus() {
    let app = TestApp::spawn();
    let alice = app.register("alice", None).await;
    let alice_id = alice["id"].as_str().unwrap();
    let bob = app.register("bob", Some(alice_id)).await;
    app.wait_for_balance(alice_id, 5500.0).await;

    let (status, history) = app
        .get(&format!("/api/users/{}/transactions", alice_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["type"], "referral_bonus");
    assert_eq!(history[0]["amount"], 500.0);
    assert_eq!(history[0]["balance_after"], 5500.0);
    assert_eq!(
        history[0]["description"],
        format!("Referral bonus for user {}", bob["id"].as_str().unwrap())
    );
}
