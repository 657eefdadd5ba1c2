use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use referral_server::{
    app::{AppState, Application},
    config::{ApplicationConfig, Config, CorsConfig, DatabaseConfig, ReferralConfig},
    repository::MemoryStore,
};
use secrecy::Secret;
use serde_json::Value;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn test_config() -> Config {
    Config {
        application: ApplicationConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: "info".to_string(),
        },
        database: DatabaseConfig {
            uri: Secret::new("mongodb://localhost:27017".to_string()),
            name: "referral_test".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
        referral: ReferralConfig::default(),
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(store.clone(), test_config()));
        let router = Application::router(state);
        TestApp { router, store }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn register(&self, username: &str, referred_by: Option<&str>) -> Value {
        let (status, body) = self
            .post(
                "/api/users",
                serde_json::json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "hunter2",
                    "referred_by": referred_by,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "registration failed: {}", body);
        body
    }

    pub async fn balance(&self, id: &str) -> f64 {
        let (status, body) = self.get(&format!("/api/users/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        body["balance"].as_f64().unwrap()
    }

    /// Polls until the background dispatcher has moved the balance.
    pub async fn wait_for_balance(&self, id: &str, expected: f64) -> f64 {
        let mut balance = self.balance(id).await;
        for _ in 0..100 {
            if balance == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            balance = self.balance(id).await;
        }
        balance
    }
}
