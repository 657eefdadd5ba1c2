use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use crate::{
    config::{Config, CorsConfig},
    domain::events::AppEvent,
    referral::{ReferralBonusGranter, ReferralDispatcher},
    repository::{MongoStore, Store},
    routes::{
        event::stream,
        health,
        referral::grant_referral_bonus,
        root,
        status::{create_status_check, get_status_checks},
        user::{create_user, get_user, get_user_transactions},
    },
};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    tx: broadcast::Sender<AppEvent>,
    granter: ReferralBonusGranter,
    referrals: ReferralDispatcher,
    pub config: Config,
}

impl AppState {
    /// Must be called inside a tokio runtime: the referral dispatcher is
    /// spawned here.
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let granter = ReferralBonusGranter::new(store.clone(), config.referral.bonus_amount);
        let (referrals, _handle) = ReferralDispatcher::spawn(granter.clone(), tx.clone());

        Self {
            store,
            tx,
            granter,
            referrals,
            config,
        }
    }

    pub fn get_store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn get_sender(&self) -> broadcast::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn granter(&self) -> &ReferralBonusGranter {
        &self.granter
    }

    pub fn referrals(&self) -> &ReferralDispatcher {
        &self.referrals
    }
}

pub struct Application;

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<()> {
        Self::setup_tracing(&config.application.log_level)?;

        let store = MongoStore::connect(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("mongodb connection failed: {:?}", e))?;
        store
            .initialize_indexes()
            .await
            .map_err(|e| anyhow::anyhow!("mongodb index setup failed: {:?}", e))?;

        let app_state = Arc::new(AppState::new(Arc::new(store), config.clone()));
        let app = Self::router(app_state);

        let ip = config.application.host.parse::<IpAddr>()?;
        let addr = SocketAddr::new(ip, config.application.port);
        tracing::info!("listening on {}", addr);
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }

    pub fn router(state: Arc<AppState>) -> Router {
        let cors = Self::cors_layer(&state.config.cors);
        let api = Router::new()
            .route("/", get(root))
            .route("/status", get(get_status_checks).post(create_status_check))
            .route("/users", post(create_user))
            .route("/users/:id", get(get_user))
            .route("/users/:id/transactions", get(get_user_transactions))
            .route("/referral-bonus", post(grant_referral_bonus))
            .route("/stream", get(stream));

        Router::new()
            .route("/health", get(health))
            .nest("/api", api)
            .with_state(state)
            .layer(cors)
    }

    fn cors_layer(cors: &CorsConfig) -> CorsLayer {
        if cors.is_permissive() {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("ignoring invalid cors origin >>> {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }

    fn setup_tracing(log_level: &str) -> anyhow::Result<()> {
        LogTracer::init().map_err(|e| anyhow::anyhow!("log bridge setup failed: {}", e))?;
        let subscriber = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| log_level.into()),
            )
            .with(tracing_subscriber::fmt::layer());
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}
