pub mod config;
pub mod errors;
pub mod handlers;
pub mod inference;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;
use std::time::Duration;
use axum::{
    routing::{get, post},
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
};
use tower_http::{
    services::ServeDir,
    limit::RequestBodyLimitLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tower_sessions::cookie::SameSite;
use crate::{
    config::Config,
    inference::ModelSet,
    services::{CredentialStore, PredictionService},
};

/// Shared by every handler. Models are loaded once and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: CredentialStore,
    pub predictor: PredictionService,
}

impl AppState {
    pub fn new(config: Config, models: ModelSet) -> Self {
        let credentials = CredentialStore::new(config.auth.users_file.clone(), config.auth.bcrypt_cost);
        let predictor = PredictionService::new(models, Duration::from_secs(config.prediction.timeout_secs));
        Self {
            config: Arc::new(config),
            credentials,
            predictor,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Session store setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_name("session");

    let max_file_size = state.config.upload.max_file_size;
    let static_dir = state.config.ui.static_dir.clone();

    Router::new()
        // Session flow
        .route("/", get(handlers::serve_index))
        .route("/login", post(handlers::handle_login))
        .route("/signup/start", post(handlers::open_signup))
        .route("/signup", post(handlers::handle_signup))
        .route("/signup/back", post(handlers::back_to_login))
        .route("/logout", get(handlers::handle_logout))

        // Prediction
        .route("/predict", post(handlers::process_predictions))
        .route("/predict/csv", post(handlers::download_predictions))

        .route("/health", get(handlers::health))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Add middleware
        .layer(from_fn(middleware::require_upload_access))
        .layer(session_layer)

        // Upload limit from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_file_size))

        .with_state(state)
}
