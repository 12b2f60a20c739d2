use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::clients::identity::HttpIdentityProvider;
use crate::config::Config;
use crate::db::Store;
use crate::identity::IdentityProvider;
use crate::services::{ProfileService, SeaOrmProfileService};
use metrics_exporter_prometheus::PrometheusHandle;

pub mod auth;
mod error;
mod observability;
pub mod profiles;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub identity: Arc<dyn IdentityProvider>,

    pub profile_service: Arc<dyn ProfileService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Wires the state around an already-built identity provider.
pub async fn create_app_state(
    config: Config,
    identity: Arc<dyn IdentityProvider>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let profile_service = Arc::new(SeaOrmProfileService::new(
        store.clone(),
        identity.clone(),
        config.identity.sign_in_url.clone(),
    )) as Arc<dyn ProfileService + Send + Sync + 'static>;

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        store,
        identity,
        profile_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let identity = Arc::new(HttpIdentityProvider::new(&config.identity)?)
        as Arc<dyn IdentityProvider + Send + Sync + 'static>;
    create_app_state(config, identity, prometheus_handle).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let api_router = Router::new()
        .route("/profile", get(profiles::get_current_profile))
        .route("/auth/session", post(auth::create_session))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics));

    let cors_origins = &server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(profiles::home_page))
        .nest("/api", api_router)
        .layer(session_layer)
        .with_state(state.clone())
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}
