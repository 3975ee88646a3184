// Library exports for testing and external use

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use models::errors::AppError;
use services::auth_service::AuthService;
use services::document_store::DocumentStore;
use services::inventory_service::InventoryService;
use services::rate_limiter::{RateLimitConfig, RateLimiter};
use services::token_service::TokenService;
use utils::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub inventory: Arc<InventoryService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Opens the configured store and wires the services around it
    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let store = match &config.data_dir {
            Some(dir) => DocumentStore::open(dir).await?,
            None => DocumentStore::in_memory(),
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: AppConfig, store: DocumentStore) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiry_minutes);
        let auth = AuthService::new(store.users.clone(), tokens, config.bcrypt_cost);
        let inventory = InventoryService::new(store.inventories.clone(), config.cache_ttl());
        let rate_limiter = RateLimiter::with_config(RateLimitConfig {
            max_requests: config.rate_limit_max_requests,
            window_duration: config.rate_limit_window(),
        });

        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            inventory: Arc::new(inventory),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}

/// Builds the full API router with its middleware stack
pub fn build_router(app_state: AppState) -> Router {
    let protect = || axum::middleware::from_fn_with_state(app_state.clone(), middleware::auth::protect);

    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/verify", post(handlers::auth::verify));

    let user_routes = Router::new()
        .route("/get-me", get(handlers::users::get_me).route_layer(protect()));

    let inventory_routes = Router::new()
        .route(
            "/",
            get(handlers::inventory::list_inventories).post(handlers::inventory::create_inventory),
        )
        .route("/scan", post(handlers::inventory::scan_inventory))
        .route(
            "/:id",
            get(handlers::inventory::get_inventory)
                .put(handlers::inventory::update_inventory)
                .merge(delete(handlers::inventory::delete_inventory).route_layer(protect())),
        )
        .route("/:id/qr", get(handlers::inventory::inventory_qr_payload))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit::rate_limit,
        ));

    let config = app_state.config.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/health", get(handlers::health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/inventory", inventory_routes)
        .with_state(app_state)
        .layer(
            // Layers that need a `Default` response body (timeout, CORS preflight)
            // must sit inside the ones that rewrap it (limit, compression)
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(CompressionLayer::new())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(cors_layer(&config))
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_seconds))),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
