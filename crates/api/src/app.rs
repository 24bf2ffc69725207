use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::lifecycle::ReservationEngine;
use shared::token::TokenSigner;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_admin, require_user_auth};
use crate::routes::{admin_reservations, admin_resources, admin_users, auth, health, reservations};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub engine: Arc<ReservationEngine>,
    pub token_signer: Arc<TokenSigner>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    engine: Arc<ReservationEngine>,
    token_signer: TokenSigner,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        engine,
        token_signer: Arc::new(token_signer),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Reservation routes (require user authentication)
    let user_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route(
            "/api/v1/reservations/request",
            post(reservations::request_reservation),
        )
        .route(
            "/api/v1/reservations/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/api/v1/reservations/release",
            post(reservations::release_reservation),
        )
        .route(
            "/api/v1/reservations/keep-alive",
            post(reservations::keep_alive),
        )
        .route(
            "/api/v1/reservations/active",
            get(reservations::active_reservations),
        )
        .route(
            "/api/v1/reservations/current",
            get(reservations::current_reservation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Admin routes (require an admin account)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/users",
            post(admin_users::create_user).get(admin_users::list_users),
        )
        .route(
            "/api/v1/admin/resources",
            post(admin_resources::create_resource).get(admin_resources::list_resources),
        )
        .route(
            "/api/v1/admin/resources/:resource_id",
            patch(admin_resources::update_resource),
        )
        .route(
            "/api/v1/admin/reservations",
            get(admin_reservations::reservation_history),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
