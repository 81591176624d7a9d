use axum::{
    middleware,
    routing::{delete, get, post},
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

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
};
use crate::routes::{check_in, health, participants, station_config};
use crate::services::CheckInService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub check_in: CheckInService,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);
    let check_in = CheckInService::new(pool.clone(), &config.check_in);

    let state = AppState {
        pool,
        config: config.clone(),
        check_in,
    };

    // Admission stations are browsers on the venue network; origins are not
    // pinned. Operator identity travels in headers, not cookies.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Check-in routes (v1)
    let api_routes = Router::new()
        .route(
            "/api/v1/events/:event_id/check-in/verify",
            post(check_in::verify_scan),
        )
        .route(
            "/api/v1/events/:event_id/check-ins",
            post(check_in::commit_check_in).get(check_in::list_check_ins),
        )
        .route(
            "/api/v1/events/:event_id/check-ins/stats",
            get(check_in::get_check_in_stats),
        )
        .route(
            "/api/v1/check-ins/:id",
            delete(check_in::cancel_check_in).patch(check_in::update_check_in_notes),
        )
        // Participant routes (v1)
        .route(
            "/api/v1/events/:event_id/participants",
            get(participants::list_participants),
        )
        .route(
            "/api/v1/events/:event_id/participants/:user_id/ticket",
            get(participants::get_ticket),
        );

    // Public routes (no operator attribution required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route(
            "/api/v1/config/station",
            get(station_config::get_station_config),
        )
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware)) // Security headers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
