use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::EventServices;
use domain::store::EventStore;
use shared::jwt::{JwtConfig, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{attendance, events, health, registrations};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub services: EventServices,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EventStore>) -> Result<Self, JwtError> {
        let jwt = config.jwt.verifier()?;
        let services = EventServices::new(store.clone(), config.attendance.token_policy());
        Ok(Self {
            store,
            services,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
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
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // Alumni routes; the Caller extractor authenticates every handler here.
    let alumni_routes = Router::new()
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route(
            "/api/v1/events/:event_id/registrations",
            post(registrations::register_for_event),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            delete(registrations::cancel_registration),
        )
        .route(
            "/api/v1/events/:event_id/attendance/verify",
            get(attendance::verify_attendance_token),
        )
        .route(
            "/api/v1/events/:event_id/attendance",
            post(attendance::mark_attendance),
        );

    // Admin routes; handlers call `require_admin` on the caller.
    let admin_routes = Router::new()
        .route("/api/v1/admin/events", post(events::create_event))
        .route(
            "/api/v1/admin/events/:event_id/publish",
            post(events::publish_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/start",
            post(events::start_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/complete",
            post(events::complete_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/cancel",
            post(events::cancel_event),
        )
        .route(
            "/api/v1/admin/events/:event_id/attendance-token",
            post(attendance::issue_attendance_token).delete(attendance::revoke_attendance_token),
        )
        .route(
            "/api/v1/admin/events/:event_id/registrations",
            get(registrations::list_registrations),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(alumni_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
