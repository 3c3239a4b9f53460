//! Router configuration for Web API.

use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_mailbox, delete_all_emails, delete_email, delete_mailbox, deliver_inbound, get_email,
    get_mailbox, get_public_config, get_rendered_email, list_domains, list_emails,
    refresh_mailbox, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, register_rate_limit, security_headers, RateLimitState,
};
use super::openapi::create_openapi_router;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let register_state = rate_limit.clone();
    let api_state = rate_limit;

    // Mailbox creation has its own, tighter limit
    let create_routes = Router::new()
        .route("/mailboxes", post(create_mailbox))
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            let state = register_state.clone();
            register_rate_limit(state, req, next)
        }));

    let public_routes = Router::new()
        .route("/domains", get(list_domains))
        .route("/config/public", get(get_public_config))
        .route("/mailboxes/:address", get(get_mailbox).delete(delete_mailbox))
        .route("/mailboxes/:address/refresh", post(refresh_mailbox))
        .route(
            "/mailboxes/:address/emails",
            get(list_emails).delete(delete_all_emails),
        )
        .route(
            "/mailboxes/:address/emails/:id",
            get(get_email).delete(delete_email),
        )
        .route(
            "/mailboxes/:address/emails/:id/rendered",
            get(get_rendered_email),
        )
        .merge(create_routes)
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            let state = api_state.clone();
            api_rate_limit(state, req, next)
        }));

    // Called by the mail receiver, not by browsers
    let inbound_routes = Router::new().route("/inbound", post(deliver_inbound));

    let api_routes = Router::new().merge(public_routes).merge(inbound_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the complete application: API, health check and OpenAPI document.
pub fn create_app(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    create_router(app_state, rate_limit, cors_origins)
        .merge(create_health_router())
        .merge(create_openapi_router())
        .layer(CompressionLayer::new())
}
