//! Admin back-office API for the services marketplace: signed-cookie
//! sessions, per-operation rate limiting, and a fire-and-forget audit trail.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use http::{Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;

pub mod config;
pub mod error;
pub mod net;
pub mod rate_limit;
pub mod state;

pub mod crypto {
    pub mod token;
}

pub mod models {
    pub mod admin;
    pub mod audit;
    pub mod session;
}

pub mod repositories {
    pub mod admin;
    pub mod audit;
}

pub mod services {
    pub mod audit;
    pub mod session;
}

pub mod handlers {
    pub mod audit;
    pub mod auth;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
}

use state::AppState;

/// Builds the admin API router around the given state.
///
/// Pulled out of `main` so integration tests can drive the exact router the
/// binary serves.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
            "http://[::1]:3000".parse().unwrap(),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    // Coarse per-IP backstop; the fine-grained policy is the sliding-window
    // limiter inside the handlers and the login middleware.
    let protected_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10_000)
            .burst_size(50_000)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let login_routes = Router::new()
        .route("/api/admin/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_login,
        ))
        .with_state(state.clone());

    let logout_routes = Router::new()
        .route("/api/admin/logout", post(handlers::auth::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/admin/me", get(handlers::auth::me))
        .route("/api/admin/audit-logs", get(handlers::audit::list_audit_logs))
        .layer(tower_governor::GovernorLayer::new(
            protected_governor_conf.clone(),
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_admin,
        ))
        .with_state(state);

    Router::new()
        .merge(login_routes)
        .merge(logout_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
}
