//! Baby Cash API library.
//!
//! This crate provides the REST API as a library, allowing the router to be
//! tested in-process and the repositories to be reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware as axum_middleware};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with every layer except Sentry's.
///
/// Layers run outermost first: tracing, request ID, CORS, security headers,
/// then the per-route rate limiters.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let cors = middleware::cors_layer(&config.cors_origins);
    let rate_limit = config.rate_limit;

    routes::routes(rate_limit)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
        .with_state(state)
}
