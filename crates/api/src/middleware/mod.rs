//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (governor), tighter on `/api/auth`
//!
//! Authentication is not a layer: handlers ask for `RequireAuth`,
//! `RequireAdmin` or `OptionalAuth`.

pub mod auth;
pub mod client_info;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth};
pub use client_info::ClientInfo;
pub use cors::cors_layer;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
