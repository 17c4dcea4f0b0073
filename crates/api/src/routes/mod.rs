//! HTTP route handlers for the Baby Cash API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database)
//! GET  /api/health                      - Service status
//!
//! # Auth (tighter rate limit)
//! POST /api/auth/register | login | refresh | logout
//! POST /api/auth/forgot-password | reset-password
//! GET  /api/auth/validate-reset-token/{code}
//!
//! # Shopper (bearer token)
//! GET|PUT /api/users/profile, GET /api/users/stats, GET /api/users/comments
//! /api/cart, /api/orders, /api/payments, /api/loyalty
//!
//! # Public catalog and content
//! /api/products, /api/blog, /api/blog/{id}/comments, /api/testimonials
//! POST /api/contact/send, GET /api/contact-info
//!
//! # Admin (ADMIN role)
//! /api/admin/products, /api/admin/orders
//! /api/blog/admin/*, /api/testimonials/admin/*, /api/contact/admin/*
//! PUT /api/contact-info, GET /api/contact-info/status
//! ```

pub mod auth;
pub mod blog;
pub mod cart;
pub mod comments;
pub mod contact;
pub mod health;
pub mod loyalty;
pub mod orders;
pub mod payments;
pub mod products;
pub mod testimonials;
pub mod users;

use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use babycash_core::ParseEnumError;

use crate::error::{AppError, Result};
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// `{message}` body for operations with nothing else to return.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Parse an enum from a path segment or query value. Unknown names are a
/// business error.
pub(crate) fn parse_enum<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.parse().map_err(|e: ParseEnumError| AppError::business(e.to_string()))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route(
            "/validate-reset-token/{code}",
            get(auth::validate_reset_token),
        )
        .route("/reset-password", post(auth::reset_password))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(users::profile).put(users::update_profile))
        .route("/stats", get(users::stats))
        .route("/comments", get(comments::mine))
}

/// Create the public product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/search", get(products::search))
        .route("/category/{category}", get(products::by_category))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route(
            "/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/clear", axum::routing::delete(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::mine).post(orders::create))
        .route("/number/{order_number}", get(orders::by_number))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(payments::process))
        .route("/order/{order_id}", get(payments::for_order))
}

/// Create the loyalty routes router.
pub fn loyalty_routes() -> Router<AppState> {
    Router::new()
        .route("/points", get(loyalty::points))
        .route("/history", get(loyalty::history))
        .route("/redeem", post(loyalty::redeem))
}

/// Create the blog routes router, comments included.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index).post(blog::create))
        .route("/featured", get(blog::featured))
        .route("/search", get(blog::search))
        .route("/most-viewed", get(blog::most_viewed))
        .route("/author/me", get(blog::mine))
        .route("/admin/all", get(blog::admin_all))
        .route("/slug/{slug}", get(blog::by_slug))
        .route("/tag/{tag}", get(blog::by_tag))
        .route(
            "/{id}",
            get(blog::show).put(blog::update).delete(blog::delete),
        )
        .route("/{id}/publish", put(blog::publish))
        .route("/{id}/unpublish", put(blog::unpublish))
        .route("/{id}/toggle-featured", put(blog::toggle_featured))
        .route(
            "/{id}/comments",
            get(comments::index).post(comments::create),
        )
        .route("/{id}/comments/count", get(comments::count))
        .route("/{id}/comments/admin/pending", get(comments::pending))
        .route(
            "/{id}/comments/admin/pending/count",
            get(comments::pending_count),
        )
        .route(
            "/{id}/comments/{comment_id}",
            put(comments::update).delete(comments::delete),
        )
        .route(
            "/{id}/comments/{comment_id}/approve",
            post(comments::approve),
        )
}

/// Create the testimonial routes router.
pub fn testimonial_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(testimonials::index).post(testimonials::submit))
        .route("/featured", get(testimonials::featured))
        .route("/admin/all", get(testimonials::admin_all))
        .route("/admin/paged", get(testimonials::admin_paged))
        .route("/admin/pending", get(testimonials::admin_pending))
        .route("/admin/stats", get(testimonials::admin_stats))
        .route(
            "/admin/{id}",
            put(testimonials::admin_update).delete(testimonials::admin_delete),
        )
        .route("/admin/{id}/approve", post(testimonials::admin_approve))
        .route("/admin/{id}/reject", post(testimonials::admin_reject))
        .route(
            "/admin/{id}/toggle-featured",
            post(testimonials::admin_toggle_featured),
        )
        .route("/{id}", get(testimonials::show))
}

/// Create the contact form and inbox routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/send", post(contact::send))
        .route("/admin/messages", get(contact::messages))
        .route("/admin/messages/paged", get(contact::messages_paged))
        .route("/admin/messages/new", get(contact::new_messages))
        .route("/admin/messages/new/count", get(contact::new_count))
        .route("/admin/messages/recent", get(contact::recent))
        .route(
            "/admin/messages/{id}",
            get(contact::message).delete(contact::delete_message),
        )
        .route("/admin/messages/{id}/read", post(contact::mark_read))
        .route("/admin/messages/{id}/reply", post(contact::mark_replied))
        .route("/admin/messages/{id}/archive", post(contact::archive))
        .route("/admin/messages/{id}/unarchive", post(contact::unarchive))
}

/// Create the admin catalog and fulfilment routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(products::create))
        .route(
            "/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route(
            "/products/{id}/toggle-featured",
            put(products::toggle_featured),
        )
        .route(
            "/products/{id}/toggle-enabled",
            put(products::toggle_enabled),
        )
        .route("/orders", get(orders::admin_index))
        .route("/orders/stats", get(orders::admin_stats))
        .route("/orders/{id}", get(orders::admin_show))
        .route("/orders/{id}/status", put(orders::admin_update_status))
}

/// Every `/api` route except auth.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::api_health))
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/loyalty", loyalty_routes())
        .nest("/blog", blog_routes())
        .nest("/testimonials", testimonial_routes())
        .nest("/contact", contact_routes())
        .route(
            "/contact-info",
            get(contact::info).put(contact::update_info),
        )
        .route("/contact-info/status", get(contact::info_status))
        .nest("/admin", admin_routes())
}

/// Create all routes. With `rate_limit` set, auth endpoints get the strict
/// per-IP limiter and the rest of the API the relaxed one.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    let (auth, api) = if rate_limit {
        (
            auth_routes().layer(auth_rate_limiter()),
            api_routes().layer(api_rate_limiter()),
        )
    } else {
        (auth_routes(), api_routes())
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth)
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use babycash_core::OrderStatus;

    use super::*;

    #[test]
    fn test_parse_enum_is_business_error() {
        assert_eq!(parse_enum::<OrderStatus>("shipped").ok(), Some(OrderStatus::Shipped));
        assert!(matches!(
            parse_enum::<OrderStatus>("LOST"),
            Err(AppError::Business(_))
        ));
    }
}
