//! Database operations for the Baby Cash `PostgreSQL` database.
//!
//! # Schema: `babycash`
//!
//! ## Tables
//!
//! - `user` - Customer and staff accounts
//! - `refresh_token` - Long-lived credentials used to mint access tokens
//! - `product` - Catalog
//! - `cart`, `cart_item` - One cart per user
//! - `order`, `order_item` - Placed orders with price snapshots
//! - `payment` - Simulated gateway payments
//! - `loyalty_point` - Append-only points ledger
//! - `blog_post`, `blog_comment` - Blog with moderated comments
//! - `testimonial` - Customer testimonials
//! - `contact_message`, `contact_info` - Contact inbox and store details
//! - `audit_log` - Security and business audit trail
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p babycash-cli -- migrate
//! ```

pub mod audit_logs;
pub mod blog_comments;
pub mod blog_posts;
pub mod carts;
pub mod contact_info;
pub mod contact_messages;
pub mod loyalty;
pub mod orders;
pub mod payments;
pub mod products;
pub mod refresh_tokens;
pub mod testimonials;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(what.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" cuna "), "%cuna%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
