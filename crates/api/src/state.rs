//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::JwtKeys;
use crate::services::catalog::ProductCache;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    jwt: JwtKeys,
    products: ProductCache,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool, email: EmailService) -> Self {
        let jwt = JwtKeys::new(&config.jwt);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                products: ProductCache::new(),
                email,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Keys for signing and verifying access tokens.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Catalog read cache.
    #[must_use]
    pub fn products(&self) -> &ProductCache {
        &self.inner.products
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Where contact-form notifications go.
    #[must_use]
    pub fn admin_email(&self) -> &str {
        &self.inner.config.admin_notification_email
    }
}
