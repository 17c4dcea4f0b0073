//! Product catalog with a short-lived read cache.
//!
//! Single products and the featured list are cached for 5 minutes. Every
//! admin write clears the whole cache, so edits show up immediately.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use babycash_core::{AuditAction, AuditStatus, Page, PageRequest, ProductCategory, ProductId};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::CurrentUser;
use crate::models::audit::NewAuditEntry;
use crate::models::product::{Product, ProductInput};
use crate::services::audit::AuditService;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Featured,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Featured(Arc<Vec<Product>>),
}

/// Shared catalog cache, held in the application state.
#[derive(Clone)]
pub struct ProductCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl ProductCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(300)) // 5 minutes
                .build(),
        }
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

impl Default for ProductCache {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CatalogService<'a> {
    repo: ProductRepository<'a>,
    cache: &'a ProductCache,
    audit: AuditService<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a ProductCache) -> Self {
        Self {
            repo: ProductRepository::new(pool),
            cache,
            audit: AuditService::new(pool),
        }
    }

    /// Enabled products, optionally in one category.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<ProductCategory>,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        Ok(self.repo.list_enabled(category, page).await?)
    }

    /// Enabled products whose name or description contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<Product>> {
        Ok(self.repo.search(term, page).await?)
    }

    /// A product visible to shoppers.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product is missing or disabled.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.inner.get(&key).await {
            debug!(product_id = %id, "Cache hit for product");
            return Ok(*product);
        }

        let product = self
            .repo
            .get_by_id(id)
            .await?
            .filter(|p| p.enabled)
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        self.cache
            .inner
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Enabled, featured products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Product>> {
        if let Some(CacheValue::Featured(products)) = self.cache.inner.get(&CacheKey::Featured).await {
            debug!("Cache hit for featured products");
            return Ok(products.as_ref().clone());
        }

        let products = self.repo.list_featured().await?;
        self.cache
            .inner
            .insert(CacheKey::Featured, CacheValue::Featured(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput, admin: &CurrentUser) -> Result<Product> {
        let product = self.repo.create(input).await?;
        self.after_write(AuditAction::ProductCreated, &product, admin, "Product created")
            .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        admin: &CurrentUser,
    ) -> Result<Product> {
        let product = self.repo.update(id, input).await?;
        self.after_write(AuditAction::ProductUpdated, &product, admin, "Product updated")
            .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist, or
    /// `AppError::Business` if orders still reference it.
    pub async fn delete(&self, id: ProductId, admin: &CurrentUser) -> Result<()> {
        self.repo.delete(id).await?;
        self.cache.invalidate_all().await;
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::ProductDeleted, AuditStatus::Success)
                    .actor(Some(admin.id), admin.email.as_str())
                    .entity("Product", id.as_i32())
                    .description("Product deleted"),
            )
            .await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn toggle_featured(&self, id: ProductId, admin: &CurrentUser) -> Result<Product> {
        let product = self.repo.toggle_featured(id).await?;
        let description = if product.featured {
            "Product featured"
        } else {
            "Product unfeatured"
        };
        self.after_write(AuditAction::ProductUpdated, &product, admin, description)
            .await;
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn toggle_enabled(&self, id: ProductId, admin: &CurrentUser) -> Result<Product> {
        let product = self.repo.toggle_enabled(id).await?;
        let description = if product.enabled {
            "Product enabled"
        } else {
            "Product disabled"
        };
        self.after_write(AuditAction::ProductUpdated, &product, admin, description)
            .await;
        Ok(product)
    }

    async fn after_write(
        &self,
        action: AuditAction,
        product: &Product,
        admin: &CurrentUser,
        description: &str,
    ) {
        self.cache.invalidate_all().await;
        tracing::info!(product_id = %product.id, action = %action, "Catalog updated");
        self.audit
            .record(
                NewAuditEntry::new(action, AuditStatus::Success)
                    .actor(Some(admin.id), admin.email.as_str())
                    .entity("Product", product.id.as_i32())
                    .description(format!("{description}: {}", product.name)),
            )
            .await;
    }
}
