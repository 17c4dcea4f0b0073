//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::{Page, PageRequest, ProductCategory, ProductId};

use super::{RepositoryError, like_pattern};
use crate::models::product::{Product, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, price, discount_price, category, stock, \
     image_url, enabled, featured, rating, review_count, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    category: ProductCategory,
    stock: i32,
    image_url: Option<String>,
    enabled: bool,
    featured: bool,
    rating: Decimal,
    review_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            category: row.category,
            stock: row.stock,
            image_url: row.image_url,
            enabled: row.enabled,
            featured: row.featured,
            rating: row.rating,
            review_count: row.review_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID, enabled or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM babycash.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Page through enabled products, newest first, optionally in one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_enabled(
        &self,
        category: Option<ProductCategory>,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM babycash.product
            WHERE enabled AND ($1::babycash.product_category IS NULL OR category = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(category)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM babycash.product
            WHERE enabled AND ($1::babycash.product_category IS NULL OR category = $1)
            ",
        )
        .bind(category)
        .fetch_one(self.pool)
        .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }

    /// Case-insensitive substring search over enabled products' name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let pattern = like_pattern(term);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM babycash.product
            WHERE enabled AND (name ILIKE $1 OR description ILIKE $1)
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM babycash.product
            WHERE enabled AND (name ILIKE $1 OR description ILIKE $1)
            ",
        )
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }

    /// Enabled products marked as featured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM babycash.product
            WHERE enabled AND featured
            ORDER BY created_at DESC, id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO babycash.product
                (name, description, price, discount_price, category, stock, image_url, featured, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.category)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.featured)
        .bind(input.enabled)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE babycash.product
            SET name = $2, description = $3, price = $4, discount_price = $5, category = $6,
                stock = $7, image_url = $8, featured = $9, enabled = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.category)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.featured)
        .bind(input.enabled)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if orders still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    RepositoryError::Conflict("product is referenced by orders".to_string())
                }
                _ => RepositoryError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle_featured(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.toggle(id, "featured").await
    }

    /// Flip the enabled flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle_enabled(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.toggle(id, "enabled").await
    }

    async fn toggle(&self, id: ProductId, column: &'static str) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE babycash.product SET {column} = NOT {column}, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Number of products, for the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM babycash.product")
            .fetch_one(self.pool)
            .await?)
    }
}

// =============================================================================
// Transactional stock helpers
// =============================================================================

/// Lock and read a product inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM babycash.product WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(Into::into))
}

/// Take `quantity` units out of stock if at least that many remain.
///
/// Returns `false` when stock is short, leaving the row untouched.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE babycash.product SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1 AND stock >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Put `quantity` units back into stock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE babycash.product SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
