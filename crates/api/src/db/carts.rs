//! Cart repository.
//!
//! Each user owns at most one cart, created on the first add. Cart items
//! reference products; prices are joined in at read time.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use babycash_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::CartLine;

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    item_id: i32,
    product_id: i32,
    product_name: String,
    product_image: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item_id: CartItemId::new(row.item_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            product_image: row.product_image,
            price: row.price,
            discount_price: row.discount_price,
            quantity: row.quantity,
        }
    }
}

/// A cart item with the cart it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemRef {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub owner: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRefRow {
    id: i32,
    cart_id: i32,
    owner: i32,
    product_id: i32,
    quantity: i32,
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart ID, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_cart(&self, user_id: UserId) -> Result<Option<CartId>, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar("SELECT id FROM babycash.cart WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(id.map(CartId::new))
    }

    /// The user's cart ID, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO babycash.cart (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(CartId::new(id))
    }

    /// Every line of a cart with current product pricing, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id AS item_id, p.id AS product_id, p.name AS product_name,
                   p.image_url AS product_image, p.price, p.discount_price, ci.quantity
            FROM babycash.cart_item ci
            JOIN babycash.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.added_at, ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Quantity of a product already in the cart (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM babycash.cart_item WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Add `quantity` of a product, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO babycash.cart_item (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = babycash.cart_item.quantity + EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        self.touch(cart_id).await
    }

    /// Look up a cart item along with its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(&self, item_id: CartItemId) -> Result<Option<CartItemRef>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRefRow>(
            r"
            SELECT ci.id, ci.cart_id, c.user_id AS owner, ci.product_id, ci.quantity
            FROM babycash.cart_item ci
            JOIN babycash.cart c ON c.id = ci.cart_id
            WHERE ci.id = $1
            ",
        )
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| CartItemRef {
            id: CartItemId::new(r.id),
            cart_id: CartId::new(r.cart_id),
            owner: UserId::new(r.owner),
            product_id: ProductId::new(r.product_id),
            quantity: r.quantity,
        }))
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn set_quantity(&self, item: &CartItemRef, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE babycash.cart_item SET quantity = $2 WHERE id = $1")
            .bind(item.id)
            .bind(quantity)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.touch(item.cart_id).await
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(&self, item: &CartItemRef) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM babycash.cart_item WHERE id = $1")
            .bind(item.id)
            .execute(self.pool)
            .await?;

        self.touch(item.cart_id).await
    }

    /// Remove every line of a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM babycash.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        self.touch(cart_id).await
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE babycash.cart SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Empty a user's cart inside an order transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_for_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        DELETE FROM babycash.cart_item
        WHERE cart_id IN (SELECT id FROM babycash.cart WHERE user_id = $1)
        ",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
