//! Shopping cart.

use sqlx::PgPool;

use babycash_core::{CartItemId, ProductId, UserId};

use crate::db::carts::{CartItemRef, CartRepository};
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::cart::CartView;
use crate::models::product::Product;

/// Largest quantity of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's cart, empty if they never added anything.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView> {
        match self.carts.find_cart(user_id).await? {
            Some(cart_id) => Ok(CartView::build(cart_id, self.carts.lines(cart_id).await?)),
            None => Ok(CartView::empty(None)),
        }
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the product does not exist
    /// - `AppError::Business` if it is disabled or stock cannot cover the
    ///   cart's total quantity
    pub async fn add(&self, user_id: UserId, product_id: ProductId, quantity: i32) -> Result<CartView> {
        let product = self.available_product(product_id).await?;

        let cart_id = self.carts.get_or_create_cart(user_id).await?;
        let in_cart = self.carts.quantity_of(cart_id, product_id).await?;
        ensure_stock(&product, in_cart + quantity)?;

        self.carts.add_item(cart_id, product_id, quantity).await?;
        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity, "Added to cart");

        Ok(CartView::build(cart_id, self.carts.lines(cart_id).await?))
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the item is not in this user's cart,
    /// or `AppError::Business` if stock cannot cover the new quantity.
    pub async fn update(&self, user_id: UserId, item_id: CartItemId, quantity: i32) -> Result<CartView> {
        let item = self.owned_item(user_id, item_id).await?;

        if quantity <= 0 {
            self.carts.remove_item(&item).await?;
        } else {
            let product = self.available_product(item.product_id).await?;
            ensure_stock(&product, quantity)?;
            self.carts.set_quantity(&item, quantity).await?;
        }

        Ok(CartView::build(item.cart_id, self.carts.lines(item.cart_id).await?))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the item is not in this user's cart.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<CartView> {
        let item = self.owned_item(user_id, item_id).await?;
        self.carts.remove_item(&item).await?;
        Ok(CartView::build(item.cart_id, self.carts.lines(item.cart_id).await?))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<CartView> {
        match self.carts.find_cart(user_id).await? {
            Some(cart_id) => {
                self.carts.clear(cart_id).await?;
                Ok(CartView::empty(Some(cart_id)))
            }
            None => Ok(CartView::empty(None)),
        }
    }

    async fn available_product(&self, id: ProductId) -> Result<Product> {
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        if !product.enabled {
            return Err(AppError::business("Product is not available"));
        }
        Ok(product)
    }

    async fn owned_item(&self, user_id: UserId, item_id: CartItemId) -> Result<CartItemRef> {
        self.carts
            .get_item(item_id)
            .await?
            .filter(|item| item.owner == user_id)
            .ok_or_else(|| AppError::not_found("Cart item not found"))
    }
}

fn ensure_stock(product: &Product, wanted: i32) -> Result<()> {
    if product.stock < wanted {
        return Err(AppError::business("Insufficient stock"));
    }
    Ok(())
}
