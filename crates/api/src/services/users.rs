//! Account profile and purchase statistics.

use sqlx::PgPool;

use babycash_core::UserId;

use crate::db::orders::OrderRepository;
use crate::db::users::{ProfileUpdate, UserRepository};
use crate::error::{AppError, Result};
use crate::models::user::{UserProfile, UserStats};
use crate::models::User;

pub struct UserService<'a> {
    users: UserRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn profile(&self, id: UserId) -> Result<UserProfile> {
        Ok(self.user(id).await?.into())
    }

    /// Replace the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn update_profile(&self, id: UserId, update: &ProfileUpdate<'_>) -> Result<UserProfile> {
        let user = self.users.update_profile(id, update).await?;
        tracing::info!(user_id = %id, "Profile updated");
        Ok(user.into())
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn stats(&self, id: UserId) -> Result<UserStats> {
        let user = self.user(id).await?;
        let totals = self.orders.totals_for_user(id).await?;
        Ok(UserStats::new(
            totals.total_orders,
            totals.total_products,
            totals.total_spent,
            user.created_at,
        ))
    }

    async fn user(&self, id: UserId) -> Result<User> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
