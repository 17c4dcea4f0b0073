//! Testimonial repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{Page, PageRequest, TestimonialId};

use super::RepositoryError;
use crate::models::testimonial::{Testimonial, TestimonialInput, TestimonialStats};

const TESTIMONIAL_COLUMNS: &str =
    "id, name, message, rating, avatar, location, approved, featured, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TestimonialRow {
    id: i32,
    name: String,
    message: String,
    rating: i32,
    avatar: Option<String>,
    location: Option<String>,
    approved: bool,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TestimonialRow> for Testimonial {
    fn from(row: TestimonialRow) -> Self {
        Self {
            id: TestimonialId::new(row.id),
            name: row.name,
            message: row.message,
            rating: row.rating,
            avatar: row.avatar,
            location: row.location,
            approved: row.approved,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total: i64,
    total_approved: i64,
    total_pending: i64,
    total_featured: i64,
}

/// Which testimonials a list query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestimonialFilter {
    All,
    Approved,
    ApprovedFeatured,
    Pending,
}

impl TestimonialFilter {
    const fn sql(self) -> &'static str {
        match self {
            Self::All => "TRUE",
            Self::Approved => "approved",
            Self::ApprovedFeatured => "approved AND featured",
            Self::Pending => "NOT approved",
        }
    }
}

/// Repository for testimonial operations.
pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a testimonial by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: TestimonialId) -> Result<Option<Testimonial>, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM babycash.testimonial WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Every testimonial matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: TestimonialFilter) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM babycash.testimonial WHERE {} \
             ORDER BY created_at DESC, id DESC",
            filter.sql()
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One page of every testimonial, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_paged(&self, page: PageRequest) -> Result<Page<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(&format!(
            "SELECT {TESTIMONIAL_COLUMNS} FROM babycash.testimonial \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM babycash.testimonial")
            .fetch_one(self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(Into::into).collect(), page, total))
    }

    /// Moderation counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<TestimonialStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE approved) AS total_approved,
                COUNT(*) FILTER (WHERE NOT approved) AS total_pending,
                COUNT(*) FILTER (WHERE featured) AS total_featured
            FROM babycash.testimonial
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(TestimonialStats {
            total: row.total,
            total_approved: row.total_approved,
            total_pending: row.total_pending,
            total_featured: row.total_featured,
        })
    }

    /// Insert a testimonial with explicit moderation flags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        input: &TestimonialInput,
        approved: bool,
        featured: bool,
    ) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            r"
            INSERT INTO babycash.testimonial (name, message, rating, avatar, location, approved, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TESTIMONIAL_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.message)
        .bind(input.rating)
        .bind(input.avatar.as_deref())
        .bind(input.location.as_deref())
        .bind(approved)
        .bind(featured)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the content fields of a testimonial.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the testimonial does not exist.
    pub async fn update(
        &self,
        id: TestimonialId,
        input: &TestimonialInput,
    ) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            r"
            UPDATE babycash.testimonial
            SET name = $2, message = $3, rating = $4, avatar = $5, location = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {TESTIMONIAL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.message)
        .bind(input.rating)
        .bind(input.avatar.as_deref())
        .bind(input.location.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Set both moderation flags at once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the testimonial does not exist.
    pub async fn set_flags(
        &self,
        id: TestimonialId,
        approved: bool,
        featured: bool,
    ) -> Result<Testimonial, RepositoryError> {
        let row = sqlx::query_as::<_, TestimonialRow>(&format!(
            r"
            UPDATE babycash.testimonial
            SET approved = $2, featured = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {TESTIMONIAL_COLUMNS}
            "
        ))
        .bind(id)
        .bind(approved)
        .bind(featured)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a testimonial.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the testimonial does not exist.
    pub async fn delete(&self, id: TestimonialId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.testimonial WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of testimonials, for the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM babycash.testimonial")
            .fetch_one(self.pool)
            .await?)
    }
}
