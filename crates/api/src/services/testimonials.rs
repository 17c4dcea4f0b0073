//! Customer testimonials and their moderation.

use sqlx::PgPool;

use babycash_core::{Page, PageRequest, TestimonialId};

use crate::db::testimonials::{TestimonialFilter, TestimonialRepository};
use crate::error::{AppError, Result};
use crate::models::testimonial::{Testimonial, TestimonialInput, TestimonialStats};

pub struct TestimonialService<'a> {
    repo: TestimonialRepository<'a>,
}

impl<'a> TestimonialService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: TestimonialRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, filter: TestimonialFilter) -> Result<Vec<Testimonial>> {
        Ok(self.repo.list(filter).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn paged(&self, page: PageRequest) -> Result<Page<Testimonial>> {
        Ok(self.repo.list_paged(page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn get(&self, id: TestimonialId) -> Result<Testimonial> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Testimonial not found"))
    }

    /// Submit a testimonial. It stays hidden until approved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn submit(&self, input: &TestimonialInput) -> Result<Testimonial> {
        let testimonial = self.repo.create(input, false, false).await?;
        tracing::info!(testimonial_id = %testimonial.id, "Testimonial submitted for review");
        Ok(testimonial)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn update(&self, id: TestimonialId, input: &TestimonialInput) -> Result<Testimonial> {
        Ok(self.repo.update(id, input).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn delete(&self, id: TestimonialId) -> Result<()> {
        Ok(self.repo.delete(id).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn approve(&self, id: TestimonialId) -> Result<Testimonial> {
        let current = self.get(id).await?;
        Ok(self.repo.set_flags(id, true, current.featured).await?)
    }

    /// Hide a testimonial. Rejected testimonials are never featured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn reject(&self, id: TestimonialId) -> Result<Testimonial> {
        Ok(self.repo.set_flags(id, false, false).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the testimonial does not exist.
    pub async fn toggle_featured(&self, id: TestimonialId) -> Result<Testimonial> {
        let current = self.get(id).await?;
        Ok(self
            .repo
            .set_flags(id, current.approved, !current.featured)
            .await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn stats(&self) -> Result<TestimonialStats> {
        Ok(self.repo.stats().await?)
    }
}
