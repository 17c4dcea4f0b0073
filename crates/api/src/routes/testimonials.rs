//! Testimonial handlers: public reads, shopper submissions and moderation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use babycash_core::{Page, PageRequest, TestimonialId};

use super::MessageResponse;
use crate::db::testimonials::TestimonialFilter;
use crate::error::{FieldErrors, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::testimonial::{Testimonial, TestimonialInput, TestimonialStats};
use crate::services::testimonials::TestimonialService;
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TestimonialRequest {
    pub name: String,
    pub message: String,
    pub rating: i32,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl TestimonialRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<TestimonialInput> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "name", &self.name, 2, 100);
        validation::length(&mut errors, "message", &self.message, 10, 1000);
        validation::range(&mut errors, "rating", i64::from(self.rating), 1, 5);
        validation::max_length(&mut errors, "location", self.location.as_deref(), 100);
        errors.into_result()?;

        Ok(TestimonialInput {
            name: self.name.trim().to_string(),
            message: self.message.trim().to_string(),
            rating: self.rating,
            avatar: validation::non_blank(self.avatar.as_deref()),
            location: validation::non_blank(self.location.as_deref()),
        })
    }
}

async fn list(state: &AppState, filter: TestimonialFilter) -> Result<Json<Vec<Testimonial>>> {
    Ok(Json(TestimonialService::new(state.pool()).list(filter).await?))
}

/// GET /api/testimonials
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Testimonial>>> {
    list(&state, TestimonialFilter::Approved).await
}

/// GET /api/testimonials/featured
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Testimonial>>> {
    list(&state, TestimonialFilter::ApprovedFeatured).await
}

/// GET /api/testimonials/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<TestimonialId>,
) -> Result<Json<Testimonial>> {
    Ok(Json(TestimonialService::new(state.pool()).get(id).await?))
}

/// POST /api/testimonials
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(request): Json<TestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>)> {
    let input = request.validate()?;
    let testimonial = TestimonialService::new(state.pool()).submit(&input).await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// GET /api/testimonials/admin/all
pub async fn admin_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Testimonial>>> {
    list(&state, TestimonialFilter::All).await
}

/// GET /api/testimonials/admin/pending
pub async fn admin_pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Testimonial>>> {
    list(&state, TestimonialFilter::Pending).await
}

/// GET /api/testimonials/admin/paged
pub async fn admin_paged(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Testimonial>>> {
    Ok(Json(TestimonialService::new(state.pool()).paged(page).await?))
}

/// GET /api/testimonials/admin/stats
pub async fn admin_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<TestimonialStats>> {
    Ok(Json(TestimonialService::new(state.pool()).stats().await?))
}

/// PUT /api/testimonials/admin/{id}
pub async fn admin_update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TestimonialId>,
    Json(request): Json<TestimonialRequest>,
) -> Result<Json<Testimonial>> {
    let input = request.validate()?;
    Ok(Json(
        TestimonialService::new(state.pool()).update(id, &input).await?,
    ))
}

/// DELETE /api/testimonials/admin/{id}
pub async fn admin_delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TestimonialId>,
) -> Result<Json<MessageResponse>> {
    TestimonialService::new(state.pool()).delete(id).await?;
    Ok(Json(MessageResponse::new("Testimonial deleted")))
}

/// POST /api/testimonials/admin/{id}/approve
pub async fn admin_approve(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TestimonialId>,
) -> Result<Json<Testimonial>> {
    Ok(Json(TestimonialService::new(state.pool()).approve(id).await?))
}

/// POST /api/testimonials/admin/{id}/reject
pub async fn admin_reject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TestimonialId>,
) -> Result<Json<Testimonial>> {
    Ok(Json(TestimonialService::new(state.pool()).reject(id).await?))
}

/// POST /api/testimonials/admin/{id}/toggle-featured
pub async fn admin_toggle_featured(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<TestimonialId>,
) -> Result<Json<Testimonial>> {
    Ok(Json(
        TestimonialService::new(state.pool())
            .toggle_featured(id)
            .await?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_testimonial_request_rating_bounds() {
        let request = |rating| TestimonialRequest {
            name: "Laura M.".to_string(),
            message: "Excelente calidad y envío rápido".to_string(),
            rating,
            avatar: None,
            location: Some(" Medellín ".to_string()),
        };

        let input = request(5).validate().unwrap();
        assert_eq!(input.location.as_deref(), Some("Medellín"));
        assert!(request(0).validate().is_err());
        assert!(request(6).validate().is_err());
    }
}
