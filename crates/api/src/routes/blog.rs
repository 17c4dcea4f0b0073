//! Blog post handlers.
//!
//! Posts are created as drafts. Only the author edits or publishes a post;
//! admins may also delete it and control the featured strip.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use babycash_core::{BlogPostId, Page, PageRequest};

use super::MessageResponse;
use crate::error::{FieldErrors, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::blog::{BlogPost, BlogPostInput};
use crate::services::blog::BlogService;
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostRequest {
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BlogPostRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<BlogPostInput> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "title", &self.title, 5, 200);
        validation::max_length(&mut errors, "excerpt", self.excerpt.as_deref(), 500);
        validation::min_length(&mut errors, "content", &self.content, 50);
        errors.into_result()?;

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.iter().filter_map(|t| validation::non_blank(Some(t.as_str()))) {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }

        Ok(BlogPostInput {
            title: self.title.trim().to_string(),
            excerpt: validation::non_blank(self.excerpt.as_deref()),
            content: self.content.trim().to_string(),
            image_url: validation::non_blank(self.image_url.as_deref()),
            tags,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// POST /api/blog
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<BlogPostRequest>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let input = request.validate()?;
    let post = BlogService::new(state.pool()).create(&user, &input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/blog/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<BlogPostId>,
    Json(request): Json<BlogPostRequest>,
) -> Result<Json<BlogPost>> {
    let input = request.validate()?;
    Ok(Json(
        BlogService::new(state.pool()).update(&user, id, &input).await?,
    ))
}

/// DELETE /api/blog/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<BlogPostId>,
) -> Result<Json<MessageResponse>> {
    BlogService::new(state.pool()).delete(&user, id).await?;
    Ok(Json(MessageResponse::new("Blog post deleted")))
}

/// GET /api/blog
pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogPost>>> {
    Ok(Json(BlogService::new(state.pool()).published(page).await?))
}

/// GET /api/blog/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<BlogPostId>,
) -> Result<Json<BlogPost>> {
    Ok(Json(BlogService::new(state.pool()).get(id).await?))
}

/// GET /api/blog/slug/{slug}
pub async fn by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>> {
    Ok(Json(
        BlogService::new(state.pool()).view_by_slug(slug.trim()).await?,
    ))
}

/// GET /api/blog/featured
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(BlogService::new(state.pool()).featured().await?))
}

/// GET /api/blog/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogPost>>> {
    Ok(Json(
        BlogService::new(state.pool())
            .search(query.q.trim(), page)
            .await?,
    ))
}

/// GET /api/blog/tag/{tag}
pub async fn by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogPost>>> {
    Ok(Json(
        BlogService::new(state.pool()).by_tag(tag.trim(), page).await?,
    ))
}

/// GET /api/blog/author/me
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogPost>>> {
    Ok(Json(
        BlogService::new(state.pool()).by_author(&user, page).await?,
    ))
}

/// GET /api/blog/most-viewed
pub async fn most_viewed(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    Ok(Json(BlogService::new(state.pool()).most_viewed().await?))
}

/// GET /api/blog/admin/all
pub async fn admin_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogPost>>> {
    Ok(Json(BlogService::new(state.pool()).all(page).await?))
}

/// PUT /api/blog/{id}/publish
pub async fn publish(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<BlogPostId>,
) -> Result<Json<BlogPost>> {
    Ok(Json(
        BlogService::new(state.pool())
            .set_published(&user, id, true)
            .await?,
    ))
}

/// PUT /api/blog/{id}/unpublish
pub async fn unpublish(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<BlogPostId>,
) -> Result<Json<BlogPost>> {
    Ok(Json(
        BlogService::new(state.pool())
            .set_published(&user, id, false)
            .await?,
    ))
}

/// PUT /api/blog/{id}/toggle-featured
pub async fn toggle_featured(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<BlogPostId>,
) -> Result<Json<BlogPost>> {
    Ok(Json(BlogService::new(state.pool()).toggle_featured(id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn request() -> BlogPostRequest {
        BlogPostRequest {
            title: "  Primeros pasos del bebé ".to_string(),
            excerpt: Some(String::new()),
            content: "Consejos prácticos para acompañar a tu bebé en sus primeros pasos en casa."
                .to_string(),
            image_url: None,
            tags: vec![
                "Desarrollo".to_string(),
                " ".to_string(),
                "desarrollo".to_string(),
                "Bebés".to_string(),
            ],
        }
    }

    #[test]
    fn test_blog_post_request_normalizes() {
        let input = request().validate().unwrap();
        assert_eq!(input.title, "Primeros pasos del bebé");
        assert_eq!(input.excerpt, None);
        assert_eq!(input.tags, vec!["Desarrollo".to_string(), "Bebés".to_string()]);
    }

    #[test]
    fn test_blog_post_request_rejects_short_content() {
        let mut bad = request();
        bad.title = "Hola".to_string();
        bad.content = "Muy corto".to_string();

        let Err(AppError::Validation(errors)) = bad.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("title").is_some());
        assert!(errors.get("content").is_some());
    }
}
