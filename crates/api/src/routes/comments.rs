//! Blog comment handlers, nested under `/api/blog/{id}/comments`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use babycash_core::{BlogCommentId, BlogPostId, Page, PageRequest};

use super::MessageResponse;
use crate::error::{FieldErrors, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::blog::BlogComment;
use crate::services::comments::CommentService;
use crate::services::validation;
use crate::state::AppState;

const MAX_CONTENT: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<BlogCommentId>,
}

impl CommentRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "content", &self.content, 1, MAX_CONTENT);
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// POST /api/blog/{id}/comments
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<BlogPostId>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<BlogComment>)> {
    request.validate()?;
    let comment = CommentService::new(state.pool())
        .create(&user, post_id, request.parent_comment_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/blog/{id}/comments
pub async fn index(
    State(state): State<AppState>,
    Path(post_id): Path<BlogPostId>,
) -> Result<Json<Vec<BlogComment>>> {
    Ok(Json(CommentService::new(state.pool()).threads(post_id).await?))
}

/// GET /api/blog/{id}/comments/count
pub async fn count(
    State(state): State<AppState>,
    Path(post_id): Path<BlogPostId>,
) -> Result<Json<CountResponse>> {
    let count = CommentService::new(state.pool())
        .count_approved(post_id)
        .await?;
    Ok(Json(CountResponse { count }))
}

/// PUT /api/blog/{id}/comments/{comment_id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((post_id, comment_id)): Path<(BlogPostId, BlogCommentId)>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<BlogComment>> {
    request.validate()?;
    Ok(Json(
        CommentService::new(state.pool())
            .update(&user, post_id, comment_id, &request.content)
            .await?,
    ))
}

/// DELETE /api/blog/{id}/comments/{comment_id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((post_id, comment_id)): Path<(BlogPostId, BlogCommentId)>,
) -> Result<Json<MessageResponse>> {
    CommentService::new(state.pool())
        .delete(&user, post_id, comment_id)
        .await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}

/// GET /api/blog/{id}/comments/admin/pending
pub async fn pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<BlogComment>>> {
    Ok(Json(CommentService::new(state.pool()).pending(page).await?))
}

/// GET /api/blog/{id}/comments/admin/pending/count
pub async fn pending_count(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CountResponse>> {
    let count = CommentService::new(state.pool()).count_pending().await?;
    Ok(Json(CountResponse { count }))
}

/// POST /api/blog/{id}/comments/{comment_id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((post_id, comment_id)): Path<(BlogPostId, BlogCommentId)>,
) -> Result<Json<BlogComment>> {
    Ok(Json(
        CommentService::new(state.pool()).approve(post_id, comment_id).await?,
    ))
}

/// GET /api/users/comments
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<BlogComment>>> {
    Ok(Json(CommentService::new(state.pool()).by_user(&user).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_request_bounds() {
        let ok = CommentRequest {
            content: "¡Muy útil!".to_string(),
            parent_comment_id: None,
        };
        assert!(ok.validate().is_ok());

        let blank = CommentRequest {
            content: "   ".to_string(),
            parent_comment_id: None,
        };
        assert!(blank.validate().is_err());

        let long = CommentRequest {
            content: "a".repeat(MAX_CONTENT + 1),
            parent_comment_id: Some(BlogCommentId::new(3)),
        };
        assert!(long.validate().is_err());
    }
}
