//! Blog comments and their moderation queue.

use sqlx::PgPool;

use babycash_core::{BlogCommentId, BlogPostId, Page, PageRequest};

use crate::db::blog_comments::BlogCommentRepository;
use crate::db::blog_posts::BlogPostRepository;
use crate::error::{AppError, Result};
use crate::models::CurrentUser;
use crate::models::blog::{BlogComment, nest_replies};

pub struct CommentService<'a> {
    comments: BlogCommentRepository<'a>,
    posts: BlogPostRepository<'a>,
}

impl<'a> CommentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            comments: BlogCommentRepository::new(pool),
            posts: BlogPostRepository::new(pool),
        }
    }

    /// Add a comment or a reply. New comments wait for moderation.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the post or parent comment does not exist
    /// - `AppError::Business` if the parent belongs to another post
    pub async fn create(
        &self,
        user: &CurrentUser,
        post_id: BlogPostId,
        parent_id: Option<BlogCommentId>,
        content: &str,
    ) -> Result<BlogComment> {
        if self.posts.get_by_id(post_id).await?.is_none() {
            return Err(AppError::not_found("Blog post not found"));
        }

        if let Some(parent_id) = parent_id {
            let parent = self
                .comments
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Parent comment not found"))?;
            if parent.blog_post_id != post_id {
                return Err(AppError::business(
                    "Parent comment does not belong to this post",
                ));
            }
        }

        let comment = self
            .comments
            .create(post_id, user.id, parent_id, content.trim())
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment awaiting approval");
        Ok(comment)
    }

    /// Approved threads of a post: newest first, replies oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn threads(&self, post_id: BlogPostId) -> Result<Vec<BlogComment>> {
        let top_level = self.comments.approved_top_level(post_id).await?;
        let replies = self.comments.approved_replies(post_id).await?;
        Ok(nest_replies(top_level, replies))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn count_approved(&self, post_id: BlogPostId) -> Result<i64> {
        Ok(self.comments.count_approved(post_id).await?)
    }

    /// Edit one of the caller's comments. It goes back to moderation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the comment does not exist on
    /// `post_id`, or `AppError::Business` if the caller did not write it.
    pub async fn update(
        &self,
        user: &CurrentUser,
        post_id: BlogPostId,
        id: BlogCommentId,
        content: &str,
    ) -> Result<BlogComment> {
        let comment = self.get(post_id, id).await?;
        if comment.user.id != user.id {
            return Err(AppError::business("You can only edit your own comments"));
        }
        Ok(self.comments.update_content(id, content.trim()).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the comment does not exist on
    /// `post_id`, or `AppError::Business` if the caller is neither its
    /// author nor an admin.
    pub async fn delete(
        &self,
        user: &CurrentUser,
        post_id: BlogPostId,
        id: BlogCommentId,
    ) -> Result<()> {
        let comment = self.get(post_id, id).await?;
        if comment.user.id != user.id && !user.is_admin() {
            return Err(AppError::business("You can only delete your own comments"));
        }
        Ok(self.comments.delete(id).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn pending(&self, page: PageRequest) -> Result<Page<BlogComment>> {
        Ok(self.comments.pending(page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64> {
        Ok(self.comments.count_pending().await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the comment does not exist on `post_id`.
    pub async fn approve(&self, post_id: BlogPostId, id: BlogCommentId) -> Result<BlogComment> {
        self.get(post_id, id).await?;
        let comment = self.comments.approve(id).await?;
        tracing::info!(comment_id = %id, "Comment approved");
        Ok(comment)
    }

    /// Every comment a user wrote, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn by_user(&self, user: &CurrentUser) -> Result<Vec<BlogComment>> {
        Ok(self.comments.list_by_user(user.id).await?)
    }

    async fn get(&self, post_id: BlogPostId, id: BlogCommentId) -> Result<BlogComment> {
        on_post(self.comments.get_by_id(id).await?, post_id)
    }
}

/// A comment addressed through the wrong post is as missing as one that
/// does not exist.
fn on_post(comment: Option<BlogComment>, post_id: BlogPostId) -> Result<BlogComment> {
    comment
        .filter(|c| c.blog_post_id == post_id)
        .ok_or_else(|| AppError::not_found("Comment not found"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use babycash_core::{Email, UserId};

    use super::*;
    use crate::models::blog::AuthorInfo;

    fn comment_on(post: i32) -> BlogComment {
        BlogComment {
            id: BlogCommentId::new(7),
            content: "¡Gracias por la guía!".to_string(),
            blog_post_id: BlogPostId::new(post),
            user: AuthorInfo {
                id: UserId::new(2),
                first_name: "Demo".to_string(),
                last_name: "User".to_string(),
                email: Email::parse("demo@babycash.com").unwrap(),
            },
            parent_comment_id: None,
            approved: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            replies: vec![],
        }
    }

    #[test]
    fn test_comment_on_its_own_post_is_found() {
        let comment = on_post(Some(comment_on(1)), BlogPostId::new(1)).unwrap();
        assert_eq!(comment.id, BlogCommentId::new(7));
    }

    #[test]
    fn test_comment_through_another_post_is_not_found() {
        assert!(matches!(
            on_post(Some(comment_on(1)), BlogPostId::new(2)),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            on_post(None, BlogPostId::new(1)),
            Err(AppError::NotFound(_))
        ));
    }
}
