//! Blog comment repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{BlogCommentId, BlogPostId, Email, Page, PageRequest, UserId};

use super::RepositoryError;
use crate::models::blog::{AuthorInfo, BlogComment};

const COMMENT_SELECT: &str = r"
    SELECT c.id, c.post_id, c.parent_id, c.content, c.approved, c.created_at, c.updated_at,
           u.id AS user_id, u.first_name AS user_first_name,
           u.last_name AS user_last_name, u.email AS user_email
    FROM babycash.blog_comment c
    JOIN babycash.user u ON u.id = c.user_id
";

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i32,
    post_id: i32,
    parent_id: Option<i32>,
    content: String,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_id: i32,
    user_first_name: String,
    user_last_name: String,
    user_email: String,
}

impl TryFrom<CommentRow> for BlogComment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid commenter email in database: {e}"))
        })?;

        Ok(Self {
            id: BlogCommentId::new(row.id),
            content: row.content,
            blog_post_id: BlogPostId::new(row.post_id),
            user: AuthorInfo {
                id: UserId::new(row.user_id),
                first_name: row.user_first_name,
                last_name: row.user_last_name,
                email,
            },
            parent_comment_id: row.parent_id.map(BlogCommentId::new),
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
            replies: Vec::new(),
        })
    }
}

fn convert(rows: Vec<CommentRow>) -> Result<Vec<BlogComment>, RepositoryError> {
    rows.into_iter().map(BlogComment::try_from).collect()
}

/// Repository for blog comment operations.
pub struct BlogCommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogCommentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a comment without its replies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BlogCommentId) -> Result<Option<BlogComment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(BlogComment::try_from).transpose()
    }

    /// Insert an unapproved comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        post_id: BlogPostId,
        user_id: UserId,
        parent_id: Option<BlogCommentId>,
        content: &str,
    ) -> Result<BlogComment, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO babycash.blog_comment (post_id, user_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(BlogCommentId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Approved top-level comments of a post, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_top_level(
        &self,
        post_id: BlogPostId,
    ) -> Result<Vec<BlogComment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 AND c.approved AND c.parent_id IS NULL \
             ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Approved replies of a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn approved_replies(
        &self,
        post_id: BlogPostId,
    ) -> Result<Vec<BlogComment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 AND c.approved AND c.parent_id IS NOT NULL \
             ORDER BY c.created_at, c.id"
        ))
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Number of approved comments on a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_approved(&self, post_id: BlogPostId) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM babycash.blog_comment WHERE post_id = $1 AND approved",
        )
        .bind(post_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// Comments awaiting moderation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending(&self, page: PageRequest) -> Result<Page<BlogComment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE NOT c.approved ORDER BY c.created_at, c.id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = self.count_pending().await?;
        Ok(Page::new(convert(rows)?, page, total))
    }

    /// Number of comments awaiting moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM babycash.blog_comment WHERE NOT approved")
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Every comment written by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<BlogComment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Replace the text of a comment and send it back to moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn update_content(
        &self,
        id: BlogCommentId,
        content: &str,
    ) -> Result<BlogComment, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE babycash.blog_comment
            SET content = $2, approved = FALSE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(content)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Mark a comment approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn approve(&self, id: BlogCommentId) -> Result<BlogComment, RepositoryError> {
        let result = sqlx::query(
            "UPDATE babycash.blog_comment SET approved = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a comment and, by cascade, its replies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment does not exist.
    pub async fn delete(&self, id: BlogCommentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.blog_comment WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
