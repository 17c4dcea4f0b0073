//! Blog posts and comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use babycash_core::{BlogCommentId, BlogPostId, Email, UserId};

/// Public author details embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
}

/// A blog post with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub view_count: i64,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorInfo,
}

impl BlogPost {
    #[must_use]
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author.id == user_id
    }
}

/// Validated fields for creating or editing a post.
#[derive(Debug, Clone)]
pub struct BlogPostInput {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// A comment, optionally with nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComment {
    pub id: BlogCommentId,
    pub content: String,
    pub blog_post_id: BlogPostId,
    pub user: AuthorInfo,
    pub parent_comment_id: Option<BlogCommentId>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub replies: Vec<BlogComment>,
}

/// Attach replies to their top-level comments.
///
/// `top_level` keeps its order. Replies are grouped under their parent in
/// the order given, so callers pass them oldest first. Replies whose parent
/// is not in `top_level` are dropped.
#[must_use]
pub fn nest_replies(top_level: Vec<BlogComment>, replies: Vec<BlogComment>) -> Vec<BlogComment> {
    let mut threads = top_level;
    for reply in replies {
        if let Some(parent) = threads
            .iter_mut()
            .find(|c| Some(c.id) == reply.parent_comment_id)
        {
            parent.replies.push(reply);
        }
    }
    threads
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn comment(id: i32, parent: Option<i32>) -> BlogComment {
        BlogComment {
            id: BlogCommentId::new(id),
            content: format!("comentario {id}"),
            blog_post_id: BlogPostId::new(1),
            user: AuthorInfo {
                id: UserId::new(2),
                first_name: "Demo".to_string(),
                last_name: "User".to_string(),
                email: Email::parse("demo@babycash.com").unwrap(),
            },
            parent_comment_id: parent.map(BlogCommentId::new),
            approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            replies: vec![],
        }
    }

    #[test]
    fn test_nest_replies() {
        let threads = nest_replies(
            vec![comment(5, None), comment(3, None)],
            vec![comment(6, Some(3)), comment(7, Some(5)), comment(8, Some(3)), comment(9, Some(42))],
        );

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, BlogCommentId::new(5));
        assert_eq!(threads[0].replies.len(), 1);
        let ids: Vec<_> = threads[1].replies.iter().map(|r| r.id.as_i32()).collect();
        assert_eq!(ids, vec![6, 8]);
    }
}
