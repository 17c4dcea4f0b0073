//! Blog posts.

use std::collections::HashSet;

use sqlx::PgPool;

use babycash_core::slug;
use babycash_core::{BlogPostId, Page, PageRequest};

use crate::db::blog_posts::BlogPostRepository;
use crate::error::{AppError, Result};
use crate::models::CurrentUser;
use crate::models::blog::{BlogPost, BlogPostInput};

/// Posts that may be featured at once.
pub const MAX_FEATURED: i64 = 3;
/// Size of the public featured list.
pub const FEATURED_LIST_SIZE: i64 = 5;
/// Size of the most-viewed list.
pub const MOST_VIEWED_SIZE: i64 = 10;

pub struct BlogService<'a> {
    repo: BlogPostRepository<'a>,
}

impl<'a> BlogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: BlogPostRepository::new(pool),
        }
    }

    /// Create a draft owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn create(&self, author: &CurrentUser, input: &BlogPostInput) -> Result<BlogPost> {
        let slug = self.free_slug(&input.title, None).await?;
        let post = self.repo.create(author.id, input, &slug).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");
        Ok(post)
    }

    /// Edit a post. A new title gets a new slug.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the post does not exist, or
    /// `AppError::Business` if the caller is not the author.
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: BlogPostId,
        input: &BlogPostInput,
    ) -> Result<BlogPost> {
        let post = self.authored(user, id).await?;

        let slug = if post.title == input.title {
            post.slug
        } else {
            self.free_slug(&input.title, Some(id)).await?
        };

        Ok(self.repo.update(id, input, &slug).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the post does not exist, or
    /// `AppError::Business` if the caller is neither the author nor an admin.
    pub async fn delete(&self, user: &CurrentUser, id: BlogPostId) -> Result<()> {
        let post = self.get(id).await?;
        if !post.is_authored_by(user.id) && !user.is_admin() {
            return Err(AppError::business("You can only delete your own posts"));
        }

        self.repo.delete(id).await?;
        tracing::info!(post_id = %id, user_id = %user.id, "Blog post deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the post does not exist.
    pub async fn get(&self, id: BlogPostId) -> Result<BlogPost> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Blog post not found"))
    }

    /// Look a post up by slug and count the view.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no post has this slug.
    pub async fn view_by_slug(&self, slug: &str) -> Result<BlogPost> {
        let mut post = self
            .repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Blog post not found"))?;

        self.repo.increment_views(post.id).await?;
        post.view_count += 1;
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn published(&self, page: PageRequest) -> Result<Page<BlogPost>> {
        Ok(self.repo.list_published(page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<BlogPost>> {
        Ok(self.repo.list_featured(FEATURED_LIST_SIZE).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn search(&self, term: &str, page: PageRequest) -> Result<Page<BlogPost>> {
        Ok(self.repo.search(term, page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn by_tag(&self, tag: &str, page: PageRequest) -> Result<Page<BlogPost>> {
        Ok(self.repo.list_by_tag(tag, page).await?)
    }

    /// The caller's own posts, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn by_author(&self, user: &CurrentUser, page: PageRequest) -> Result<Page<BlogPost>> {
        Ok(self.repo.list_by_author(user.id, page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn most_viewed(&self) -> Result<Vec<BlogPost>> {
        Ok(self.repo.list_most_viewed(MOST_VIEWED_SIZE).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn all(&self, page: PageRequest) -> Result<Page<BlogPost>> {
        Ok(self.repo.list_all(page).await?)
    }

    /// Publish or unpublish one of the caller's posts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the post does not exist, or
    /// `AppError::Business` if the caller is not the author.
    pub async fn set_published(
        &self,
        user: &CurrentUser,
        id: BlogPostId,
        published: bool,
    ) -> Result<BlogPost> {
        self.authored(user, id).await?;
        let post = self.repo.set_published(id, published).await?;
        tracing::info!(post_id = %id, published, "Blog post publication changed");
        Ok(post)
    }

    /// Flip the featured flag, keeping at most [`MAX_FEATURED`] featured posts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the post does not exist, or
    /// `AppError::Business` when featuring would exceed the limit.
    pub async fn toggle_featured(&self, id: BlogPostId) -> Result<BlogPost> {
        let post = self.get(id).await?;

        if !post.featured && self.repo.count_featured().await? >= MAX_FEATURED {
            return Err(AppError::business(format!(
                "Maximum {MAX_FEATURED} featured posts allowed"
            )));
        }

        Ok(self.repo.set_featured(id, !post.featured).await?)
    }

    async fn authored(&self, user: &CurrentUser, id: BlogPostId) -> Result<BlogPost> {
        let post = self.get(id).await?;
        if post.is_authored_by(user.id) {
            Ok(post)
        } else {
            Err(AppError::business("You can only edit your own posts"))
        }
    }

    async fn free_slug(&self, title: &str, except: Option<BlogPostId>) -> Result<String> {
        let base = slug::slugify(title);
        let taken: HashSet<String> = self
            .repo
            .slugs_like(&base, except)
            .await?
            .into_iter()
            .collect();
        Ok(slug::unique(&base, |candidate| taken.contains(candidate)))
    }
}
