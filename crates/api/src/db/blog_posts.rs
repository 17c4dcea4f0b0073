//! Blog post repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{BlogPostId, Email, Page, PageRequest, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::blog::{AuthorInfo, BlogPost, BlogPostInput};

const POST_SELECT: &str = r"
    SELECT p.id, p.title, p.slug, p.excerpt, p.content, p.image_url, p.published, p.featured,
           p.view_count, p.tags, p.published_at, p.created_at, p.updated_at,
           u.id AS author_id, u.first_name AS author_first_name,
           u.last_name AS author_last_name, u.email AS author_email
    FROM babycash.blog_post p
    JOIN babycash.user u ON u.id = p.author_id
";

const PUBLISHED_NEWEST: &str = "p.published_at DESC NULLS LAST, p.id DESC";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i32,
    title: String,
    slug: String,
    excerpt: Option<String>,
    content: String,
    image_url: Option<String>,
    published: bool,
    featured: bool,
    view_count: i64,
    tags: Vec<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i32,
    author_first_name: String,
    author_last_name: String,
    author_email: String,
}

impl TryFrom<PostRow> for BlogPost {
    type Error = RepositoryError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.author_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid author email in database: {e}"))
        })?;

        Ok(Self {
            id: BlogPostId::new(row.id),
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            image_url: row.image_url,
            published: row.published,
            featured: row.featured,
            view_count: row.view_count,
            tags: row.tags,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author: AuthorInfo {
                id: UserId::new(row.author_id),
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                email,
            },
        })
    }
}

fn convert(rows: Vec<PostRow>) -> Result<Vec<BlogPost>, RepositoryError> {
    rows.into_iter().map(BlogPost::try_from).collect()
}

/// Repository for blog post operations.
pub struct BlogPostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogPostRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a post by ID, published or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(BlogPost::try_from).transpose()
    }

    /// Get a post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(BlogPost::try_from).transpose()
    }

    /// All slugs starting with `base`, used to pick a free suffix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slugs_like(
        &self,
        base: &str,
        except: Option<BlogPostId>,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut prefix = like_pattern(base);
        // like_pattern wraps in %...%; anchor to the start
        prefix.remove(0);

        Ok(sqlx::query_scalar(
            r"
            SELECT slug FROM babycash.blog_post
            WHERE slug LIKE $1 AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(prefix)
        .bind(except)
        .fetch_all(self.pool)
        .await?)
    }

    /// Insert a draft post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    pub async fn create(
        &self,
        author: UserId,
        input: &BlogPostInput,
        slug: &str,
    ) -> Result<BlogPost, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO babycash.blog_post (title, slug, excerpt, content, author_id, image_url, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(slug)
        .bind(input.excerpt.as_deref())
        .bind(&input.content)
        .bind(author)
        .bind(input.image_url.as_deref())
        .bind(&input.tags)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "slug already exists"))?;

        self.get_by_id(BlogPostId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace the editable fields of a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn update(
        &self,
        id: BlogPostId,
        input: &BlogPostInput,
        slug: &str,
    ) -> Result<BlogPost, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE babycash.blog_post
            SET title = $2, slug = $3, excerpt = $4, content = $5, image_url = $6, tags = $7,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(slug)
        .bind(input.excerpt.as_deref())
        .bind(&input.content)
        .bind(input.image_url.as_deref())
        .bind(&input.tags)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a post and, by cascade, its comments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn delete(&self, id: BlogPostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.blog_post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Publish (stamping `published_at` on first publish) or unpublish a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn set_published(
        &self,
        id: BlogPostId,
        published: bool,
    ) -> Result<BlogPost, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE babycash.blog_post
            SET published = $2,
                published_at = CASE WHEN $2 THEN COALESCE(published_at, NOW()) ELSE published_at END,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(published)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    pub async fn set_featured(
        &self,
        id: BlogPostId,
        featured: bool,
    ) -> Result<BlogPost, RepositoryError> {
        let result = sqlx::query(
            "UPDATE babycash.blog_post SET featured = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(featured)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Number of posts currently featured.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_featured(&self) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM babycash.blog_post WHERE featured")
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Bump the view counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_views(&self, id: BlogPostId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE babycash.blog_post SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(&self, page: PageRequest) -> Result<Page<BlogPost>, RepositoryError> {
        self.page_of("p.published", None, PUBLISHED_NEWEST, page).await
    }

    /// Published posts whose title, excerpt or content contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepositoryError> {
        let pattern = like_pattern(term);
        self.page_of(
            "p.published AND (p.title ILIKE $1 OR p.content ILIKE $1 OR p.excerpt ILIKE $1)",
            Some(pattern.as_str()),
            PUBLISHED_NEWEST,
            page,
        )
        .await
    }

    /// Published posts carrying `tag`, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(
        &self,
        tag: &str,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepositoryError> {
        self.page_of(
            "p.published AND EXISTS (SELECT 1 FROM UNNEST(p.tags) t WHERE LOWER(t) = LOWER($1))",
            Some(tag.trim()),
            PUBLISHED_NEWEST,
            page,
        )
        .await
    }

    /// Every post by one author, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_author(
        &self,
        author: UserId,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT} WHERE p.author_id = $1 ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(author)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM babycash.blog_post WHERE author_id = $1")
                .bind(author)
                .fetch_one(self.pool)
                .await?;

        Ok(Page::new(convert(rows)?, page, total))
    }

    /// Every post, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, page: PageRequest) -> Result<Page<BlogPost>, RepositoryError> {
        self.page_of("TRUE", None, "p.created_at DESC, p.id DESC", page)
            .await
    }

    /// Up to `limit` published and featured posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT} WHERE p.published AND p.featured ORDER BY {PUBLISHED_NEWEST} LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Up to `limit` published posts with the most views.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_most_viewed(&self, limit: i64) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT} WHERE p.published ORDER BY p.view_count DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Run a paged query. `filter` may reference `$1`, bound to `arg`.
    async fn page_of(
        &self,
        filter: &str,
        arg: Option<&str>,
        order: &str,
        page: PageRequest,
    ) -> Result<Page<BlogPost>, RepositoryError> {
        let (limit_at, offset_at) = if arg.is_some() { (2, 3) } else { (1, 2) };

        let sql = format!(
            "{POST_SELECT} WHERE {filter} ORDER BY {order} LIMIT ${limit_at} OFFSET ${offset_at}"
        );
        let mut query = sqlx::query_as::<_, PostRow>(&sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM babycash.blog_post p WHERE {filter}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(arg) = arg {
            count = count.bind(arg);
        }
        let total = count.fetch_one(self.pool).await?;

        Ok(Page::new(convert(rows)?, page, total))
    }
}
