//! Database service for blog-service.

use crate::models::{
    AuthorProfile, Category, Comment, CreateCategory, CreateComment, CreatePost, ListPostsFilter,
    Post, Tag, UpdateAuthorProfile, UpdatePost,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::slug::{pick_unique_slug, slugify, tag_slug};
use platform_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shared SELECT for post reads: the post row, its category, and the
/// comment and like counts.
const POST_SELECT: &str = r#"
    SELECT p.post_id, p.title, p.slug, p.content, p.excerpt, p.featured_image_url,
           p.author_id, p.author_username, p.category_id, p.status, p.views,
           p.created_utc, p.updated_utc,
           c.name AS category_name, c.slug AS category_slug,
           c.description AS category_description, c.created_utc AS category_created_utc,
           (SELECT COUNT(*) FROM posts cp WHERE cp.category_id = p.category_id) AS category_post_count,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.post_id) AS comments_count,
           (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.post_id) AS likes_count
    FROM posts p
    LEFT JOIN categories c ON c.category_id = p.category_id
"#;

/// One tag attachment row, used to batch tag loading across posts.
#[derive(Debug, FromRow)]
struct TagAttachment {
    post_id: Uuid,
    tag_id: Uuid,
    name: String,
    slug: String,
    post_count: i64,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "blog-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Post Operations
    // =========================================================================

    /// List published posts, newest first. `query` matches a case-insensitive
    /// substring of the title, content, excerpt, or author username.
    #[instrument(skip(self, filter))]
    pub async fn list_posts(&self, filter: &ListPostsFilter) -> Result<Vec<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_posts"])
            .start_timer();

        let sql = format!(
            r#"
            {POST_SELECT}
            WHERE p.status = 'published'
              AND ($1::text IS NULL
                   OR p.title ILIKE '%' || $1 || '%'
                   OR p.content ILIKE '%' || $1 || '%'
                   OR p.excerpt ILIKE '%' || $1 || '%'
                   OR p.author_username ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR c.slug = $2)
              AND ($3::text IS NULL OR EXISTS (
                    SELECT 1 FROM post_tags pt
                    JOIN tags t ON t.tag_id = pt.tag_id
                    WHERE pt.post_id = p.post_id AND t.slug = $3))
            ORDER BY p.created_utc DESC
            LIMIT $4 OFFSET $5
            "#
        );

        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(&filter.query)
            .bind(&filter.category_slug)
            .bind(&filter.tag_slug)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list posts: {}", e)))?;

        timer.observe_duration();
        Ok(posts)
    }

    /// Every post by one author, drafts included, newest first.
    #[instrument(skip(self), fields(author_id = %author_id))]
    pub async fn list_posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_posts_by_author"])
            .start_timer();

        let sql = format!("{POST_SELECT} WHERE p.author_id = $1 ORDER BY p.created_utc DESC");
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list author posts: {}", e))
            })?;

        timer.observe_duration();
        Ok(posts)
    }

    /// Get a post by id.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_post"])
            .start_timer();

        let sql = format!("{POST_SELECT} WHERE p.post_id = $1");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get post: {}", e)))?;

        timer.observe_duration();
        Ok(post)
    }

    /// Get a post by slug.
    #[instrument(skip(self))]
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_post_by_slug"])
            .start_timer();

        let sql = format!("{POST_SELECT} WHERE p.slug = $1");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get post: {}", e)))?;

        timer.observe_duration();
        Ok(post)
    }

    /// Get a post by slug for a detail read, bumping its view counter in
    /// the same statement.
    #[instrument(skip(self))]
    pub async fn read_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["read_post_by_slug"])
            .start_timer();

        let sql = format!(
            r#"
            WITH bumped AS (
                UPDATE posts SET views = views + 1 WHERE slug = $1 RETURNING *
            )
            {}
            "#,
            POST_SELECT.replacen("FROM posts p", "FROM bumped p", 1)
        );

        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to read post: {}", e)))?;

        timer.observe_duration();
        Ok(post)
    }

    /// Create a post and attach its tags. The slug is derived from the
    /// title; on collision a numeric suffix disambiguates.
    #[instrument(skip(self, input), fields(author_id = %input.author_id))]
    pub async fn create_post(&self, input: &CreatePost) -> Result<Post, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_post"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let base = slugify(&input.title);
        let base = if base.is_empty() {
            "post".to_string()
        } else {
            base
        };

        let taken = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM posts WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(&base)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check slugs: {}", e)))?;
        let slug = pick_unique_slug(&base, &taken);

        let post_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO posts (post_id, title, slug, content, excerpt, featured_image_url,
                               author_id, author_username, category_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING post_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(&slug)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.featured_image_url)
        .bind(input.author_id)
        .bind(&input.author_username)
        .bind(input.category_id)
        .bind(input.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert post: {}", e)))?;

        attach_tags(&mut tx, post_id, &input.tags).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        info!(post_id = %post_id, slug = %slug, "Post created");

        self.get_post(post_id)
            .await?
            .ok_or_else(|| AppError::DatabaseError(anyhow::anyhow!("Post row missing after insert")))
    }

    /// Update a post. Absent fields are left unchanged; a present `tags`
    /// list replaces the whole tag set. The slug never changes after
    /// creation. Returns `None` when the post does not exist.
    #[instrument(skip(self, input), fields(post_id = %post_id))]
    pub async fn update_post(
        &self,
        post_id: Uuid,
        input: &UpdatePost,
    ) -> Result<Option<Post>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_post"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                excerpt = COALESCE($4, excerpt),
                featured_image_url = COALESCE($5, featured_image_url),
                category_id = COALESCE($6, category_id),
                status = COALESCE($7, status),
                updated_utc = NOW()
            WHERE post_id = $1
            RETURNING post_id
            "#,
        )
        .bind(post_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.featured_image_url)
        .bind(input.category_id)
        .bind(input.status.map(|s| s.as_str()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update post: {}", e)))?;

        if updated.is_none() {
            tx.rollback().await.ok();
            return Ok(None);
        }

        if let Some(tags) = &input.tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear tags: {}", e))
                })?;
            attach_tags(&mut tx, post_id, tags).await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        self.get_post(post_id).await
    }

    /// Delete a post. Comments, likes, and tag links go with it.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn delete_post(&self, post_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_post"])
            .start_timer();

        let deleted = sqlx::query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete post: {}", e)))?;

        timer.observe_duration();
        Ok(deleted.rows_affected() > 0)
    }

    /// Tags for one post, alphabetically.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn get_post_tags(&self, post_id: Uuid) -> Result<Vec<Tag>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_post_tags"])
            .start_timer();

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.tag_id, t.name, t.slug,
                   (SELECT COUNT(*) FROM post_tags x WHERE x.tag_id = t.tag_id) AS post_count
            FROM post_tags pt
            JOIN tags t ON t.tag_id = pt.tag_id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get post tags: {}", e)))?;

        timer.observe_duration();
        Ok(tags)
    }

    /// Tags for a batch of posts in one query, keyed by post id.
    #[instrument(skip(self, post_ids))]
    pub async fn get_tags_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tag>>, AppError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tags_for_posts"])
            .start_timer();

        let rows = sqlx::query_as::<_, TagAttachment>(
            r#"
            SELECT pt.post_id, t.tag_id, t.name, t.slug,
                   (SELECT COUNT(*) FROM post_tags x WHERE x.tag_id = t.tag_id) AS post_count
            FROM post_tags pt
            JOIN tags t ON t.tag_id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to batch tags: {}", e)))?;

        let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_post.entry(row.post_id).or_default().push(Tag {
                tag_id: row.tag_id,
                name: row.name,
                slug: row.slug,
                post_count: row.post_count,
            });
        }

        timer.observe_duration();
        Ok(by_post)
    }

    // =========================================================================
    // Like Operations
    // =========================================================================

    /// Toggle the caller's like on a post. Returns the state after the
    /// toggle and the resulting like count.
    #[instrument(skip(self), fields(post_id = %post_id, user_id = %user_id))]
    pub async fn toggle_post_like(
        &self,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<(bool, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["toggle_post_like"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to remove like: {}", e)))?;

        let liked = removed.rows_affected() == 0;
        if liked {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to insert like: {}", e))
                })?;
        }

        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count likes: {}", e))
                })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        Ok((liked, count))
    }

    // =========================================================================
    // Comment Operations
    // =========================================================================

    /// Create a comment. Parent validation happens in the handler, which
    /// has the post row at hand.
    #[instrument(skip(self, input), fields(post_id = %input.post_id))]
    pub async fn create_comment(&self, input: &CreateComment) -> Result<Comment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_comment"])
            .start_timer();

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (comment_id, post_id, author_id, author_username, content, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING comment_id, post_id, author_id, author_username, content, parent_id,
                      created_utc, 0::bigint AS like_count
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.post_id)
        .bind(input.author_id)
        .bind(&input.author_username)
        .bind(&input.content)
        .bind(input.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create comment: {}", e)))?;

        timer.observe_duration();
        info!(comment_id = %comment.comment_id, "Comment created");

        Ok(comment)
    }

    /// Get a comment by id.
    #[instrument(skip(self), fields(comment_id = %comment_id))]
    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_comment"])
            .start_timer();

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.comment_id, c.post_id, c.author_id, c.author_username, c.content,
                   c.parent_id, c.created_utc,
                   (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = c.comment_id) AS like_count
            FROM comments c
            WHERE c.comment_id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get comment: {}", e)))?;

        timer.observe_duration();
        Ok(comment)
    }

    /// Every comment on a post as flat rows, oldest first. Threading is
    /// assembled by the caller.
    #[instrument(skip(self), fields(post_id = %post_id))]
    pub async fn list_comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_comments_for_post"])
            .start_timer();

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.comment_id, c.post_id, c.author_id, c.author_username, c.content,
                   c.parent_id, c.created_utc,
                   (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = c.comment_id) AS like_count
            FROM comments c
            WHERE c.post_id = $1
            ORDER BY c.created_utc ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list comments: {}", e)))?;

        timer.observe_duration();
        Ok(comments)
    }

    // =========================================================================
    // Taxonomy Operations
    // =========================================================================

    /// List every category with its post count, alphabetically.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_categories"])
            .start_timer();

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.category_id, c.name, c.slug, c.description, c.created_utc,
                   (SELECT COUNT(*) FROM posts p WHERE p.category_id = c.category_id) AS post_count
            FROM categories c
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e))
        })?;

        timer.observe_duration();
        Ok(categories)
    }

    /// Create a category. The slug is derived from the name, with a
    /// numeric suffix when another category already claimed it.
    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: &CreateCategory) -> Result<Category, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_category"])
            .start_timer();

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)",
        )
        .bind(&input.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check category: {}", e)))?;

        if exists {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Category already exists"
            )));
        }

        let base = slugify(&input.name);
        let base = if base.is_empty() {
            "category".to_string()
        } else {
            base
        };
        let taken = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM categories WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(&base)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check slugs: {}", e)))?;
        let slug = pick_unique_slug(&base, &taken);

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (category_id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING category_id, name, slug, description, created_utc, 0::bigint AS post_count
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create category: {}", e))
        })?;

        timer.observe_duration();
        info!(category_id = %category.category_id, "Category created");

        Ok(category)
    }

    /// Whether a category id resolves to a row.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn category_exists(&self, category_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check category: {}", e)))?;
        Ok(exists)
    }

    /// List every tag with its post count, alphabetically.
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_tags"])
            .start_timer();

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.tag_id, t.name, t.slug,
                   (SELECT COUNT(*) FROM post_tags x WHERE x.tag_id = t.tag_id) AS post_count
            FROM tags t
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list tags: {}", e)))?;

        timer.observe_duration();
        Ok(tags)
    }

    // =========================================================================
    // Author Profile Operations
    // =========================================================================

    /// Get a profile by user id.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<AuthorProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, AuthorProfile>(
            r#"
            SELECT profile_id, user_id, username, bio, avatar_url, website, twitter, github,
                   linkedin, created_utc, updated_utc
            FROM author_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get profile: {}", e)))?;

        timer.observe_duration();
        Ok(profile)
    }

    /// Get a profile by username.
    #[instrument(skip(self))]
    pub async fn get_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AuthorProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_profile_by_username"])
            .start_timer();

        let profile = sqlx::query_as::<_, AuthorProfile>(
            r#"
            SELECT profile_id, user_id, username, bio, avatar_url, website, twitter, github,
                   linkedin, created_utc, updated_utc
            FROM author_profiles
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get profile: {}", e)))?;

        timer.observe_duration();
        Ok(profile)
    }

    /// Resolve a username to an author id through post authorship. Used to
    /// materialize a profile for an author who has published but never
    /// touched their profile.
    #[instrument(skip(self))]
    pub async fn find_post_author(&self, username: &str) -> Result<Option<Uuid>, AppError> {
        let author_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT author_id FROM posts WHERE author_username = $1 LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find author: {}", e)))?;
        Ok(author_id)
    }

    /// Fetch the caller's profile, creating an empty one on first access.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<AuthorProfile, AppError> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        let created = sqlx::query(
            r#"
            INSERT INTO author_profiles (profile_id, user_id, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create profile: {}", e)))?;

        if created.rows_affected() > 0 {
            info!(user_id = %user_id, "Author profile created");
        }

        self.get_profile(user_id).await?.ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("Profile row missing after insert"))
        })
    }

    /// Update the caller's profile. Absent fields are left unchanged.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: &UpdateAuthorProfile,
    ) -> Result<Option<AuthorProfile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_profile"])
            .start_timer();

        let profile = sqlx::query_as::<_, AuthorProfile>(
            r#"
            UPDATE author_profiles
            SET bio = COALESCE($2, bio),
                avatar_url = COALESCE($3, avatar_url),
                website = COALESCE($4, website),
                twitter = COALESCE($5, twitter),
                github = COALESCE($6, github),
                linkedin = COALESCE($7, linkedin),
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING profile_id, user_id, username, bio, avatar_url, website, twitter, github,
                      linkedin, created_utc, updated_utc
            "#,
        )
        .bind(user_id)
        .bind(&input.bio)
        .bind(&input.avatar_url)
        .bind(&input.website)
        .bind(&input.twitter)
        .bind(&input.github)
        .bind(&input.linkedin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update profile: {}", e)))?;

        timer.observe_duration();
        Ok(profile)
    }
}

/// Get-or-create each tag by name and link it to the post. Tag slugs are
/// the lowercased name with spaces replaced by hyphens.
async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    tags: &[String],
) -> Result<(), AppError> {
    for name in tags {
        sqlx::query(
            r#"
            INSERT INTO tags (tag_id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(tag_slug(name))
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert tag: {}", e)))?;

        let tag_id = sqlx::query_scalar::<_, Uuid>("SELECT tag_id FROM tags WHERE name = $1")
            .bind(name)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up tag: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO post_tags (post_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to attach tag: {}", e)))?;
    }
    Ok(())
}
