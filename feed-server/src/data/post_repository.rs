use crate::domain::error::DomainError;
use crate::domain::feed::{FeedWindow, Requester};
use crate::domain::post::{FeedPost, NewPost, Post};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Ids of the visible posts on one feed page, ascending.
    async fn visible_ids_for_page(
        &self,
        viewer: Requester,
        window: FeedWindow,
    ) -> Result<Vec<i64>, DomainError>;

    /// Total number of posts visible to the viewer.
    async fn count_visible(&self, viewer: Requester) -> Result<i64, DomainError>;

    /// Full rows for a selected id window, author name joined, in id order.
    async fn feed_posts_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedPost>, DomainError>;

    /// Single post lookup under the visibility predicate.
    async fn find_visible_by_id(
        &self,
        id: i64,
        viewer: Requester,
    ) -> Result<Option<FeedPost>, DomainError>;

    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn visible_ids_for_page(
        &self,
        viewer: Requester,
        window: FeedWindow,
    ) -> Result<Vec<i64>, DomainError> {
        // Keyset window in one statement: the inner scan walks the first
        // `prior_rows` visible ids in order and its greatest id becomes the
        // cursor floor (-1 when page 1 or past the end); the outer scan
        // takes the next `limit` visible ids above the floor.
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM posts
            WHERE id > (
                SELECT COALESCE(MAX(id), -1) FROM (
                    SELECT id FROM posts
                    WHERE published OR author_id = $1
                    ORDER BY id
                    LIMIT $2
                ) AS prior_pages
            )
            AND (published OR author_id = $1)
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(viewer.author_id())
        .bind(window.prior_rows())
        .bind(window.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error selecting feed window: {}", e);
            DomainError::Store(e.to_string())
        })
    }

    async fn count_visible(&self, viewer: Requester) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE published OR author_id = $1
            "#,
        )
        .bind(viewer.author_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("db error counting visible posts: {}", e);
            DomainError::Store(e.to_string())
        })
    }

    async fn feed_posts_by_ids(&self, ids: &[i64]) -> Result<Vec<FeedPost>, DomainError> {
        // ORDER BY keeps the rows in window order; ANY($1) alone returns
        // them in whatever order the scan produces.
        sqlx::query_as::<_, FeedPost>(
            r#"
            SELECT p.id, p.title, p.content, p.published, p.author_id,
                   u.name AS author_name
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE p.id = ANY($1)
            ORDER BY p.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error fetching feed rows: {}", e);
            DomainError::Store(e.to_string())
        })
    }

    async fn find_visible_by_id(
        &self,
        id: i64,
        viewer: Requester,
    ) -> Result<Option<FeedPost>, DomainError> {
        sqlx::query_as::<_, FeedPost>(
            r#"
            SELECT p.id, p.title, p.content, p.published, p.author_id,
                   u.name AS author_name
            FROM posts p
            LEFT JOIN users u ON u.id = p.author_id
            WHERE p.id = $1 AND (p.published OR p.author_id = $2)
            "#,
        )
        .bind(id)
        .bind(viewer.author_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_visible_by_id {}: {}", id, e);
            DomainError::Store(e.to_string())
        })
    }

    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, published, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, published, author_id
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Store(e.to_string())
        })?;

        info!(post_id = created.id, published = created.published, "post created");
        Ok(created)
    }
}
