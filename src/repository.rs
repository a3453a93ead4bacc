use crate::error::ApiError;
use crate::models::{Article, CreateArticleRequest, CreateUserRequest, UpdateArticleRequest, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the concrete
/// implementation (Postgres in production, mocks and in-memory stores in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// The store is treated as independently consistent: it owns per-row atomicity
/// and no in-process locking happens above it. A database failure surfaces as
/// `ApiError::Store`; "row absent" is modeled with `Option`/`bool` so the
/// handlers can distinguish it from an operational error.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Articles ---
    /// All articles, newest first.
    async fn get_articles(&self) -> Result<Vec<Article>, ApiError>;
    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, ApiError>;
    /// Inserts a new article owned by `user_id`. The identifier is generated
    /// here, never supplied by the client.
    async fn create_article(
        &self,
        req: CreateArticleRequest,
        user_id: Uuid,
    ) -> Result<Article, ApiError>;
    /// Partial merge: a `None` field keeps its stored value. Returns `None`
    /// when no article with `id` exists.
    async fn update_article(
        &self,
        id: Uuid,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, ApiError>;
    /// Returns true if a row was actually removed.
    async fn delete_article(&self, id: Uuid) -> Result<bool, ApiError>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_articles(&self) -> Result<Vec<Article>, ApiError> {
        let articles = sqlx::query_as::<_, Article>(
            "SELECT id, title, content, user_id, created_at, updated_at \
             FROM articles ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, ApiError> {
        let article = sqlx::query_as::<_, Article>(
            "SELECT id, title, content, user_id, created_at, updated_at \
             FROM articles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn create_article(
        &self,
        req: CreateArticleRequest,
        user_id: Uuid,
    ) -> Result<Article, ApiError> {
        let new_id = Uuid::new_v4();
        let article = sqlx::query_as::<_, Article>(
            "INSERT INTO articles (id, title, content, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             RETURNING id, title, content, user_id, created_at, updated_at",
        )
        .bind(new_id)
        .bind(req.title)
        .bind(req.content)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(article)
    }

    /// update_article
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle `Option<T>` fields,
    /// only updating a column when the corresponding field in `req` is `Some`.
    /// `user_id` is deliberately absent from the SET list: ownership is fixed
    /// at creation.
    async fn update_article(
        &self,
        id: Uuid,
        req: UpdateArticleRequest,
    ) -> Result<Option<Article>, ApiError> {
        let article = sqlx::query_as::<_, Article>(
            "UPDATE articles \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, title, content, user_id, created_at, updated_at",
        )
        .bind(id)
        .bind(req.title)
        .bind(req.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, req: CreateUserRequest) -> Result<User, ApiError> {
        let new_id = Uuid::new_v4();
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, password, role",
        )
        .bind(new_id)
        .bind(req.name)
        .bind(req.email)
        .bind(req.password)
        .bind(req.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
