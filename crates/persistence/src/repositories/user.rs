//! User repository for database operations.

use sqlx::PgPool;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user. Fails on duplicate name or email (unique
    /// constraints).
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by login name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_name");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all users, oldest first.
    pub async fn list(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, password_hash, is_admin, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether any admin account exists. Used by the bootstrap service.
    pub async fn admin_exists(&self) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("admin_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = true)
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
