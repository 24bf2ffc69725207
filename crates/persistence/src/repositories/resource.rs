//! Resource repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::services::lifecycle::{ResourceCatalog, StorageError};

use crate::entities::ResourceEntity;
use crate::metrics::QueryTimer;

/// Repository for resource-related database operations.
///
/// Doubles as the lifecycle engine's [`ResourceCatalog`]: the engine only
/// ever asks whether a resource exists.
#[derive(Clone)]
pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    /// Creates a new ResourceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new resource. Fails on duplicate name (unique constraint).
    pub async fn create(
        &self,
        name: &str,
        comment: Option<&str>,
    ) -> Result<ResourceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_resource");
        let result = sqlx::query_as::<_, ResourceEntity>(
            r#"
            INSERT INTO resources (name, comment)
            VALUES ($1, $2)
            RETURNING id, name, comment, created_at
            "#,
        )
        .bind(name)
        .bind(comment)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a resource by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ResourceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_resource_by_id");
        let result = sqlx::query_as::<_, ResourceEntity>(
            r#"
            SELECT id, name, comment, created_at
            FROM resources
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rename a resource and/or replace its comment. Returns `None` if the
    /// resource does not exist.
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Option<ResourceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_resource");
        let result = sqlx::query_as::<_, ResourceEntity>(
            r#"
            UPDATE resources
            SET name = COALESCE($2, name),
                comment = COALESCE($3, comment)
            WHERE id = $1
            RETURNING id, name, comment, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all resources, oldest first.
    pub async fn list(&self) -> Result<Vec<ResourceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_resources");
        let result = sqlx::query_as::<_, ResourceEntity>(
            r#"
            SELECT id, name, comment, created_at
            FROM resources
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait]
impl ResourceCatalog for ResourceRepository {
    async fn resource_exists(&self, resource_id: i64) -> Result<bool, StorageError> {
        let timer = QueryTimer::new("resource_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM resources WHERE id = $1)
            "#,
        )
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }
}
