//! Resource entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Resource;
use sqlx::FromRow;

/// Database row mapping for the resources table.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceEntity {
    pub id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ResourceEntity> for Resource {
    fn from(row: ResourceEntity) -> Self {
        Resource {
            id: row.id,
            name: row.name,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}
