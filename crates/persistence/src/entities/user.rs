//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::User;
use sqlx::FromRow;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(row: UserEntity) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: Some(row.password_hash),
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}
