//! Admin user management routes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use persistence::entities::UserEntity;
use persistence::repositories::UserRepository;
use shared::password::hash_password;

use crate::app::AppState;
use crate::error::ApiError;

/// Request body for creating a user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,
}

/// User summary in admin responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for UserSummary {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Response body for the user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
    pub count: usize,
}

/// Create a user account.
///
/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    request.validate()?;

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .create(&request.name, &request.email, &password_hash, request.is_admin)
        .await?;

    tracing::info!(user_id = user.id, name = %user.name, is_admin = user.is_admin, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// List all user accounts.
///
/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = UserRepository::new(state.pool.clone());
    let list: Vec<UserSummary> = users.list().await?.into_iter().map(Into::into).collect();

    let count = list.len();
    Ok(Json(UserListResponse { users: list, count }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_request_validation() {
        let request = CreateUserRequest {
            name: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "long-enough".to_string(),
            is_admin: false,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_user_rejects_bad_email() {
        let request = CreateUserRequest {
            name: "jane".to_string(),
            email: "not-an-email".to_string(),
            password: "long-enough".to_string(),
            is_admin: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_user_rejects_short_password() {
        let request = CreateUserRequest {
            name: "jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "short".to_string(),
            is_admin: false,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_user_summary_has_no_password_material() {
        let summary = UserSummary {
            id: 1,
            name: "jane".to_string(),
            email: "jane@example.com".to_string(),
            is_admin: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"isAdmin\":true"));
    }
}
