//! Authentication routes: login and logout.
//!
//! Login exchanges credentials for a JWT access token. Tokens are
//! stateless, so logout only exists for client symmetry.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use persistence::repositories::UserRepository;
use shared::password::verify_password;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    /// Plaintext password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// User information in the login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Response body for successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Log in with name and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_name(&request.name)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid name or password".to_string()))?;

    let matches = verify_password(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;
    if !matches {
        return Err(ApiError::Unauthorized("Invalid name or password".to_string()));
    }

    let (access_token, jti) = state
        .token_signer
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("Token issuance failed: {}", e)))?;

    tracing::info!(user_id = user.id, %jti, "user logged in");

    Ok(Json(LoginResponse {
        user: UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        },
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_signer.expiry_secs,
    }))
}

/// Log out. Tokens are stateless; the client discards its copy.
///
/// POST /api/v1/auth/logout
pub async fn logout(Extension(auth): Extension<UserAuth>) -> StatusCode {
    tracing::info!(user_id = auth.user_id, jti = %auth.jti, "user logged out");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            name: "jane".to_string(),
            password: "pass".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_request_rejects_empty_fields() {
        let request = LoginRequest {
            name: "".to_string(),
            password: "pass".to_string(),
        };
        assert!(request.validate().is_err());

        let request = LoginRequest {
            name: "jane".to_string(),
            password: "".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            user: UserResponse {
                id: 1,
                name: "jane".to_string(),
                email: "jane@example.com".to_string(),
                is_admin: false,
            },
            access_token: "token".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"accessToken\":\"token\""));
        assert!(json.contains("\"tokenType\":\"Bearer\""));
        assert!(json.contains("\"isAdmin\":false"));
    }
}
