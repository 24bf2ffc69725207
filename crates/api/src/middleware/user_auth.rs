//! Bearer-token authentication middleware.
//!
//! Resolves the caller's user id from a JWT access token before any engine
//! operation runs. The engine itself never sees a session, only the
//! resolved `user_id`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use persistence::repositories::UserRepository;

use crate::app::AppState;

/// Authenticated caller, stored in request extensions for handlers.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User id from the token's subject claim.
    pub user_id: i64,
    /// Token id (jti), carried through for log correlation.
    pub jti: String,
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

fn authenticate(state: &AppState, req: &Request<Body>) -> Result<UserAuth, Response> {
    let token = bearer_token(req)
        .ok_or_else(|| unauthorized_response("Missing or invalid Authorization header"))?;

    let claims = state.token_signer.validate(token).map_err(|e| {
        tracing::debug!("token validation failed: {}", e);
        unauthorized_response("Invalid or expired token")
    })?;

    let user_id = claims
        .user_id()
        .map_err(|_| unauthorized_response("Invalid or expired token"))?;

    Ok(UserAuth {
        user_id,
        jti: claims.jti,
    })
}

/// Middleware that requires a valid access token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, &req) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(response) => response,
    }
}

/// Middleware that requires a valid access token belonging to an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match authenticate(&state, &req) {
        Ok(auth) => auth,
        Err(response) => return response,
    };

    let users = UserRepository::new(state.pool.clone());
    match users.find_by_id(auth.user_id).await {
        Ok(Some(user)) if user.is_admin => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Ok(_) => forbidden_response("Administrator privileges required"),
        Err(e) => {
            tracing::error!("admin lookup failed: {}", e);
            internal_error_response("Authentication service unavailable")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let req = Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_unauthorized_response_status() {
        let response = unauthorized_response("no token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_response_status() {
        let response = forbidden_response("admins only");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
