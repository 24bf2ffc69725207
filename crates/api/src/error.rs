use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::services::lifecycle::LifecycleError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Record already exists".into()),
                        "23503" => ApiError::NotFound("Referenced record not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::ResourceNotFound(id) => {
                ApiError::NotFound(format!("Resource {} not found", id))
            }
            LifecycleError::DuplicateReservation { resource_id, .. } => ApiError::Conflict(
                format!("An active reservation already exists for resource {}", resource_id),
            ),
            LifecycleError::ReservationNotFound { resource_id, .. } => ApiError::NotFound(
                format!("No matching reservation for resource {}", resource_id),
            ),
            LifecycleError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::lifecycle::StorageError;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (
                ApiError::Unauthorized("no token".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Forbidden("admins only".into()),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                ApiError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_resource_not_found_maps_to_404() {
        let error: ApiError = LifecycleError::ResourceNotFound(7).into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_reservation_maps_to_409() {
        let error: ApiError = LifecycleError::DuplicateReservation {
            user_id: 1,
            resource_id: 2,
        }
        .into();
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_reservation_not_found_maps_to_404() {
        let error: ApiError = LifecycleError::ReservationNotFound {
            user_id: 1,
            resource_id: 2,
        }
        .into();
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let error: ApiError =
            LifecycleError::Storage(StorageError("connection reset".into())).into();
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Conflict("test".to_string())),
            "Conflict: test"
        );
        assert_eq!(
            format!("{}", ApiError::Validation("test".to_string())),
            "Validation error: test"
        );
    }
}
