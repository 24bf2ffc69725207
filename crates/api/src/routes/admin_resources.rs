//! Admin resource management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use persistence::entities::ResourceEntity;
use persistence::repositories::ResourceRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// Request body for creating a resource.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// Request body for renaming or re-commenting a resource.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Comment must be at most 500 characters"))]
    pub comment: Option<String>,
}

/// Resource representation in admin responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ResourceEntity> for ResourceResponse {
    fn from(resource: ResourceEntity) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            comment: resource.comment,
            created_at: resource.created_at,
        }
    }
}

/// Response body for the resource listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListResponse {
    pub resources: Vec<ResourceResponse>,
    pub count: usize,
}

/// Create a reservable resource.
///
/// POST /api/v1/admin/resources
pub async fn create_resource(
    State(state): State<AppState>,
    Json(request): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    request.validate()?;

    let resources = ResourceRepository::new(state.pool.clone());
    let resource = resources
        .create(&request.name, request.comment.as_deref())
        .await?;

    tracing::info!(resource_id = resource.id, name = %resource.name, "resource created");
    Ok((StatusCode::CREATED, Json(resource.into())))
}

/// List all resources.
///
/// GET /api/v1/admin/resources
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    let resources = ResourceRepository::new(state.pool.clone());
    let list: Vec<ResourceResponse> =
        resources.list().await?.into_iter().map(Into::into).collect();

    let count = list.len();
    Ok(Json(ResourceListResponse {
        resources: list,
        count,
    }))
}

/// Rename a resource or replace its comment.
///
/// PATCH /api/v1/admin/resources/:resource_id
pub async fn update_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<i64>,
    Json(request): Json<UpdateResourceRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
    request.validate()?;

    if request.name.is_none() && request.comment.is_none() {
        return Err(ApiError::Validation(
            "At least one of name or comment must be provided".to_string(),
        ));
    }

    let resources = ResourceRepository::new(state.pool.clone());
    let resource = resources
        .update(
            resource_id,
            request.name.as_deref(),
            request.comment.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Resource {} not found", resource_id)))?;

    tracing::info!(resource_id, name = %resource.name, "resource updated");
    Ok(Json(resource.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resource_request_validation() {
        let request = CreateResourceRequest {
            name: "Meeting Room A".to_string(),
            comment: Some("Third floor".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_resource_rejects_empty_name() {
        let request = CreateResourceRequest {
            name: "".to_string(),
            comment: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_resource_allows_partial_fields() {
        let request = UpdateResourceRequest {
            name: Some("Renamed".to_string()),
            comment: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_resource_response_serialization() {
        let response = ResourceResponse {
            id: 1,
            name: "Lab bench".to_string(),
            comment: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"name\":\"Lab bench\""));
        assert!(json.contains("\"comment\":null"));
    }
}
