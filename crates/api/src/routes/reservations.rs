//! Reservation route handlers.
//!
//! Thin layer over the lifecycle engine: authentication is already resolved
//! by middleware, so every handler just passes the caller's `user_id`
//! through and maps engine errors to status codes.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::{Reservation, ReservationStatus};
use persistence::repositories::{ResourceRepository, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// Request body for request/cancel/release.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReservationActionRequest {
    #[validate(range(min = 1, message = "resource_id is required"))]
    pub resource_id: i64,
}

/// Request body for keep-alive.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KeepAliveRequest {
    #[validate(range(min = 1, message = "resource_id is required"))]
    pub resource_id: i64,

    /// Seconds to extend the deadline by; defaults to the configured
    /// approved keep-alive.
    #[validate(range(min = 1, max = 86400, message = "extension_secs must be 1-86400"))]
    pub extension_secs: Option<i64>,
}

/// A lifecycle record with its derived status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    #[serde(flatten)]
    pub record: Reservation,
    pub status: ReservationStatus,
}

impl From<Reservation> for ReservationResponse {
    fn from(record: Reservation) -> Self {
        let status = record.status();
        Self { record, status }
    }
}

/// Query parameters for the active listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveQuery {
    /// Restrict the listing to one resource.
    pub resource_id: Option<i64>,
}

/// Active record annotated with user and resource names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveReservationEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub resource_id: i64,
    pub resource_name: String,
    pub request_date: chrono::DateTime<chrono::Utc>,
    pub approved_date: Option<chrono::DateTime<chrono::Utc>>,
    pub valid_until_date: Option<chrono::DateTime<chrono::Utc>>,
    pub status: ReservationStatus,
}

/// Response body for the active listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveReservationsResponse {
    pub reservations: Vec<ActiveReservationEntry>,
    pub count: usize,
}

/// File a reservation attempt. Auto-approves when the resource is free,
/// queues otherwise.
///
/// POST /api/v1/reservations/request
pub async fn request_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<UserAuth>,
    Json(request): Json<ReservationActionRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    request.validate()?;

    let record = state
        .engine
        .request(auth.user_id, request.resource_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Cancel the caller's queued reservation. Never affects the holder.
///
/// POST /api/v1/reservations/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<UserAuth>,
    Json(request): Json<ReservationActionRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    request.validate()?;

    let record = state
        .engine
        .cancel(auth.user_id, request.resource_id)
        .await?;
    Ok(Json(record.into()))
}

/// Release the caller's held resource, promoting the next queued entry.
///
/// POST /api/v1/reservations/release
pub async fn release_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<UserAuth>,
    Json(request): Json<ReservationActionRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    request.validate()?;

    let record = state
        .engine
        .release(auth.user_id, request.resource_id)
        .await?;
    Ok(Json(record.into()))
}

/// Extend the caller's reservation deadline.
///
/// POST /api/v1/reservations/keep-alive
pub async fn keep_alive(
    State(state): State<AppState>,
    Extension(auth): Extension<UserAuth>,
    Json(request): Json<KeepAliveRequest>,
) -> Result<Json<ReservationResponse>, ApiError> {
    request.validate()?;

    let extension = request
        .extension_secs
        .unwrap_or(state.config.reservations.approved_keep_alive_secs);
    let record = state
        .engine
        .keep_alive(auth.user_id, request.resource_id, extension)
        .await?;
    Ok(Json(record.into()))
}

/// List active reservations in queue order, annotated with names and
/// derived status. Covers all resources unless `resource_id` is given.
///
/// GET /api/v1/reservations/active?resource_id=
pub async fn active_reservations(
    State(state): State<AppState>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<ActiveReservationsResponse>, ApiError> {
    let records = match query.resource_id {
        Some(resource_id) => state.engine.active_reservations(resource_id).await?,
        None => state.engine.all_active_reservations().await?,
    };

    let user_names: HashMap<i64, String> = UserRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let resource_names: HashMap<i64, String> = ResourceRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let name_of = |names: &HashMap<i64, String>, id: i64| {
        names.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    };

    let reservations: Vec<ActiveReservationEntry> = records
        .into_iter()
        .map(|r| ActiveReservationEntry {
            status: r.status(),
            user_name: name_of(&user_names, r.user_id),
            resource_name: name_of(&resource_names, r.resource_id),
            id: r.id,
            user_id: r.user_id,
            resource_id: r.resource_id,
            request_date: r.request_date,
            approved_date: r.approved_date,
            valid_until_date: r.valid_until_date,
        })
        .collect();

    let count = reservations.len();
    Ok(Json(ActiveReservationsResponse {
        reservations,
        count,
    }))
}

/// Query parameters for the caller's current reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentQuery {
    pub resource_id: i64,
}

/// The caller's active reservation for a resource, if any.
///
/// GET /api/v1/reservations/current?resource_id=
pub async fn current_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<UserAuth>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let record = state
        .engine
        .reservation_for_user(auth.user_id, query.resource_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No active reservation for resource {}",
                query.resource_id
            ))
        })?;
    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_action_request_rejects_missing_resource() {
        let request = ReservationActionRequest { resource_id: 0 };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_keep_alive_request_bounds_extension() {
        let request = KeepAliveRequest {
            resource_id: 1,
            extension_secs: Some(0),
        };
        assert!(request.validate().is_err());

        let request = KeepAliveRequest {
            resource_id: 1,
            extension_secs: Some(600),
        };
        assert!(request.validate().is_ok());

        let request = KeepAliveRequest {
            resource_id: 1,
            extension_secs: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_reservation_response_carries_derived_status() {
        let record = Reservation {
            id: 1,
            user_id: 2,
            resource_id: 3,
            request_date: Utc::now(),
            approved_date: Some(Utc::now()),
            cancelled_date: None,
            released_date: None,
            valid_until_date: Some(Utc::now()),
        };
        let response: ReservationResponse = record.into();
        assert_eq!(response.status, ReservationStatus::Approved);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"approved\""));
        assert!(json.contains("\"resourceId\":3"));
    }

    #[test]
    fn test_queued_record_reports_requested_status() {
        let record = Reservation {
            id: 1,
            user_id: 2,
            resource_id: 3,
            request_date: Utc::now(),
            approved_date: None,
            cancelled_date: None,
            released_date: None,
            valid_until_date: None,
        };
        let response: ReservationResponse = record.into();
        assert_eq!(response.status, ReservationStatus::Requested);
    }
}
