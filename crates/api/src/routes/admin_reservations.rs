//! Admin reservation history route.
//!
//! Terminal records are retained for audit; this is the view onto them.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domain::models::ReservationStatus;
use persistence::entities::ReservationWithNamesEntity;
use persistence::repositories::ReservationRepository;

use crate::app::AppState;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

/// Query parameters for the history listing.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One history entry, including terminal dates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub resource_id: i64,
    pub resource_name: String,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub released_date: Option<DateTime<Utc>>,
    pub valid_until_date: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
}

impl From<ReservationWithNamesEntity> for HistoryEntry {
    fn from(row: ReservationWithNamesEntity) -> Self {
        let status = row.record().status();
        Self {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            resource_id: row.resource_id,
            resource_name: row.resource_name,
            request_date: row.request_date,
            approved_date: row.approved_date,
            cancelled_date: row.cancelled_date,
            released_date: row.released_date,
            valid_until_date: row.valid_until_date,
            status,
        }
    }
}

/// Response body for the history listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub reservations: Vec<HistoryEntry>,
    pub count: usize,
    pub total: i64,
}

/// Paginated reservation history, newest first.
///
/// GET /api/v1/admin/reservations?limit=&offset=
pub async fn reservation_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let reservations = ReservationRepository::new(state.pool.clone());
    let entries: Vec<HistoryEntry> = reservations
        .history(limit, offset)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = reservations.history_count().await?;

    let count = entries.len();
    Ok(Json(HistoryResponse {
        reservations: entries,
        count,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cancelled: bool) -> ReservationWithNamesEntity {
        ReservationWithNamesEntity {
            id: 1,
            user_id: 2,
            user_name: "jane".to_string(),
            resource_id: 3,
            resource_name: "Meeting Room A".to_string(),
            request_date: Utc::now(),
            approved_date: None,
            cancelled_date: cancelled.then(Utc::now),
            released_date: None,
            valid_until_date: None,
        }
    }

    #[test]
    fn test_history_entry_derives_terminal_status() {
        let entry: HistoryEntry = row(true).into();
        assert_eq!(entry.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_history_entry_derives_queued_status() {
        let entry: HistoryEntry = row(false).into();
        assert_eq!(entry.status, ReservationStatus::Requested);
    }

    #[test]
    fn test_history_entry_serialization() {
        let entry: HistoryEntry = row(false).into();
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"userName\":\"jane\""));
        assert!(json.contains("\"resourceName\":\"Meeting Room A\""));
        assert!(json.contains("\"status\":\"requested\""));
    }
}
