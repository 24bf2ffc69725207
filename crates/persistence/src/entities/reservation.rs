//! Reservation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Reservation;
use sqlx::FromRow;

/// Database row mapping for the reservations table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationEntity {
    pub id: i64,
    pub user_id: i64,
    pub resource_id: i64,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,
    pub released_date: Option<DateTime<Utc>>,
    pub valid_until_date: Option<DateTime<Utc>>,
}

impl From<ReservationEntity> for Reservation {
    fn from(row: ReservationEntity) -> Self {
        Reservation {
            id: row.id,
            user_id: row.user_id,
            resource_id: row.resource_id,
            request_date: row.request_date,
            approved_date: row.approved_date,
            cancelled_date: row.cancelled_date,
            released_date: row.released_date,
            valid_until_date: row.valid_until_date,
        }
    }
}

/// Reservation row joined with user and resource names for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationWithNamesEntity {
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
}

impl ReservationWithNamesEntity {
    /// The plain lifecycle record, dropping the joined names.
    pub fn record(&self) -> Reservation {
        Reservation {
            id: self.id,
            user_id: self.user_id,
            resource_id: self.resource_id,
            request_date: self.request_date,
            approved_date: self.approved_date,
            cancelled_date: self.cancelled_date,
            released_date: self.released_date,
            valid_until_date: self.valid_until_date,
        }
    }
}
