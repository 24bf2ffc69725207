//! Reservation repository for database operations.
//!
//! Implements the lifecycle engine's storage contract. The terminal-date
//! mutations are conditional updates that no-op when the record has already
//! left the expected state, so `approved_date`, `cancelled_date` and
//! `released_date` are write-once at the database level.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{NewReservation, Reservation};
use domain::services::lifecycle::{ReservationStore, StorageError};

use crate::entities::{ReservationEntity, ReservationWithNamesEntity};
use crate::metrics::QueryTimer;

const RESERVATION_COLUMNS: &str = "id, user_id, resource_id, request_date, approved_date, \
     cancelled_date, released_date, valid_until_date";

/// Repository for reservation lifecycle records.
#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full reservation history including terminal records, newest first.
    pub async fn history(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReservationWithNamesEntity>, sqlx::Error> {
        let timer = QueryTimer::new("reservation_history");
        let result = sqlx::query_as::<_, ReservationWithNamesEntity>(
            r#"
            SELECT rl.id, rl.user_id, u.name AS user_name,
                   rl.resource_id, r.name AS resource_name,
                   rl.request_date, rl.approved_date, rl.cancelled_date,
                   rl.released_date, rl.valid_until_date
            FROM reservations rl
            JOIN users u ON rl.user_id = u.id
            JOIN resources r ON rl.resource_id = r.id
            ORDER BY rl.request_date DESC, rl.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Total number of reservation records ever filed.
    pub async fn history_count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("reservation_history_count");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn insert(&self, rec: NewReservation) -> Result<Reservation, StorageError> {
        let timer = QueryTimer::new("insert_reservation");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            INSERT INTO reservations
                (user_id, resource_id, request_date, approved_date, valid_until_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(rec.user_id)
        .bind(rec.resource_id)
        .bind(rec.request_date)
        .bind(rec.approved_date)
        .bind(rec.valid_until_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn find_active(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("find_active_reservation");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE user_id = $1 AND resource_id = $2
              AND cancelled_date IS NULL AND released_date IS NULL
            "#
        ))
        .bind(user_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn latest_non_cancelled(
        &self,
        resource_id: i64,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("latest_non_cancelled_reservation");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_id = $1 AND cancelled_date IS NULL
            ORDER BY request_date DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn active_for_resource(
        &self,
        resource_id: i64,
    ) -> Result<Vec<Reservation>, StorageError> {
        let timer = QueryTimer::new("active_reservations_for_resource");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_id = $1
              AND cancelled_date IS NULL AND released_date IS NULL
            ORDER BY request_date, id
            "#
        ))
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn active_all(&self) -> Result<Vec<Reservation>, StorageError> {
        let timer = QueryTimer::new("active_reservations_all");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE cancelled_date IS NULL AND released_date IS NULL
            ORDER BY request_date, id
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn next_queued(&self, resource_id: i64) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("next_queued_reservation");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE resource_id = $1
              AND cancelled_date IS NULL AND released_date IS NULL
              AND approved_date IS NULL
            ORDER BY request_date, id
            LIMIT 1
            "#
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn expired_holders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StorageError> {
        let timer = QueryTimer::new("expired_holders");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE cancelled_date IS NULL AND released_date IS NULL
              AND approved_date IS NOT NULL
              AND valid_until_date IS NOT NULL AND valid_until_date < $1
            ORDER BY resource_id, id
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn expired_queued(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StorageError> {
        let timer = QueryTimer::new("expired_queued");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE cancelled_date IS NULL AND released_date IS NULL
              AND approved_date IS NULL
              AND valid_until_date IS NOT NULL AND valid_until_date < $1
            ORDER BY resource_id, id
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn mark_approved(
        &self,
        id: i64,
        at: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("mark_reservation_approved");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            UPDATE reservations
            SET approved_date = $2, valid_until_date = $3
            WHERE id = $1
              AND approved_date IS NULL
              AND cancelled_date IS NULL AND released_date IS NULL
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .bind(valid_until)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn mark_cancelled(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("mark_reservation_cancelled");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            UPDATE reservations
            SET cancelled_date = $2
            WHERE id = $1
              AND approved_date IS NULL
              AND cancelled_date IS NULL AND released_date IS NULL
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn mark_released(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("mark_reservation_released");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            UPDATE reservations
            SET released_date = $2
            WHERE id = $1
              AND approved_date IS NOT NULL
              AND cancelled_date IS NULL AND released_date IS NULL
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn extend_valid_until(
        &self,
        id: i64,
        valid_until: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError> {
        let timer = QueryTimer::new("extend_reservation_valid_until");
        let result = sqlx::query_as::<_, ReservationEntity>(&format!(
            r#"
            UPDATE reservations
            SET valid_until_date = $2
            WHERE id = $1
              AND cancelled_date IS NULL AND released_date IS NULL
            RETURNING {RESERVATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(valid_until)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}
