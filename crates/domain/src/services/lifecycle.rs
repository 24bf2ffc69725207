//! Reservation lifecycle engine.
//!
//! The engine owns every state transition of a reservation record:
//! requesting (with auto-approval when the resource is free), cancelling a
//! queued entry, releasing a held resource, promoting the longest-waiting
//! queued entry, keep-alive renewal, and the expiration sweep.
//!
//! All mutating operations serialize on a single process-wide lock. The
//! invariants are cross-record (one holder per resource, one active record
//! per user and resource), so the whole read-decide-write sequence runs
//! under the lock. Holder state is never cached: every transition recomputes
//! it from the record store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{NewReservation, Reservation};

/// Storage layer failure, carried through every engine operation.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError(e.to_string())
    }
}

/// Errors returned by engine operations.
///
/// Everything except `Storage` is permanent for the given input; callers
/// must not retry without changing the input.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("resource not found: {0}")]
    ResourceNotFound(i64),

    #[error("user {user_id} already has an active reservation for resource {resource_id}")]
    DuplicateReservation { user_id: i64, resource_id: i64 },

    #[error("no matching reservation for user {user_id} on resource {resource_id}")]
    ReservationNotFound { user_id: i64, resource_id: i64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Durable store of reservation lifecycle records.
///
/// The three terminal-date mutations are conditional: they only write when
/// the record is still in the state the transition expects, and return
/// `None` otherwise. This makes an explicit release racing the sweeper's
/// timeout safe even if the engine lock discipline is ever relaxed.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a new record and returns it with its assigned id.
    async fn insert(&self, rec: NewReservation) -> Result<Reservation, StorageError>;

    /// The user's active record for a resource, if any. Invariants guarantee
    /// at most one.
    async fn find_active(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Option<Reservation>, StorageError>;

    /// The most recent non-cancelled record for the resource by request
    /// date. The resource is free iff there is none or it has been released.
    async fn latest_non_cancelled(
        &self,
        resource_id: i64,
    ) -> Result<Option<Reservation>, StorageError>;

    /// Active records for one resource, ordered by `(request_date, id)`.
    async fn active_for_resource(
        &self,
        resource_id: i64,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Active records across all resources, ordered by `(request_date, id)`.
    async fn active_all(&self) -> Result<Vec<Reservation>, StorageError>;

    /// The longest-waiting active unapproved record for the resource.
    async fn next_queued(&self, resource_id: i64) -> Result<Option<Reservation>, StorageError>;

    /// Active approved records whose deadline lies before `now`.
    async fn expired_holders(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Active unapproved records whose deadline lies before `now`.
    async fn expired_queued(&self, now: DateTime<Utc>)
        -> Result<Vec<Reservation>, StorageError>;

    /// Sets `approved_date` and `valid_until_date` iff the record is still
    /// active and unapproved.
    async fn mark_approved(
        &self,
        id: i64,
        at: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError>;

    /// Sets `cancelled_date` iff the record is still active and unapproved.
    async fn mark_cancelled(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError>;

    /// Sets `released_date` iff the record is still active and approved.
    async fn mark_released(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError>;

    /// Moves the deadline iff the record is still active.
    async fn extend_valid_until(
        &self,
        id: i64,
        valid_until: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError>;
}

/// Resource existence lookups. The engine's only dependency on the
/// resource catalog.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    async fn resource_exists(&self, resource_id: i64) -> Result<bool, StorageError>;
}

/// Keep-alive durations granted by the engine.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Deadline granted to a holder on approval and on keep-alive.
    pub approved_keep_alive_secs: i64,
    /// Deadline granted to a queued entry; 0 disables queued-entry
    /// expiration entirely.
    pub queued_keep_alive_secs: i64,
}

impl LifecycleConfig {
    fn approved_keep_alive(&self) -> Duration {
        Duration::seconds(self.approved_keep_alive_secs)
    }

    fn queued_keep_alive(&self) -> Option<Duration> {
        (self.queued_keep_alive_secs > 0).then(|| Duration::seconds(self.queued_keep_alive_secs))
    }
}

/// Counts from one expiration sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Holders released because their deadline lapsed.
    pub released: usize,
    /// Queued entries cancelled because their deadline lapsed.
    pub cancelled: usize,
}

/// The reservation lifecycle engine.
///
/// One instance is shared by the HTTP handlers and the expiration sweeper;
/// both go through the same lock and the same promotion path.
pub struct ReservationEngine {
    store: Arc<dyn ReservationStore>,
    catalog: Arc<dyn ResourceCatalog>,
    config: LifecycleConfig,
    lock: Mutex<()>,
}

impl ReservationEngine {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        catalog: Arc<dyn ResourceCatalog>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            lock: Mutex::new(()),
        }
    }

    /// Files a reservation attempt for the user.
    ///
    /// If the resource is free the record is approved on the spot and given
    /// the approved keep-alive deadline; otherwise it joins the queue.
    pub async fn request(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Reservation, LifecycleError> {
        let _guard = self.lock.lock().await;

        if !self.catalog.resource_exists(resource_id).await? {
            return Err(LifecycleError::ResourceNotFound(resource_id));
        }
        if self.store.find_active(user_id, resource_id).await?.is_some() {
            return Err(LifecycleError::DuplicateReservation {
                user_id,
                resource_id,
            });
        }

        let now = Utc::now();
        let free = match self.store.latest_non_cancelled(resource_id).await? {
            None => true,
            Some(latest) => latest.released_date.is_some(),
        };

        let new = if free {
            NewReservation {
                user_id,
                resource_id,
                request_date: now,
                approved_date: Some(now),
                valid_until_date: Some(now + self.config.approved_keep_alive()),
            }
        } else {
            NewReservation {
                user_id,
                resource_id,
                request_date: now,
                approved_date: None,
                valid_until_date: self.config.queued_keep_alive().map(|d| now + d),
            }
        };

        let rec = self.store.insert(new).await?;
        info!(
            user_id,
            resource_id,
            reservation_id = rec.id,
            status = %rec.status(),
            "reservation requested"
        );
        Ok(rec)
    }

    /// Cancels the user's queued (not yet approved) record for the resource.
    ///
    /// An approved reservation cannot be cancelled, only released, so this
    /// never changes who holds the resource.
    pub async fn cancel(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Reservation, LifecycleError> {
        let _guard = self.lock.lock().await;

        let queued = self
            .store
            .find_active(user_id, resource_id)
            .await?
            .filter(|r| r.approved_date.is_none())
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        let cancelled = self
            .store
            .mark_cancelled(queued.id, Utc::now())
            .await?
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        info!(
            user_id,
            resource_id,
            reservation_id = cancelled.id,
            "queued reservation cancelled"
        );
        Ok(cancelled)
    }

    /// Releases the user's approved record and promotes the longest-waiting
    /// queued entry, if any.
    pub async fn release(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Reservation, LifecycleError> {
        let _guard = self.lock.lock().await;

        let held = self
            .store
            .find_active(user_id, resource_id)
            .await?
            .filter(|r| r.approved_date.is_some())
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        let at = Utc::now();
        let released = self
            .store
            .mark_released(held.id, at)
            .await?
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        info!(
            user_id,
            resource_id,
            reservation_id = released.id,
            "reservation released"
        );
        self.promote(resource_id, at).await?;
        Ok(released)
    }

    /// Extends the deadline of the user's active record by
    /// `extension_secs` from now.
    ///
    /// Queued entries are only renewable while queued-entry expiration is
    /// configured; without it their deadline is meaningless.
    pub async fn keep_alive(
        &self,
        user_id: i64,
        resource_id: i64,
        extension_secs: i64,
    ) -> Result<Reservation, LifecycleError> {
        let _guard = self.lock.lock().await;

        let active = self
            .store
            .find_active(user_id, resource_id)
            .await?
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        if active.approved_date.is_none() && self.config.queued_keep_alive().is_none() {
            return Err(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            });
        }

        let valid_until = Utc::now() + Duration::seconds(extension_secs);
        let extended = self
            .store
            .extend_valid_until(active.id, valid_until)
            .await?
            .ok_or(LifecycleError::ReservationNotFound {
                user_id,
                resource_id,
            })?;

        debug!(
            user_id,
            resource_id,
            reservation_id = extended.id,
            %valid_until,
            "reservation deadline extended"
        );
        Ok(extended)
    }

    /// Active records for a resource, queue order, statuses derivable via
    /// [`Reservation::status`].
    pub async fn active_reservations(
        &self,
        resource_id: i64,
    ) -> Result<Vec<Reservation>, LifecycleError> {
        Ok(self.store.active_for_resource(resource_id).await?)
    }

    /// Active records across every resource, queue order.
    pub async fn all_active_reservations(&self) -> Result<Vec<Reservation>, LifecycleError> {
        Ok(self.store.active_all().await?)
    }

    /// The user's active record for a resource, if any.
    pub async fn reservation_for_user(
        &self,
        user_id: i64,
        resource_id: i64,
    ) -> Result<Option<Reservation>, LifecycleError> {
        Ok(self.store.find_active(user_id, resource_id).await?)
    }

    /// One expiration pass: releases every overdue holder (promoting its
    /// successor) and, when queued-entry expiration is configured, cancels
    /// overdue queued entries.
    ///
    /// Failures on a single record are logged and skipped; the pass keeps
    /// going and the next tick retries.
    pub async fn sweep_expired(&self) -> Result<SweepOutcome, StorageError> {
        let _guard = self.lock.lock().await;

        let now = Utc::now();
        let mut outcome = SweepOutcome::default();

        for holder in self.store.expired_holders(now).await? {
            match self.store.mark_released(holder.id, now).await {
                Ok(Some(expired)) => {
                    info!(
                        reservation_id = expired.id,
                        user_id = expired.user_id,
                        resource_id = expired.resource_id,
                        "holder deadline lapsed, reservation released"
                    );
                    outcome.released += 1;
                    if let Err(e) = self.promote(expired.resource_id, now).await {
                        warn!(
                            resource_id = expired.resource_id,
                            error = %e,
                            "promotion failed after expiration"
                        );
                    }
                }
                // Lost the race against an explicit release; nothing to do.
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        reservation_id = holder.id,
                        resource_id = holder.resource_id,
                        error = %e,
                        "failed to expire holder"
                    );
                }
            }
        }

        if self.config.queued_keep_alive().is_some() {
            for queued in self.store.expired_queued(now).await? {
                match self.store.mark_cancelled(queued.id, now).await {
                    Ok(Some(stale)) => {
                        info!(
                            reservation_id = stale.id,
                            user_id = stale.user_id,
                            resource_id = stale.resource_id,
                            "queued deadline lapsed, reservation cancelled"
                        );
                        outcome.cancelled += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            reservation_id = queued.id,
                            resource_id = queued.resource_id,
                            error = %e,
                            "failed to expire queued reservation"
                        );
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// The sole approval-transfer point: approves the longest-waiting queued
    /// entry at `at`. Runs with the engine lock held by the caller.
    async fn promote(
        &self,
        resource_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StorageError> {
        let Some(next) = self.store.next_queued(resource_id).await? else {
            debug!(resource_id, "queue empty, resource now idle");
            return Ok(None);
        };

        let valid_until = at + self.config.approved_keep_alive();
        let promoted = self.store.mark_approved(next.id, at, valid_until).await?;
        if let Some(p) = &promoted {
            info!(
                resource_id,
                reservation_id = p.id,
                user_id = p.user_id,
                "queued reservation promoted to holder"
            );
        }
        Ok(promoted)
    }
}
