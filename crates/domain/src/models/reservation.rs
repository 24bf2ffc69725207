//! Reservation lifecycle record.
//!
//! One row per attempt at holding a resource. A record is *active* while
//! neither terminal date is set; the single active approved record per
//! resource is the holder, every other active record is queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reservation lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub resource_id: i64,
    /// When the attempt was filed. The only field used for queue ordering;
    /// ties are broken by `id`.
    pub request_date: DateTime<Utc>,
    /// Set exactly once, at creation (auto-approval) or by promotion.
    pub approved_date: Option<DateTime<Utc>>,
    /// Terminal; only settable while the record is still unapproved.
    pub cancelled_date: Option<DateTime<Utc>>,
    /// Terminal; only settable while the record is approved.
    pub released_date: Option<DateTime<Utc>>,
    /// Renewable deadline enforced by the expiration sweeper.
    pub valid_until_date: Option<DateTime<Utc>>,
}

impl Reservation {
    /// A record is active while neither terminal date is set.
    pub fn is_active(&self) -> bool {
        self.cancelled_date.is_none() && self.released_date.is_none()
    }

    /// Active and approved: the current holder of its resource.
    pub fn is_holder(&self) -> bool {
        self.is_active() && self.approved_date.is_some()
    }

    /// Active and not yet approved: waiting in the queue.
    pub fn is_queued(&self) -> bool {
        self.is_active() && self.approved_date.is_none()
    }

    /// Derived lifecycle status.
    pub fn status(&self) -> ReservationStatus {
        if self.cancelled_date.is_some() {
            ReservationStatus::Cancelled
        } else if self.released_date.is_some() {
            ReservationStatus::Released
        } else if self.approved_date.is_some() {
            ReservationStatus::Approved
        } else {
            ReservationStatus::Requested
        }
    }
}

/// Derived status of a reservation record. Active records are either
/// `Approved` (the holder) or `Requested` (queued); the terminal states
/// only appear in history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Approved,
    Requested,
    Cancelled,
    Released,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Approved => "approved",
            ReservationStatus::Requested => "requested",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Released => "released",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields for inserting a new lifecycle record; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: i64,
    pub resource_id: i64,
    pub request_date: DateTime<Utc>,
    pub approved_date: Option<DateTime<Utc>>,
    pub valid_until_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Reservation {
        Reservation {
            id: 1,
            user_id: 10,
            resource_id: 20,
            request_date: Utc::now(),
            approved_date: None,
            cancelled_date: None,
            released_date: None,
            valid_until_date: None,
        }
    }

    #[test]
    fn fresh_record_is_queued() {
        let r = record();
        assert!(r.is_active());
        assert!(r.is_queued());
        assert!(!r.is_holder());
        assert_eq!(r.status(), ReservationStatus::Requested);
    }

    #[test]
    fn approved_record_is_holder() {
        let mut r = record();
        r.approved_date = Some(Utc::now());
        assert!(r.is_holder());
        assert!(!r.is_queued());
        assert_eq!(r.status(), ReservationStatus::Approved);
    }

    #[test]
    fn cancelled_record_is_terminal() {
        let mut r = record();
        r.cancelled_date = Some(Utc::now());
        assert!(!r.is_active());
        assert!(!r.is_queued());
        assert_eq!(r.status(), ReservationStatus::Cancelled);
    }

    #[test]
    fn released_record_is_terminal() {
        let mut r = record();
        r.approved_date = Some(Utc::now());
        r.released_date = Some(Utc::now());
        assert!(!r.is_active());
        assert!(!r.is_holder());
        assert_eq!(r.status(), ReservationStatus::Released);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(ReservationStatus::Requested.to_string(), "requested");
    }
}
