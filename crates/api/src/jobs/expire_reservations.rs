//! Reservation expiration sweeper.
//!
//! Periodically runs the engine's expiration pass: overdue holders are
//! released (promoting their successors) and, when queued-entry expiration
//! is configured, overdue queued entries are cancelled. The pass takes the
//! same engine lock as explicit operations, so a user's release and a
//! timeout never race.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use domain::services::lifecycle::ReservationEngine;

use super::scheduler::Job;

/// Background job driving reservation expiration.
pub struct ExpireReservationsJob {
    engine: Arc<ReservationEngine>,
    interval_secs: u64,
}

impl ExpireReservationsJob {
    /// Create a new sweeper running every `interval_secs`.
    pub fn new(engine: Arc<ReservationEngine>, interval_secs: u64) -> Self {
        Self {
            engine,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireReservationsJob {
    fn name(&self) -> &'static str {
        "expire_reservations"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    async fn run(&self) -> Result<(), String> {
        let outcome = self
            .engine
            .sweep_expired()
            .await
            .map_err(|e| format!("Expiration sweep failed: {}", e))?;

        if outcome.released > 0 || outcome.cancelled > 0 {
            info!(
                released = outcome.released,
                cancelled = outcome.cancelled,
                "Expiration sweep completed"
            );
        }

        Ok(())
    }
}
