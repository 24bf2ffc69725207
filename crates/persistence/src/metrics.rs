//! Database query metrics.

use metrics::histogram;
use std::time::Instant;

/// Times a database operation and records its duration as a histogram
/// labelled with the query name.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("find_active_reservation");
/// let result = sqlx::query_as(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Records the elapsed duration.
    pub fn record(self) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_keeps_its_query_name() {
        let timer = QueryTimer::new("list_users");
        assert_eq!(timer.query_name, "list_users");
    }
}
