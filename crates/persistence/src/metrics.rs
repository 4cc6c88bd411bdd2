//! Database metrics.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named query took.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record current pool occupancy. Called periodically by the API's pool job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one repository operation.
///
/// Transactional operations with several exits call [`QueryTimer::record`]
/// on each of them; single statements pass their result through
/// [`QueryTimer::finish`], which also counts failures.
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

    /// Record the elapsed duration.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }

    /// Record the elapsed duration and hand back the query result.
    pub fn finish<T>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        if result.is_err() {
            counter!(
                "database_query_errors_total",
                "query" => self.query_name
            )
            .increment(1);
        }
        self.record();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_keeps_name() {
        let timer = QueryTimer::new("find_event_by_id");
        assert_eq!(timer.query_name, "find_event_by_id");
    }

    #[test]
    fn test_finish_passes_result_through() {
        let ok = QueryTimer::new("ok_query").finish(Ok::<_, sqlx::Error>(7));
        assert_eq!(ok.unwrap(), 7);

        let err = QueryTimer::new("failing_query").finish::<()>(Err(sqlx::Error::RowNotFound));
        assert!(matches!(err, Err(sqlx::Error::RowNotFound)));
    }
}
