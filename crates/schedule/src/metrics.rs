use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-schedule run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshMetrics {
    /// Runs whose comparison succeeded.
    pub runs_completed: u64,
    /// Runs whose comparison failed.
    pub runs_failed: u64,
    /// Changes reported by the most recent successful run.
    pub last_change_count: usize,
    /// When the most recent run finished.
    pub last_run: Option<DateTime<Utc>>,
    /// Rolling average duration over all runs.
    pub avg_run_duration: Duration,
}

impl RefreshMetrics {
    /// Record a run whose comparison succeeded.
    pub fn record_success(&mut self, duration: Duration, changes: usize) {
        self.runs_completed += 1;
        self.last_change_count = changes;
        self.record_duration(duration);
    }

    /// Record a run whose comparison failed.
    pub fn record_failure(&mut self, duration: Duration) {
        self.runs_failed += 1;
        self.record_duration(duration);
    }

    fn record_duration(&mut self, duration: Duration) {
        self.last_run = Some(Utc::now());

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let count = self.total_runs();
        self.avg_run_duration = if count == 1 {
            duration
        } else {
            let prev_nanos = self.avg_run_duration.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }

    pub fn total_runs(&self) -> u64 {
        self.runs_completed + self.runs_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_single_run() {
        let mut m = RefreshMetrics::default();
        m.record_success(Duration::from_millis(100), 3);

        assert_eq!(m.runs_completed, 1);
        assert_eq!(m.last_change_count, 3);
        assert!(m.last_run.is_some());
        assert_eq!(m.avg_run_duration, Duration::from_millis(100));
    }

    #[test]
    fn failures_count_toward_average() {
        let mut m = RefreshMetrics::default();
        m.record_success(Duration::from_millis(100), 0);
        m.record_failure(Duration::from_millis(200));

        assert_eq!(m.runs_completed, 1);
        assert_eq!(m.runs_failed, 1);
        assert_eq!(m.total_runs(), 2);
        let avg = m.avg_run_duration.as_millis();
        assert!((140..=160).contains(&avg), "expected ~150ms, got {}ms", avg);
    }

    #[test]
    fn default_metrics() {
        let m = RefreshMetrics::default();
        assert_eq!(m.total_runs(), 0);
        assert!(m.last_run.is_none());
        assert_eq!(m.avg_run_duration, Duration::ZERO);
    }
}
