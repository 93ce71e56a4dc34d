//! Point-in-time bundle of a worker's recent metric samples.
//!
//! Snapshots are read by the fleet rebalancer, which only trusts a worker's
//! numbers when [`WorkerMetricsSnapshot::is_valid_snapshot`] holds. Both
//! predicates here are advisory: they report, the caller decides.

use crate::metric::FAILURE_SENTINEL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMetricsSnapshot {
    pub worker_id: Option<String>,
    /// epoch seconds
    pub last_update_time: Option<i64>,
    /// recent samples per metric short name, oldest first
    pub metric_stats: Option<HashMap<String, Vec<f64>>>,
    /// `[max_utilization, reserved]` per metric short name
    pub operating_range: Option<HashMap<String, Vec<i64>>>,
}

impl WorkerMetricsSnapshot {
    pub fn builder() -> WorkerMetricsSnapshotBuilder {
        WorkerMetricsSnapshotBuilder::default()
    }

    /// True when any recorded sample is the failure sentinel.
    pub fn is_any_metric_failing(&self) -> bool {
        self.metric_stats.as_ref().is_some_and(|stats| {
            stats
                .values()
                .flatten()
                .any(|value| *value == FAILURE_SENTINEL)
        })
    }

    /// True when the newest sample of any metric is the failure sentinel.
    pub fn is_latest_sample_failing(&self) -> bool {
        self.metric_stats.as_ref().is_some_and(|stats| {
            stats
                .values()
                .filter_map(|values| values.last())
                .any(|value| *value == FAILURE_SENTINEL)
        })
    }

    /// No metrics reported, the rebalancer falls back to its default behavior.
    pub fn is_using_default_metrics(&self) -> bool {
        self.metric_stats
            .as_ref()
            .map_or(true, |stats| stats.is_empty())
    }

    pub fn is_valid_snapshot(&self) -> bool {
        if self.worker_id.as_deref().map_or(true, str::is_empty) {
            return false;
        }
        if self.last_update_time.is_none() {
            return false;
        }

        match (&self.metric_stats, &self.operating_range) {
            (None, None) => true,
            // ranges advertised without any stats to bound
            (None, Some(ranges)) => ranges.is_empty(),
            (Some(stats), _) if stats.is_empty() => true,
            (Some(_), None) => false,
            (Some(stats), Some(ranges)) => stats.keys().all(|name| {
                ranges
                    .get(name)
                    .and_then(|range| range.first())
                    .is_some_and(|max_utilization| *max_utilization > 0)
            }),
        }
    }

    pub fn latest_value(&self, short_name: &str) -> Option<f64> {
        self.metric_stats
            .as_ref()?
            .get(short_name)?
            .last()
            .copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkerMetricsSnapshotBuilder {
    snapshot: WorkerMetricsSnapshot,
}

impl WorkerMetricsSnapshotBuilder {
    pub fn worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.snapshot.worker_id = Some(worker_id.into());
        self
    }

    pub fn last_update_time(mut self, epoch_seconds: i64) -> Self {
        self.snapshot.last_update_time = Some(epoch_seconds);
        self
    }

    pub fn metric_stats(mut self, metric_stats: HashMap<String, Vec<f64>>) -> Self {
        self.snapshot.metric_stats = Some(metric_stats);
        self
    }

    pub fn operating_range(mut self, operating_range: HashMap<String, Vec<i64>>) -> Self {
        self.snapshot.operating_range = Some(operating_range);
        self
    }

    pub fn build(self) -> WorkerMetricsSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stats(entries: &[(&str, &[f64])]) -> HashMap<String, Vec<f64>> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    fn ranges(entries: &[(&str, &[i64])]) -> HashMap<String, Vec<i64>> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect()
    }

    fn base() -> WorkerMetricsSnapshotBuilder {
        WorkerMetricsSnapshot::builder()
            .worker_id("WorkerId1")
            .last_update_time(Utc::now().timestamp())
    }

    #[test]
    fn test_failing_metric_detected() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[50.0, -1.0]), ("M", &[20.0, 11.0])]))
            .build();
        assert!(snapshot.is_any_metric_failing());
        assert!(snapshot.is_latest_sample_failing());
    }

    #[test]
    fn test_older_failing_sample_still_counts() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[50.0, 1.0]), ("M", &[-1.0, 11.0])]))
            .build();
        assert!(snapshot.is_any_metric_failing());
        assert!(!snapshot.is_latest_sample_failing());
    }

    #[test]
    fn test_no_failing_metric() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[50.0, 1.0]), ("M", &[0.0, 100.0])]))
            .build();
        assert!(!snapshot.is_any_metric_failing());
    }

    #[test]
    fn test_no_values_is_not_failing() {
        assert!(!base().metric_stats(stats(&[("C", &[])])).build().is_any_metric_failing());
        assert!(!base().build().is_any_metric_failing());
        assert!(!base().build().is_latest_sample_failing());
    }

    #[test]
    fn test_default_metrics_are_valid() {
        let snapshot = base().build();
        assert!(snapshot.is_valid_snapshot());
        assert!(snapshot.is_using_default_metrics());

        let snapshot = base()
            .metric_stats(HashMap::new())
            .operating_range(HashMap::new())
            .build();
        assert!(snapshot.is_valid_snapshot());
        assert!(snapshot.is_using_default_metrics());
    }

    #[test]
    fn test_empty_stats_with_ranges_is_valid() {
        let snapshot = base()
            .metric_stats(HashMap::new())
            .operating_range(ranges(&[("C", &[80, 10])]))
            .build();
        assert!(snapshot.is_valid_snapshot());
        assert!(snapshot.is_using_default_metrics());
    }

    #[test]
    fn test_missing_operating_range_is_invalid() {
        let snapshot = base().metric_stats(stats(&[("C", &[])])).build();
        assert!(!snapshot.is_valid_snapshot());
        assert!(!snapshot.is_using_default_metrics());
    }

    #[test]
    fn test_missing_last_update_time_is_invalid() {
        let snapshot = WorkerMetricsSnapshot::builder()
            .worker_id("WorkerId1")
            .metric_stats(stats(&[("C", &[5.0, 5.0])]))
            .operating_range(ranges(&[("C", &[80, 10])]))
            .build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_missing_worker_id_is_invalid() {
        let snapshot = WorkerMetricsSnapshot::builder()
            .last_update_time(Utc::now().timestamp())
            .build();
        assert!(!snapshot.is_valid_snapshot());

        let snapshot = WorkerMetricsSnapshot::builder()
            .worker_id("")
            .last_update_time(Utc::now().timestamp())
            .build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_ranges_without_stats_is_invalid() {
        let snapshot = base().operating_range(ranges(&[("C", &[80, 10])])).build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_mismatched_metric_and_range_is_invalid() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[5.0, 5.0])]))
            .operating_range(ranges(&[("M", &[80, 10])]))
            .build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_empty_range_value_is_invalid() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[5.0, 5.0])]))
            .operating_range(ranges(&[("C", &[])]))
            .build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_zero_max_utilization_is_invalid() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[5.0, 5.0])]))
            .operating_range(ranges(&[("C", &[0, 10])]))
            .build();
        assert!(!snapshot.is_valid_snapshot());
    }

    #[test]
    fn test_valid_snapshot() {
        let snapshot = base()
            .metric_stats(stats(&[("C", &[5.0, 5.0])]))
            .operating_range(ranges(&[("C", &[80, 10]), ("M", &[50, 0])]))
            .build();
        assert!(snapshot.is_valid_snapshot());
        assert!(!snapshot.is_using_default_metrics());
        assert_eq!(snapshot.latest_value("C"), Some(5.0));
        assert_eq!(snapshot.latest_value("M"), None);
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let snapshot = base()
            .metric_stats(stats(&[("NI", &[1.5])]))
            .operating_range(ranges(&[("NI", &[80, 0])]))
            .build();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["workerId"], "WorkerId1");
        assert_eq!(json["metricStats"]["NI"][0], 1.5);
        assert_eq!(json["operatingRange"]["NI"][0], 80);
    }
}
