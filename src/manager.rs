use crate::errors::ConfigurationError;
use crate::metric::registry::WorkerMetricRegistry;
use crate::metric::{WorkerMetricType, FAILURE_SENTINEL};
use crate::snapshot::WorkerMetricsSnapshot;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

pub const DEFAULT_MAX_SAMPLES_PER_METRIC: usize = 10;

/// Outcome of one capture round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureRound {
    pub values: HashMap<WorkerMetricType, f64>,
    pub failures: usize,
}

impl CaptureRound {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Samples every registered metric and keeps a bounded history per metric.
pub struct WorkerMetricsManager {
    registry: WorkerMetricRegistry,
    max_samples_per_metric: usize,
    history: HashMap<WorkerMetricType, VecDeque<f64>>,
}

impl WorkerMetricsManager {
    pub fn new(
        registry: WorkerMetricRegistry,
        max_samples_per_metric: usize,
    ) -> Result<Self, ConfigurationError> {
        if max_samples_per_metric == 0 {
            return Err(ConfigurationError::InvalidHistoryLength);
        }
        Ok(Self {
            registry,
            max_samples_per_metric,
            history: HashMap::new(),
        })
    }

    pub fn registry(&self) -> &WorkerMetricRegistry {
        &self.registry
    }

    /// Capture every metric once. A failed capture is recorded as the
    /// failure sentinel and does not stop the round.
    pub fn capture_all(&mut self) -> CaptureRound {
        let mut round = CaptureRound::default();
        for metric in self.registry.iter() {
            let metric_type = metric.metric_type();
            let value = match metric.capture() {
                Ok(value) => value.value(),
                Err(e) => {
                    warn!(metric = %metric_type, error = %e, "worker metric capture failed");
                    round.failures += 1;
                    FAILURE_SENTINEL
                }
            };

            let samples = self.history.entry(metric_type).or_default();
            if samples.len() == self.max_samples_per_metric {
                samples.pop_front();
            }
            samples.push_back(value);
            round.values.insert(metric_type, value);
        }
        round
    }

    pub fn snapshot(&self, worker_id: &str, last_update_time: i64) -> WorkerMetricsSnapshot {
        let metric_stats = self
            .history
            .iter()
            .map(|(metric_type, samples)| {
                (
                    metric_type.short_name().to_string(),
                    samples.iter().copied().collect(),
                )
            })
            .collect();
        let operating_range = self
            .registry
            .operating_ranges()
            .into_iter()
            .map(|(short_name, range)| (short_name, vec![range.max_utilization(), 0]))
            .collect();

        WorkerMetricsSnapshot::builder()
            .worker_id(worker_id)
            .last_update_time(last_update_time)
            .metric_stats(metric_stats)
            .operating_range(operating_range)
            .build()
    }
}
