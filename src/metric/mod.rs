pub mod linux_network;
pub mod registry;
pub mod stopwatch;

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample value recorded in place of a capture that failed.
pub const FAILURE_SENTINEL: f64 = -1.0;

/// A resource-utilization signal sampled on a worker.
///
/// `capture` takes `&self` so a metric can be sampled from more than one
/// context; implementations guard their own sampling state.
pub trait WorkerMetric: Send + Sync {
    fn metric_type(&self) -> WorkerMetricType;

    /// ceiling for this metric, normalized to a percentage
    fn operating_range(&self) -> OperatingRange;

    /// take a fresh sample, as a percentage within 0..=100.
    fn capture(&self) -> Result<WorkerMetricValue, ConfigurationError>;

    /// key used for this metric in snapshots.
    fn short_name(&self) -> &'static str {
        self.metric_type().short_name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMetricType {
    Cpu,
    Memory,
    NetworkIn,
    NetworkOut,
}

impl WorkerMetricType {
    pub const ALL: [WorkerMetricType; 4] = [
        WorkerMetricType::Cpu,
        WorkerMetricType::Memory,
        WorkerMetricType::NetworkIn,
        WorkerMetricType::NetworkOut,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            WorkerMetricType::Cpu => "C",
            WorkerMetricType::Memory => "M",
            WorkerMetricType::NetworkIn => "NI",
            WorkerMetricType::NetworkOut => "NO",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            WorkerMetricType::Cpu => "CPU",
            WorkerMetricType::Memory => "MEMORY",
            WorkerMetricType::NetworkIn => "NETWORK_IN",
            WorkerMetricType::NetworkOut => "NETWORK_OUT",
        }
    }

    pub fn from_short_name(short_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|metric_type| metric_type.short_name() == short_name)
    }
}

impl fmt::Display for WorkerMetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

/// Upper bound of acceptable utilization for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OperatingRange {
    max_utilization: i64,
}

impl OperatingRange {
    pub fn new(max_utilization: i64) -> Result<Self, ConfigurationError> {
        if !(0..=100).contains(&max_utilization) {
            return Err(ConfigurationError::InvalidOperatingRange { max_utilization });
        }
        Ok(Self { max_utilization })
    }

    pub fn max_utilization(&self) -> i64 {
        self.max_utilization
    }
}

/// Result of a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerMetricValue {
    value: f64,
}

impl WorkerMetricValue {
    pub fn new(value: f64) -> Result<Self, ConfigurationError> {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigurationError::InvalidMetricValue { value });
        }
        Ok(Self { value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
