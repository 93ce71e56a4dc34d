//! Network bandwidth metrics read from the Linux `/proc/net/dev` table.
//!
//! Each capture reads the cumulative byte counters of one interface, diffs
//! them against the previous capture and divides by the time elapsed since
//! that capture. The rate is reported as a percentage of the configured
//! maximum bandwidth, capped at 100.
//!
//! The first capture of a metric has nothing to diff against and always
//! reports 0.

use super::stopwatch::Stopwatch;
use super::{OperatingRange, WorkerMetric, WorkerMetricType, WorkerMetricValue};
use crate::errors::ConfigurationError;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub const DEFAULT_NETWORK_STAT_FILE: &str = "/proc/net/dev";
pub const DEFAULT_INTERFACE_NAME: &str = "eth0";

/// 1 Gbit/s expressed in MB/s.
pub const DEFAULT_MAX_BANDWIDTH_MBPS: f64 = 125.0;

const HEADER_LINES: usize = 2;
const RECEIVED_BYTES_FIELD: usize = 0;
const TRANSMITTED_BYTES_FIELD: usize = 8;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkDirection {
    Received,
    Transmitted,
}

impl NetworkDirection {
    pub fn metric_type(&self) -> WorkerMetricType {
        match self {
            NetworkDirection::Received => WorkerMetricType::NetworkIn,
            NetworkDirection::Transmitted => WorkerMetricType::NetworkOut,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkMetricConfig {
    pub interface_name: String,
    pub stat_file: PathBuf,
    pub max_bandwidth_mbps: f64,
}

impl Default for NetworkMetricConfig {
    fn default() -> Self {
        Self {
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            stat_file: PathBuf::from(DEFAULT_NETWORK_STAT_FILE),
            max_bandwidth_mbps: DEFAULT_MAX_BANDWIDTH_MBPS,
        }
    }
}

/// Cumulative byte counters of one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NetworkCounters {
    received_bytes: u64,
    transmitted_bytes: u64,
}

impl NetworkCounters {
    fn get(&self, direction: NetworkDirection) -> u64 {
        match direction {
            NetworkDirection::Received => self.received_bytes,
            NetworkDirection::Transmitted => self.transmitted_bytes,
        }
    }
}

/// Rate-diffing engine shared by both directions. Each metric owns its own.
struct NetworkRateReader {
    interface_name: String,
    stat_file: PathBuf,
    max_bandwidth_mbps: f64,
    last_counters: Mutex<Option<NetworkCounters>>,
    stopwatch: Mutex<Stopwatch>,
}

impl NetworkRateReader {
    fn new(config: NetworkMetricConfig, stopwatch: Stopwatch) -> Result<Self, ConfigurationError> {
        if config.max_bandwidth_mbps.is_nan() || config.max_bandwidth_mbps <= 0.0 {
            return Err(ConfigurationError::InvalidBandwidth {
                max_bandwidth_mbps: config.max_bandwidth_mbps,
            });
        }
        Ok(Self {
            interface_name: config.interface_name,
            stat_file: config.stat_file,
            max_bandwidth_mbps: config.max_bandwidth_mbps,
            last_counters: Mutex::new(None),
            stopwatch: Mutex::new(stopwatch),
        })
    }

    fn path(&self) -> String {
        self.stat_file.display().to_string()
    }

    fn read_counters(&self) -> Result<NetworkCounters, ConfigurationError> {
        let content = std::fs::read_to_string(&self.stat_file).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConfigurationError::StatFileMissing { path: self.path() }
            } else {
                ConfigurationError::StatReadError {
                    path: self.path(),
                    source: e,
                }
            }
        })?;
        parse_interface_counters(&content, &self.interface_name, &self.path())
    }

    /// Bytes moved since the previous read, zero on the first read.
    fn counter_deltas(&self, current: NetworkCounters) -> NetworkCounters {
        let mut last = self
            .last_counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let deltas = match *last {
            None => NetworkCounters {
                received_bytes: 0,
                transmitted_bytes: 0,
            },
            // abs_diff tolerates counters that went backwards after a reset
            Some(previous) => NetworkCounters {
                received_bytes: current.received_bytes.abs_diff(previous.received_bytes),
                transmitted_bytes: current.transmitted_bytes.abs_diff(previous.transmitted_bytes),
            },
        };
        *last = Some(current);
        deltas
    }

    /// Seconds since the previous read; 1.0 before the first one.
    fn elapsed_seconds(&self) -> Result<f64, ConfigurationError> {
        let mut stopwatch = self.stopwatch.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = stopwatch.elapsed();
        stopwatch.restart();
        match elapsed {
            None => Ok(1.0),
            Some(elapsed) if elapsed.is_zero() => {
                Err(ConfigurationError::ZeroElapsedTime { path: self.path() })
            }
            Some(elapsed) => Ok(elapsed.as_secs_f64()),
        }
    }

    fn utilization(&self, direction: NetworkDirection) -> Result<f64, ConfigurationError> {
        let current = self.read_counters()?;
        let delta_bytes = self.counter_deltas(current).get(direction);
        let delta_mb = delta_bytes as f64 / BYTES_PER_MB;
        let elapsed_secs = self.elapsed_seconds()?;
        let rate_mbps = delta_mb / elapsed_secs;
        let percentage = (rate_mbps / self.max_bandwidth_mbps * 100.0).min(100.0);

        debug!(
            interface = %self.interface_name,
            direction = ?direction,
            delta_bytes,
            elapsed_secs,
            rate_mbps,
            percentage,
            "network utilization captured"
        );
        Ok(percentage)
    }
}

/// Find `interface` in a `/proc/net/dev` table and read its byte counters.
fn parse_interface_counters(
    content: &str,
    interface: &str,
    path: &str,
) -> Result<NetworkCounters, ConfigurationError> {
    let fields = content
        .lines()
        .skip(HEADER_LINES)
        .filter_map(|line| line.split_once(':'))
        .find(|(label, _)| label.trim() == interface)
        .map(|(_, fields)| fields.split_whitespace().collect::<Vec<_>>())
        .ok_or_else(|| ConfigurationError::InterfaceNotFound {
            interface: interface.to_string(),
            path: path.to_string(),
        })?;

    let parse = |idx: usize, field: &str| -> Result<u64, ConfigurationError> {
        let raw = fields.get(idx).ok_or_else(|| ConfigurationError::ParseError {
            path: path.to_string(),
            field: field.into(),
            raw: fields.join(" "),
        })?;
        raw.parse::<u64>().map_err(|_| ConfigurationError::ParseError {
            path: path.to_string(),
            field: field.into(),
            raw: raw.to_string(),
        })
    };

    Ok(NetworkCounters {
        received_bytes: parse(RECEIVED_BYTES_FIELD, "rx_bytes")?,
        transmitted_bytes: parse(TRANSMITTED_BYTES_FIELD, "tx_bytes")?,
    })
}

/// Network-in or network-out bandwidth as a [`WorkerMetric`].
pub struct LinuxNetworkWorkerMetric {
    direction: NetworkDirection,
    operating_range: OperatingRange,
    reader: NetworkRateReader,
}

impl LinuxNetworkWorkerMetric {
    pub fn network_in(
        operating_range: OperatingRange,
        config: NetworkMetricConfig,
    ) -> Result<Self, ConfigurationError> {
        Self::with_stopwatch(
            NetworkDirection::Received,
            operating_range,
            config,
            Stopwatch::system(),
        )
    }

    pub fn network_out(
        operating_range: OperatingRange,
        config: NetworkMetricConfig,
    ) -> Result<Self, ConfigurationError> {
        Self::with_stopwatch(
            NetworkDirection::Transmitted,
            operating_range,
            config,
            Stopwatch::system(),
        )
    }

    /// Build with an explicit elapsed-time source. The stopwatch should be unstarted.
    pub fn with_stopwatch(
        direction: NetworkDirection,
        operating_range: OperatingRange,
        config: NetworkMetricConfig,
        stopwatch: Stopwatch,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            direction,
            operating_range,
            reader: NetworkRateReader::new(config, stopwatch)?,
        })
    }

    pub fn direction(&self) -> NetworkDirection {
        self.direction
    }
}

impl WorkerMetric for LinuxNetworkWorkerMetric {
    fn metric_type(&self) -> WorkerMetricType {
        self.direction.metric_type()
    }

    fn operating_range(&self) -> OperatingRange {
        self.operating_range
    }

    fn capture(&self) -> Result<WorkerMetricValue, ConfigurationError> {
        WorkerMetricValue::new(self.reader.utilization(self.direction)?)
    }
}
