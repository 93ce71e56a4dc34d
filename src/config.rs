use crate::errors::ConfigurationError;
use crate::metric::linux_network::{
    NetworkMetricConfig, DEFAULT_INTERFACE_NAME, DEFAULT_NETWORK_STAT_FILE,
};
use crate::metric::OperatingRange;
use crate::sleep::SleepTimeControllerConfig;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "worker-telemetry", version, about)]
pub struct Config {
    /// Unique identifier for this worker.
    /// if none provided, default to hostname.
    #[arg(long, env = "WORKER_TELEMETRY_WORKER_ID")]
    pub worker_id: Option<String>,

    /// Network statistics table to sample.
    #[arg(long, env = "WORKER_TELEMETRY_STAT_FILE", default_value = DEFAULT_NETWORK_STAT_FILE)]
    pub stat_file: PathBuf,

    /// Network interface whose counters are sampled.
    #[arg(long, env = "WORKER_TELEMETRY_INTERFACE", default_value = DEFAULT_INTERFACE_NAME)]
    pub interface: String,

    /// Bandwidth in MB/s treated as 100% utilization.
    #[arg(long, env = "WORKER_TELEMETRY_MAX_BANDWIDTH_MBPS", default_value_t = 125.0)]
    pub max_bandwidth_mbps: f64,

    /// Operating ceiling (0-100) for inbound network utilization.
    #[arg(long, env = "WORKER_TELEMETRY_NETWORK_IN_MAX_UTILIZATION", default_value_t = 100)]
    pub network_in_max_utilization: i64,

    /// Operating ceiling (0-100) for outbound network utilization.
    #[arg(long, env = "WORKER_TELEMETRY_NETWORK_OUT_MAX_UTILIZATION", default_value_t = 100)]
    pub network_out_max_utilization: i64,

    /// Minimum spacing between polling rounds in milliseconds.
    #[arg(long, env = "WORKER_TELEMETRY_IDLE_MILLIS_BETWEEN_CALLS", default_value_t = 1000)]
    pub idle_millis_between_calls: i64,

    /// Lag below which polling is slowed to the threshold itself.
    #[arg(long, env = "WORKER_TELEMETRY_MILLIS_BEHIND_LATEST_THRESHOLD")]
    pub millis_behind_latest_threshold_for_reduced_tps: Option<i64>,

    /// Last observed consumer lag in milliseconds, fed to the sleep controller.
    #[arg(long, env = "WORKER_TELEMETRY_MILLIS_BEHIND_LATEST")]
    pub millis_behind_latest: Option<i64>,

    /// Recent samples kept per metric in each snapshot.
    #[arg(long, env = "WORKER_TELEMETRY_MAX_SAMPLES_PER_METRIC", default_value_t = 10)]
    pub max_samples_per_metric: usize,

    /// Stop after this many polling rounds.
    #[arg(long, env = "WORKER_TELEMETRY_MAX_ITERATIONS")]
    pub max_iterations: Option<u64>,

    /// Enable JSON structured logging.
    #[arg(long, env = "WORKER_TELEMETRY_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}

impl Config {
    /// get worker ID, upon failure fallback to hostname.
    pub fn resolved_worker_id(&self) -> String {
        self.worker_id.clone().unwrap_or_else(|| {
            hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown-worker".to_string())
        })
    }

    pub fn network_metric_config(&self) -> NetworkMetricConfig {
        NetworkMetricConfig {
            interface_name: self.interface.clone(),
            stat_file: self.stat_file.clone(),
            max_bandwidth_mbps: self.max_bandwidth_mbps,
        }
    }

    pub fn network_in_range(&self) -> Result<OperatingRange, ConfigurationError> {
        OperatingRange::new(self.network_in_max_utilization)
    }

    pub fn network_out_range(&self) -> Result<OperatingRange, ConfigurationError> {
        OperatingRange::new(self.network_out_max_utilization)
    }

    pub fn sleep_config(
        &self,
        last_successful_call: Option<DateTime<Utc>>,
    ) -> SleepTimeControllerConfig {
        SleepTimeControllerConfig {
            last_successful_call,
            idle_millis_between_calls: self.idle_millis_between_calls,
            last_millis_behind_latest: self.millis_behind_latest,
            millis_behind_latest_threshold_for_reduced_tps: self
                .millis_behind_latest_threshold_for_reduced_tps,
        }
    }
}
