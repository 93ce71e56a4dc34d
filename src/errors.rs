use thiserror::Error;

// every variant is fatal to the call that raised it; callers decide on retry

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid maxUtilization {max_utilization}: must be within 0..=100")]
    InvalidOperatingRange { max_utilization: i64 },

    #[error("max bandwidth must be greater than 0 MBps, got {max_bandwidth_mbps}")]
    InvalidBandwidth { max_bandwidth_mbps: f64 },

    #[error("metric value {value} is outside 0..=100")]
    InvalidMetricValue { value: f64 },

    #[error("network metric is not configured properly, file {path} does not exist")]
    StatFileMissing { path: String },

    #[error("failed to read {path}: {source}")]
    StatReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to find interface {interface} in {path}")]
    InterfaceNotFound { interface: String, path: String },

    #[error("failed to parse {field} from {path}: {raw}")]
    ParseError {
        path: String,
        field: String,
        raw: String,
    },

    #[error("elapsed time since last read of {path} is zero")]
    ZeroElapsedTime { path: String },

    #[error("sample history length must be at least 1")]
    InvalidHistoryLength,
}
