//! Pacing of a polling loop between successive fetch attempts.

use chrono::{DateTime, Utc};

/// Inputs gathered by the polling loop before it asks how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SleepTimeControllerConfig {
    pub last_successful_call: Option<DateTime<Utc>>,
    pub idle_millis_between_calls: i64,
    pub last_millis_behind_latest: Option<i64>,
    pub millis_behind_latest_threshold_for_reduced_tps: Option<i64>,
}

pub trait SleepTimeController: Send + Sync {
    /// Milliseconds to wait before the next call, measured against `now`.
    fn sleep_time_millis_at(&self, config: &SleepTimeControllerConfig, now: DateTime<Utc>) -> i64;

    fn sleep_time_millis(&self, config: &SleepTimeControllerConfig) -> i64 {
        self.sleep_time_millis_at(config, Utc::now())
    }
}

/// Spaces calls at least `idle_millis_between_calls` apart, and slows further
/// while the consumer is within the reduced-TPS lag threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LagAwareSleepTimeController;

impl SleepTimeController for LagAwareSleepTimeController {
    fn sleep_time_millis_at(&self, config: &SleepTimeControllerConfig, now: DateTime<Utc>) -> i64 {
        let Some(last_successful_call) = config.last_successful_call else {
            return config.idle_millis_between_calls;
        };
        let time_since_last_call = (now - last_successful_call).num_milliseconds().abs();

        let idle_sleep = config
            .idle_millis_between_calls
            .saturating_sub(time_since_last_call)
            .max(0);

        // may be negative; it then loses to the idle term
        let reduced_tps_sleep = match (
            config.last_millis_behind_latest,
            config.millis_behind_latest_threshold_for_reduced_tps,
        ) {
            (Some(behind), Some(threshold)) if behind < threshold => {
                threshold.saturating_sub(time_since_last_call)
            }
            _ => 0,
        };

        idle_sleep.max(reduced_tps_sleep)
    }
}
