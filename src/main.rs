use chrono::Utc;
use clap::Parser;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worker_telemetry::config::Config;
use worker_telemetry::manager::WorkerMetricsManager;
use worker_telemetry::metric::linux_network::LinuxNetworkWorkerMetric;
use worker_telemetry::metric::registry::WorkerMetricRegistry;
use worker_telemetry::publisher::{LogSnapshotSink, SnapshotSink};
use worker_telemetry::sleep::{LagAwareSleepTimeController, SleepTimeController};

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.json_logs);

    let worker_id = config.resolved_worker_id();
    let mut registry = WorkerMetricRegistry::new();
    registry.register(Box::new(LinuxNetworkWorkerMetric::network_in(
        config.network_in_range()?,
        config.network_metric_config(),
    )?));
    registry.register(Box::new(LinuxNetworkWorkerMetric::network_out(
        config.network_out_range()?,
        config.network_metric_config(),
    )?));
    let mut manager = WorkerMetricsManager::new(registry, config.max_samples_per_metric)?;

    let sink = LogSnapshotSink;
    let controller = LagAwareSleepTimeController;
    let mut last_successful_call = None;
    let mut iteration = 0u64;

    info!(
        worker_id = %worker_id,
        interface = %config.interface,
        stat_file = %config.stat_file.display(),
        "starting worker telemetry loop"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        // capture reads /proc synchronously
        let round = tokio::task::block_in_place(|| manager.capture_all());
        let now = Utc::now();
        if round.is_clean() {
            last_successful_call = Some(now);
        }

        let snapshot = manager.snapshot(&worker_id, now.timestamp());
        if !snapshot.is_valid_snapshot() {
            warn!(worker_id = %worker_id, "snapshot is not valid for rebalancing");
        }
        if let Err(e) = sink.publish(&snapshot).await {
            warn!(error = %e, "failed to publish worker metrics snapshot");
        }

        iteration += 1;
        if config.max_iterations.is_some_and(|max| iteration >= max) {
            info!(iterations = iteration, "reached configured iteration limit");
            break;
        }

        let sleep_ms = controller.sleep_time_millis(&config.sleep_config(last_successful_call));
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(sleep_ms.max(0) as u64)) => {}
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}
