use crate::snapshot::WorkerMetricsSnapshot;
use async_trait::async_trait;
use tracing::info;

/// Destination for snapshots once a collection round completes.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn publish(&self, snapshot: &WorkerMetricsSnapshot) -> anyhow::Result<()>;
}

/// Emits each snapshot as a JSON log event.
#[derive(Debug, Default)]
pub struct LogSnapshotSink;

#[async_trait]
impl SnapshotSink for LogSnapshotSink {
    async fn publish(&self, snapshot: &WorkerMetricsSnapshot) -> anyhow::Result<()> {
        let body = serde_json::to_string(snapshot)?;
        info!(
            worker_id = snapshot.worker_id.as_deref().unwrap_or_default(),
            valid = snapshot.is_valid_snapshot(),
            failing = snapshot.is_any_metric_failing(),
            snapshot = %body,
            "worker metrics snapshot"
        );
        Ok(())
    }
}
