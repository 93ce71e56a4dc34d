use super::{OperatingRange, WorkerMetric, WorkerMetricType};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// The metrics configured on a worker, at most one per [`WorkerMetricType`].
#[derive(Default)]
pub struct WorkerMetricRegistry {
    metrics: BTreeMap<WorkerMetricType, Box<dyn WorkerMetric>>,
}

impl WorkerMetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, replacing any metric of the same type.
    pub fn register(&mut self, metric: Box<dyn WorkerMetric>) {
        let metric_type = metric.metric_type();
        if self.metrics.insert(metric_type, metric).is_some() {
            warn!(metric = %metric_type, "replaced previously registered worker metric");
        }
    }

    pub fn get(&self, metric_type: WorkerMetricType) -> Option<&dyn WorkerMetric> {
        self.metrics.get(&metric_type).map(|metric| &**metric)
    }

    pub fn get_by_short_name(&self, short_name: &str) -> Option<&dyn WorkerMetric> {
        WorkerMetricType::from_short_name(short_name).and_then(|metric_type| self.get(metric_type))
    }

    pub fn operating_ranges(&self) -> HashMap<String, OperatingRange> {
        self.metrics
            .values()
            .map(|metric| (metric.short_name().to_string(), metric.operating_range()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn WorkerMetric> {
        self.metrics.values().map(|metric| &**metric)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedMetric;
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = WorkerMetricRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(ScriptedMetric::new(WorkerMetricType::NetworkIn, 80, vec![])));
        registry.register(Box::new(ScriptedMetric::new(WorkerMetricType::NetworkOut, 60, vec![])));

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get_by_short_name("NI").map(|m| m.metric_type()),
            Some(WorkerMetricType::NetworkIn)
        );
        assert!(registry.get(WorkerMetricType::Cpu).is_none());
        assert!(registry.get_by_short_name("unknown").is_none());

        let ranges = registry.operating_ranges();
        assert_eq!(ranges["NI"].max_utilization(), 80);
        assert_eq!(ranges["NO"].max_utilization(), 60);
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut registry = WorkerMetricRegistry::new();
        registry.register(Box::new(ScriptedMetric::new(WorkerMetricType::Memory, 80, vec![])));
        registry.register(Box::new(ScriptedMetric::new(WorkerMetricType::Memory, 50, vec![])));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .get(WorkerMetricType::Memory)
                .map(|m| m.operating_range().max_utilization()),
            Some(50)
        );
    }
}
