//! Destinations for per-step metrics.

use tracing::info;

use super::Metrics;

pub trait MetricsSink {
    fn record(&mut self, step: usize, metrics: &Metrics);
}

/// Emits every metric as a structured `info` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&mut self, step: usize, metrics: &Metrics) {
        for (name, value) in metrics {
            info!(step, metric = %name, value, "metric");
        }
    }
}

/// Keeps every recorded step in memory.
#[derive(Clone, Debug, Default)]
pub struct MetricsHistory {
    records: Vec<(usize, Metrics)>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[(usize, Metrics)] {
        &self.records
    }

    /// Values of one metric in recording order, skipping steps without it.
    pub fn series(&self, name: &str) -> Vec<f64> {
        self.records.iter().filter_map(|(_, m)| m.get(name).copied()).collect()
    }

    pub fn last(&self) -> Option<&Metrics> {
        self.records.last().map(|(_, m)| m)
    }
}

impl MetricsSink for MetricsHistory {
    fn record(&mut self, step: usize, metrics: &Metrics) {
        self.records.push((step, metrics.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_series() {
        let mut history = MetricsHistory::new();
        let mut first = Metrics::new();
        first.insert("energy/energy".into(), -1.0);
        let mut second = Metrics::new();
        second.insert("energy/energy".into(), -2.0);
        second.insert("sampler/acceptance_rate".into(), 0.4);
        history.record(0, &first);
        history.record(1, &second);
        TracingSink.record(1, &second);

        assert_eq!(history.series("energy/energy"), vec![-1.0, -2.0]);
        assert_eq!(history.series("sampler/acceptance_rate"), vec![0.4]);
        assert_eq!(history.last(), Some(&second));
    }
}
