//! Debug-only dispatch-rate reporting. Not a metrics-exporter pipeline -- just periodic
//! per-region dispatch counters, logged through `tracing` like everything else in this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Atomic per-region dispatch counters, held in a concurrent map. Cheap to increment from any
/// worker; read only by the reporter task.
#[derive(Debug, Default)]
pub struct DebugMetrics {
    dispatched_by_region: HashMap<String, AtomicU64>,
}

impl DebugMetrics {
    pub fn new(regions: &[String]) -> Self {
        Self {
            dispatched_by_region: regions
                .iter()
                .map(|region| (region.clone(), AtomicU64::new(0)))
                .collect(),
        }
    }

    /// No-op for an unconfigured region rather than panicking -- a misrouted key should not take
    /// down the reporter.
    pub fn record_dispatch(&self, region: &str) {
        if let Some(counter) = self.dispatched_by_region.get(region) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> Vec<(String, u64)> {
        let mut counts: Vec<_> = self
            .dispatched_by_region
            .iter()
            .map(|(region, count)| (region.clone(), count.load(Ordering::Relaxed)))
            .collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }
}

/// Runs until shutdown, logging per-region dispatch counts every `period` (gated by the
/// `enable-debug-metrics` config flag).
pub async fn run_reporter(metrics: Arc<DebugMetrics>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                for (region, count) in metrics.snapshot() {
                    info!(region = %region, dispatched = count, "debug metrics");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_dispatch_increments_the_right_region() {
        let metrics = DebugMetrics::new(&["us-east-1".to_string(), "eu-west-1".to_string()]);
        metrics.record_dispatch("us-east-1");
        metrics.record_dispatch("us-east-1");
        metrics.record_dispatch("eu-west-1");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot, vec![
            ("eu-west-1".to_string(), 1),
            ("us-east-1".to_string(), 2),
        ]);
    }

    #[test]
    fn record_dispatch_ignores_unconfigured_region() {
        let metrics = DebugMetrics::new(&["us-east-1".to_string()]);
        metrics.record_dispatch("eu-west-1");
        assert_eq!(metrics.snapshot(), vec![("us-east-1".to_string(), 0)]);
    }
}
