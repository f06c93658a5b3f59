use chrono::{offset::Utc, DateTime};
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram},
    registry::{Registry, Unit},
};
use proxy_sync_core::PartitionId;
use tokio::time;

/// Metrics describing endpoint changes and the syncs that consume them.
#[derive(Clone, Debug)]
pub struct Metrics {
    changes: Family<PartitionLabels, Counter>,
    changes_pending: Gauge,
    sync_duration: Histogram,
    network_programming: Histogram,
    stale_endpoints: Counter,
    map_size: Gauge,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct PartitionLabels {
    partition: String,
}

// === impl Metrics ===

impl Metrics {
    pub fn register(reg: &mut Registry) -> Self {
        let metrics = Self::default();

        reg.register(
            "endpoint_changes",
            "Count of endpoints updates observed from each partition",
            metrics.changes.clone(),
        );

        reg.register(
            "endpoint_changes_pending",
            "Gauge of endpoints objects with changes that have not been synced",
            metrics.changes_pending.clone(),
        );

        reg.register_with_unit(
            "sync_proxy_rules_duration",
            "Histogram of the time taken to apply pending changes and sync the backend",
            Unit::Seconds,
            metrics.sync_duration.clone(),
        );

        reg.register_with_unit(
            "network_programming_duration",
            "Histogram of the time between an endpoints change being triggered and it being synced",
            Unit::Seconds,
            metrics.network_programming.clone(),
        );

        reg.register(
            "stale_endpoints",
            "Count of endpoints reported stale to the backend",
            metrics.stale_endpoints.clone(),
        );

        reg.register(
            "endpoints_map_size",
            "Gauge of the number of service ports with endpoints",
            metrics.map_size.clone(),
        );

        metrics
    }

    pub(crate) fn record_change(&self, partition: PartitionId) {
        self.changes
            .get_or_create(&PartitionLabels {
                partition: partition.to_string(),
            })
            .inc();
    }

    pub(crate) fn set_pending(&self, pending: usize) {
        self.changes_pending.set(pending as i64);
    }

    pub(crate) fn record_sync(
        &self,
        started: time::Instant,
        stale_endpoints: usize,
        map_size: usize,
        trigger_times: &[DateTime<Utc>],
    ) {
        self.sync_duration.observe(started.elapsed().as_secs_f64());
        self.stale_endpoints.inc_by(stale_endpoints as u64);
        self.map_size.set(map_size as i64);

        let now = Utc::now();
        for trigger in trigger_times {
            // Clock skew between the API server and this node may produce negative latencies.
            if let Ok(latency) = (now - *trigger).to_std() {
                self.network_programming.observe(latency.as_secs_f64());
            }
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            changes: Family::default(),
            changes_pending: Gauge::default(),
            sync_duration: Histogram::new([0.001, 0.01, 0.1, 1.0, 10.0, 60.0]),
            network_programming: Histogram::new([
                0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0,
            ]),
            stale_endpoints: Counter::default(),
            map_size: Gauge::default(),
        }
    }
}
