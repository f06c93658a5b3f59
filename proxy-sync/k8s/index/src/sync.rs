use crate::{metrics::Metrics, tracker::SharedTracker, EndpointsMap};
use ahash::AHashMap as HashMap;
use proxy_sync_core::{NamespacedName, UpdateResult};
use std::sync::Arc;
use tokio::{
    sync::watch,
    time::{self, Duration, Instant, MissedTickBehavior},
};

#[cfg(test)]
mod tests;

/// Programs the proxy's data plane from synced endpoints.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Applies a sync's diff. `snapshot` holds the complete endpoints state after the diff.
    ///
    /// Failed syncs are retried on the next sync with the then-current snapshot.
    async fn sync(
        &self,
        snapshot: Arc<EndpointsSnapshot>,
        result: &UpdateResult,
    ) -> anyhow::Result<()>;
}

/// An immutable view of the endpoints state published after each sync.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EndpointsSnapshot {
    pub endpoints: EndpointsMap,
    pub hc_endpoints_local_ip_size: HashMap<NamespacedName, usize>,
}

/// Consumes changes from a tracker and syncs them to a backend.
///
/// The syncer exclusively owns the endpoints map; readers observe it through published
/// snapshots.
pub struct Syncer<B> {
    tracker: SharedTracker,
    map: EndpointsMap,
    backend: B,
    tx: watch::Sender<Arc<EndpointsSnapshot>>,
    sync_period: Duration,
    min_sync_period: Duration,
    metrics: Metrics,
}

// === impl Syncer ===

impl<B: Backend> Syncer<B> {
    pub fn new(
        tracker: SharedTracker,
        backend: B,
        sync_period: Duration,
        min_sync_period: Duration,
        metrics: Metrics,
    ) -> (Self, watch::Receiver<Arc<EndpointsSnapshot>>) {
        let (tx, rx) = watch::channel(Arc::new(EndpointsSnapshot::default()));
        let syncer = Self {
            tracker,
            map: EndpointsMap::default(),
            backend,
            tx,
            sync_period,
            min_sync_period,
            metrics,
        };
        (syncer, rx)
    }

    pub fn endpoints(&self) -> &EndpointsMap {
        &self.map
    }

    /// Applies all pending changes, publishes the resulting snapshot, and syncs the backend.
    pub async fn sync(&mut self) -> UpdateResult {
        let started = Instant::now();
        let result = self.map.apply(self.tracker.checkout());

        let snapshot = Arc::new(EndpointsSnapshot {
            endpoints: self.map.clone(),
            hc_endpoints_local_ip_size: result.hc_endpoints_local_ip_size.clone(),
        });
        self.tx.send_replace(snapshot.clone());

        if let Err(error) = self.backend.sync(snapshot, &result).await {
            tracing::warn!(%error, "Failed to sync backend");
        }

        self.metrics.record_sync(
            started,
            result.stale_endpoints.len(),
            self.map.len(),
            &result.last_change_trigger_times,
        );
        tracing::debug!(
            services = self.map.len(),
            stale_endpoints = result.stale_endpoints.len(),
            stale_services = result.stale_service_names.len(),
            elapsed = ?started.elapsed(),
            "Synced endpoints"
        );
        result
    }

    /// Syncs periodically and whenever changes are recorded, until shutdown is signaled.
    ///
    /// Syncs are started no more often than the minimum sync period. A sync in progress when
    /// shutdown is signaled completes before the loop exits.
    pub async fn run(mut self, drain: drain::Watch) {
        tokio::pin! {
            let shutdown = drain.signaled();
        }

        let mut interval = time::interval(self.sync_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_sync = None::<Instant>;

        loop {
            tokio::select! {
                biased;
                _release = (&mut shutdown) => {
                    tracing::debug!("Shutting down");
                    return;
                }
                _ = interval.tick() => {}
                _ = self.tracker.changed() => {}
            }

            if let Some(last) = last_sync {
                tokio::select! {
                    biased;
                    _release = (&mut shutdown) => {
                        tracing::debug!("Shutting down");
                        return;
                    }
                    _ = time::sleep_until(last + self.min_sync_period) => {}
                }
            }

            last_sync = Some(Instant::now());
            self.sync().await;
            interval.reset();
        }
    }
}
