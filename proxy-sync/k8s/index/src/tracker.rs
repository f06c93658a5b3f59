use crate::{endpoints_map::insert_endpoint, metrics::Metrics};
use ahash::AHashMap as HashMap;
use chrono::{offset::Utc, DateTime};
use parking_lot::Mutex;
use proxy_sync_core::{
    Endpoint, EndpointsObject, IpFamilyFilter, NamespacedName, PartitionId, ServicePortName,
};
use std::{collections::BTreeMap, net::IpAddr, sync::Arc};
use tokio::sync::Notify;


/// The endpoints contributed by a single endpoints object, keyed by service port.
pub type PortEndpoints = BTreeMap<ServicePortName, Vec<Endpoint>>;

pub type SharedTracker = Arc<ChangeTracker>;

/// Accumulates endpoints changes from all partitions until they are consumed by a sync.
///
/// Changes to the same object collapse into a single pending change holding the object's
/// projection as of the last sync and its latest projection.
#[derive(Debug)]
pub struct ChangeTracker {
    hostname: String,
    family: IpFamilyFilter,
    state: Mutex<State>,
    changed: Notify,
    metrics: Metrics,
}

/// A pending change to a single endpoints object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Change {
    pub object: ObjectKey,
    pub previous: PortEndpoints,
    pub current: PortEndpoints,
}

/// All changes drained from a tracker by a single sync.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changes {
    pub changes: Vec<Change>,
    pub trigger_times: Vec<DateTime<Utc>>,
}

/// Identifies an endpoints object within a partition.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectKey {
    pub partition: PartitionId,
    pub service: NamespacedName,
}

#[derive(Debug, Default)]
struct State {
    items: HashMap<ObjectKey, Change>,
    trigger_times: HashMap<ObjectKey, Vec<DateTime<Utc>>>,
}

// === impl ChangeTracker ===

impl ChangeTracker {
    pub fn new(hostname: impl ToString, family: IpFamilyFilter, metrics: Metrics) -> Self {
        Self {
            hostname: hostname.to_string(),
            family,
            state: Mutex::new(State::default()),
            changed: Notify::new(),
            metrics,
        }
    }

    pub fn shared(
        hostname: impl ToString,
        family: IpFamilyFilter,
        metrics: Metrics,
    ) -> SharedTracker {
        Arc::new(Self::new(hostname, family, metrics))
    }

    /// Records an observed change to an endpoints object.
    ///
    /// `previous` is absent when the object was created and `current` is absent when it was
    /// deleted. Returns true if any changes are pending after the update.
    pub fn update(
        &self,
        previous: Option<&EndpointsObject>,
        current: Option<&EndpointsObject>,
        partition: PartitionId,
    ) -> bool {
        let Some(object) = current.or(previous) else {
            return false;
        };
        let key = ObjectKey {
            partition,
            service: object.service(),
        };
        self.metrics.record_change(partition);

        let previous = self.project(previous);
        let projected = self.project(current);

        let mut state = self.state.lock();
        let State {
            items,
            trigger_times,
        } = &mut *state;

        let change = items.entry(key.clone()).or_insert_with(|| Change {
            object: key.clone(),
            previous,
            current: PortEndpoints::new(),
        });
        change.current = projected;

        if let Some(time) = current.and_then(|c| c.last_change_trigger_time) {
            let times = trigger_times.entry(key.clone()).or_default();
            if times.last() != Some(&time) {
                times.push(time);
            }
        }

        if change.previous == change.current {
            tracing::trace!(service = %key.service, %partition, "Change cancelled out");
            items.remove(&key);
            trigger_times.remove(&key);
        }

        let pending = items.len();
        drop(state);

        self.metrics.set_pending(pending);
        if pending > 0 {
            self.changed.notify_one();
        }
        pending > 0
    }

    /// Drains all pending changes, leaving the tracker empty.
    pub fn checkout(&self) -> Changes {
        let State {
            items,
            trigger_times,
        } = std::mem::take(&mut *self.state.lock());
        self.metrics.set_pending(0);

        let mut items = items.into_iter().collect::<Vec<_>>();
        items.sort_by(|(a, _), (b, _)| a.cmp(b));
        Changes {
            changes: items.into_iter().map(|(_, change)| change).collect(),
            trigger_times: trigger_times.into_values().flatten().collect(),
        }
    }

    /// Completes when changes have been recorded since the last time this completed.
    pub async fn changed(&self) {
        self.changed.notified().await
    }

    /// Projects an endpoints object into the endpoints it contributes to each service port.
    pub fn project(&self, object: Option<&EndpointsObject>) -> PortEndpoints {
        let mut endpoints = PortEndpoints::new();
        let Some(object) = object else {
            return endpoints;
        };

        for subset in &object.subsets {
            for port in &subset.ports {
                let number = match u16::try_from(port.port) {
                    Ok(number) if number != 0 => number,
                    _ => {
                        tracing::warn!(
                            service = %object.service(),
                            port = %port.port,
                            "Ignoring endpoints port with an invalid number"
                        );
                        continue;
                    }
                };
                let name = ServicePortName {
                    tenant: object.tenant.clone(),
                    namespace: object.namespace.clone(),
                    name: object.name.clone(),
                    port: port.name.clone(),
                };

                for addr in &subset.addresses {
                    if addr.ip.is_empty() {
                        tracing::warn!(
                            service = %object.service(),
                            "Ignoring endpoint address without an IP"
                        );
                        continue;
                    }
                    if self.family.is_filtered() {
                        match addr.ip.parse::<IpAddr>() {
                            Ok(ip) if self.family.admits(&ip) => {}
                            Ok(ip) => {
                                tracing::debug!(
                                    service = %object.service(),
                                    %ip,
                                    family = %self.family,
                                    "Skipping endpoint of another IP family"
                                );
                                continue;
                            }
                            Err(error) => {
                                tracing::warn!(
                                    service = %object.service(),
                                    ip = %addr.ip,
                                    %error,
                                    "Ignoring endpoint with an invalid IP"
                                );
                                continue;
                            }
                        }
                    }

                    let is_local = addr
                        .node_name
                        .as_deref()
                        .is_some_and(|node| !node.is_empty() && node == self.hostname);
                    let endpoint = Endpoint::from_ip_port(&addr.ip, number, is_local);
                    insert_endpoint(endpoints.entry(name.clone()).or_default(), endpoint);
                }
            }
        }

        endpoints.retain(|_, eps| !eps.is_empty());
        endpoints
    }
}
