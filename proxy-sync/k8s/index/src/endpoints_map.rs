use crate::tracker::{Change, Changes, ObjectKey, PortEndpoints};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use proxy_sync_core::{Endpoint, NamespacedName, ServiceEndpoint, ServicePortName, UpdateResult};
use std::collections::BTreeSet;


/// The endpoints currently programmed for each service port.
///
/// A service port is only present while at least one endpoint maps to it. The same service port
/// may be published by objects in several partitions; its endpoints are the union of every
/// object's last-applied endpoints.
#[derive(Clone, Debug, Default)]
pub struct EndpointsMap {
    endpoints: HashMap<ServicePortName, Vec<Endpoint>>,
    objects: HashMap<ObjectKey, PortEndpoints>,
    contributors: HashMap<ServicePortName, BTreeSet<ObjectKey>>,
}

// === impl EndpointsMap ===

impl EndpointsMap {
    /// Applies a batch of changes drained from a tracker, returning the resulting diff.
    ///
    /// Each changed object's endpoints replace the ones last applied for it, and every service
    /// port it touches is rebuilt from all of its contributors. The resulting map only depends
    /// on the latest endpoints of each object, not on how changes were batched.
    pub fn apply(&mut self, changes: Changes) -> UpdateResult {
        let Changes {
            changes,
            trigger_times,
        } = changes;

        let mut affected = BTreeSet::new();
        for Change {
            object,
            previous,
            current,
        } in changes
        {
            let applied = self.objects.remove(&object).unwrap_or_default();
            if applied != previous {
                tracing::warn!(
                    service = %object.service,
                    partition = %object.partition,
                    "Change does not match the applied endpoints"
                );
            }

            for name in applied.keys() {
                if let Some(keys) = self.contributors.get_mut(name) {
                    keys.remove(&object);
                    if keys.is_empty() {
                        self.contributors.remove(name);
                    }
                }
                affected.insert(name.clone());
            }
            for name in current.keys() {
                self.contributors
                    .entry(name.clone())
                    .or_default()
                    .insert(object.clone());
                affected.insert(name.clone());
            }

            if !current.is_empty() {
                self.objects.insert(object, current);
            }
        }

        let mut stale_endpoints = Vec::new();
        let mut stale_service_names = HashSet::new();
        for name in affected {
            let old = self.endpoints.remove(&name).unwrap_or_default();
            let rebuilt = self.merge(&name);

            for endpoint in &old {
                if !rebuilt.contains(endpoint) {
                    stale_endpoints.push(ServiceEndpoint::new(&endpoint.addr, name.clone()));
                }
            }
            if old.is_empty() && !rebuilt.is_empty() {
                stale_service_names.insert(name.clone());
            }

            if !rebuilt.is_empty() {
                self.endpoints.insert(name, rebuilt);
            }
        }

        UpdateResult {
            stale_endpoints,
            stale_service_names,
            hc_endpoints_local_ip_size: self
                .local_endpoint_ips()
                .into_iter()
                .map(|(service, ips)| (service, ips.len()))
                .collect(),
            last_change_trigger_times: trigger_times,
        }
    }

    /// Merges the endpoints every contributing object publishes for a service port, in
    /// contributor order.
    fn merge(&self, name: &ServicePortName) -> Vec<Endpoint> {
        let mut merged = Vec::new();
        let Some(keys) = self.contributors.get(name) else {
            return merged;
        };
        for key in keys {
            let Some(endpoints) = self.objects.get(key).and_then(|object| object.get(name)) else {
                continue;
            };
            for endpoint in endpoints {
                insert_endpoint(&mut merged, endpoint.clone());
            }
        }
        merged
    }

    /// Returns the distinct IPs of local endpoints for each service that has any.
    pub fn local_endpoint_ips(&self) -> HashMap<NamespacedName, HashSet<String>> {
        let mut ips = HashMap::<NamespacedName, HashSet<String>>::new();
        for (name, endpoints) in &self.endpoints {
            for endpoint in endpoints.iter().filter(|ep| ep.is_local) {
                ips.entry(name.service())
                    .or_default()
                    .insert(endpoint.ip().to_string());
            }
        }
        ips
    }

    pub fn get(&self, name: &ServicePortName) -> Option<&[Endpoint]> {
        self.endpoints.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &ServicePortName, endpoint: &Endpoint) -> bool {
        self.endpoints
            .get(name)
            .is_some_and(|endpoints| endpoints.contains(endpoint))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServicePortName, &[Endpoint])> {
        self.endpoints.iter().map(|(name, eps)| (name, eps.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Maps are equal when they program the same endpoints, regardless of which objects
/// contributed them.
impl PartialEq for EndpointsMap {
    fn eq(&self, other: &Self) -> bool {
        self.endpoints == other.endpoints
    }
}

impl Eq for EndpointsMap {}

/// Builds a map with no contributing objects.
impl FromIterator<(ServicePortName, Vec<Endpoint>)> for EndpointsMap {
    fn from_iter<T: IntoIterator<Item = (ServicePortName, Vec<Endpoint>)>>(iter: T) -> Self {
        let mut map = HashMap::<ServicePortName, Vec<Endpoint>>::new();
        for (name, endpoints) in iter {
            let current = map.entry(name).or_default();
            for endpoint in endpoints {
                insert_endpoint(current, endpoint);
            }
        }
        map.retain(|_, eps| !eps.is_empty());
        Self {
            endpoints: map,
            ..Self::default()
        }
    }
}

/// Adds an endpoint to a service port's list. An existing endpoint with the same address is
/// replaced so that the last-seen locality wins.
pub(crate) fn insert_endpoint(endpoints: &mut Vec<Endpoint>, endpoint: Endpoint) {
    match endpoints.iter_mut().find(|ep| ep.addr == endpoint.addr) {
        Some(existing) => *existing = endpoint,
        None => endpoints.push(endpoint),
    }
}
