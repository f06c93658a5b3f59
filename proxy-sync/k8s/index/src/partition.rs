use crate::tracker::SharedTracker;
use ahash::AHashMap as HashMap;
use kubert::index::{IndexNamespacedResource, NamespacedRemoved};
use parking_lot::RwLock;
use proxy_sync_core::{EndpointsObject, PartitionId};
use proxy_sync_k8s_api::{Endpoints, TenantSource};
use std::sync::Arc;


pub type SharedPartitionIndex = Arc<RwLock<PartitionIndex>>;

/// Indexes the endpoints observed from a single partition.
///
/// Watch events only carry the new state of an object, so the last-seen state of every object
/// is retained to describe each event to the tracker as a transition.
#[derive(Debug)]
pub struct PartitionIndex {
    partition: PartitionId,
    tenants: TenantSource,
    tracker: SharedTracker,
    objects: HashMap<(String, String), EndpointsObject>,
}

// === impl PartitionIndex ===

impl PartitionIndex {
    pub fn new(partition: PartitionId, tenants: TenantSource, tracker: SharedTracker) -> Self {
        Self {
            partition,
            tenants,
            tracker,
            objects: HashMap::new(),
        }
    }

    pub fn shared(
        partition: PartitionId,
        tenants: TenantSource,
        tracker: SharedTracker,
    ) -> SharedPartitionIndex {
        Arc::new(RwLock::new(Self::new(partition, tenants, tracker)))
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl IndexNamespacedResource<Endpoints> for PartitionIndex {
    fn apply(&mut self, endpoints: Endpoints) {
        let current = self.tenants.endpoints_object(&endpoints);
        let key = (current.namespace.clone(), current.name.clone());
        tracing::trace!(
            partition = %self.partition,
            namespace = %key.0,
            name = %key.1,
            "Applying endpoints"
        );

        let previous = self.objects.insert(key, current.clone());
        self.tracker.update(previous.as_ref(), Some(&current), self.partition);
    }

    fn delete(&mut self, namespace: String, name: String) {
        tracing::trace!(partition = %self.partition, %namespace, %name, "Deleting endpoints");
        if let Some(previous) = self.objects.remove(&(namespace, name)) {
            self.tracker.update(Some(&previous), None, self.partition);
        }
    }

    fn reset(&mut self, endpoints: Vec<Endpoints>, removed: NamespacedRemoved) {
        tracing::debug!(
            partition = %self.partition,
            endpoints = endpoints.len(),
            "Resetting endpoints"
        );
        for (namespace, names) in removed {
            for name in names {
                self.delete(namespace.clone(), name);
            }
        }
        for endpoints in endpoints {
            self.apply(endpoints);
        }
    }
}
