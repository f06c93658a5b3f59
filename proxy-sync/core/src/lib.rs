//! Domain types shared by the endpoint sync core.
//!
//! Endpoints are published by several independent API server partitions. Every object is scoped
//! by tenant, namespace and name, and each of its ports projects into a [`ServicePortName`] that
//! maps to a list of concrete [`Endpoint`]s.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod endpoint;
mod family;
pub mod mode;
mod object;


pub use self::{
    endpoint::{Endpoint, NamespacedName, ServiceEndpoint, ServicePortName, UpdateResult},
    family::{IpFamilyFilter, ParseIpFamilyError},
    mode::{Capabilities, ParseProxyModeError, ProxyMode},
    object::{EndpointAddress, EndpointPort, EndpointSubset, EndpointsObject},
};

/// The annotation carrying the time of the last change that triggered an update to an
/// endpoints object.
pub const LAST_CHANGE_TRIGGER_TIME_ANNOTATION: &str = "endpoints.kubernetes.io/last-change-trigger-time";

/// The tenant assigned to objects that carry no tenant of their own.
pub const DEFAULT_TENANT: &str = "system";

/// Identifies one API server partition feeding this node.
///
/// Partition `0` is the partition served by the primary client.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartitionId(pub u32);

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
