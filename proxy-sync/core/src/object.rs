use crate::NamespacedName;
use chrono::{offset::Utc, DateTime};

/// An endpoints object as observed from a partition, reduced to the fields the proxy uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointsObject {
    pub tenant: String,
    pub namespace: String,
    pub name: String,
    pub subsets: Vec<EndpointSubset>,

    /// The value of the last-change-trigger-time annotation, if it was set and valid.
    pub last_change_trigger_time: Option<DateTime<Utc>>,
}

/// A group of addresses that all expose the same set of ports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointSubset {
    pub addresses: Vec<EndpointAddress>,
    pub ports: Vec<EndpointPort>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointAddress {
    pub ip: String,
    pub node_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointPort {
    /// The port's label. Empty for an unnamed port.
    pub name: String,
    pub port: i32,
}

// === impl EndpointsObject ===

impl EndpointsObject {
    pub fn service(&self) -> NamespacedName {
        NamespacedName {
            tenant: self.tenant.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

// === impl EndpointAddress ===

impl EndpointAddress {
    pub fn new(ip: impl ToString) -> Self {
        Self {
            ip: ip.to_string(),
            node_name: None,
        }
    }

    pub fn on_node(ip: impl ToString, node_name: impl ToString) -> Self {
        Self {
            ip: ip.to_string(),
            node_name: Some(node_name.to_string()),
        }
    }
}

// === impl EndpointPort ===

impl EndpointPort {
    pub fn new(name: impl ToString, port: i32) -> Self {
        Self {
            name: name.to_string(),
            port,
        }
    }
}
