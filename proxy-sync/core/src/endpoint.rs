use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use chrono::{offset::Utc, DateTime};
use std::fmt;

/// A service, scoped by tenant and namespace.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NamespacedName {
    pub tenant: String,
    pub namespace: String,
    pub name: String,
}

/// One named (or unnamed) port of a service.
///
/// An empty `port` denotes the unnamed port and never matches a named port.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServicePortName {
    pub tenant: String,
    pub namespace: String,
    pub name: String,
    pub port: String,
}

/// A concrete backend address for a service port.
///
/// `addr` is formatted as `ip:port`, with IPv6 literals bracketed.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: String,
    pub is_local: bool,
}

/// An endpoint that was removed from a service port.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub endpoint: String,
    pub service_port_name: ServicePortName,
}

/// The outcome of applying a batch of pending changes to the endpoints map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateResult {
    /// Endpoints that were removed and are not present under the same service port anymore.
    /// Backends use these to flush connection tracking state.
    pub stale_endpoints: Vec<ServiceEndpoint>,

    /// Service ports that gained their first endpoints in this sync.
    pub stale_service_names: HashSet<ServicePortName>,

    /// The number of distinct local endpoint IPs per service. Services without local
    /// endpoints are omitted.
    pub hc_endpoints_local_ip_size: HashMap<NamespacedName, usize>,

    /// Trigger times collected from the objects that changed in this sync.
    pub last_change_trigger_times: Vec<DateTime<Utc>>,
}

// === impl NamespacedName ===

impl NamespacedName {
    pub fn new(tenant: impl ToString, namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            tenant: tenant.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.namespace, self.name)
    }
}

// === impl ServicePortName ===

impl ServicePortName {
    pub fn new(
        tenant: impl ToString,
        namespace: impl ToString,
        name: impl ToString,
        port: impl ToString,
    ) -> Self {
        Self {
            tenant: tenant.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            port: port.to_string(),
        }
    }

    /// Returns the service this port belongs to.
    pub fn service(&self) -> NamespacedName {
        NamespacedName {
            tenant: self.tenant.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ServicePortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.namespace, self.name)?;
        if !self.port.is_empty() {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

// === impl Endpoint ===

impl Endpoint {
    pub fn new(addr: impl ToString, is_local: bool) -> Self {
        Self {
            addr: addr.to_string(),
            is_local,
        }
    }

    /// Formats an endpoint address from an IP literal and a port.
    pub fn from_ip_port(ip: &str, port: u16, is_local: bool) -> Self {
        let addr = if ip.contains(':') {
            format!("[{ip}]:{port}")
        } else {
            format!("{ip}:{port}")
        };
        Self { addr, is_local }
    }

    /// Returns the IP part of the address, without brackets.
    pub fn ip(&self) -> &str {
        match self.addr.rsplit_once(':') {
            Some((host, _)) => host.trim_start_matches('[').trim_end_matches(']'),
            None => &self.addr,
        }
    }

    pub fn port(&self) -> Option<u16> {
        let (_, port) = self.addr.rsplit_once(':')?;
        port.parse().ok()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

// === impl ServiceEndpoint ===

impl ServiceEndpoint {
    pub fn new(endpoint: impl ToString, service_port_name: ServicePortName) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            service_port_name,
        }
    }
}

// === impl UpdateResult ===

impl UpdateResult {
    pub fn is_empty(&self) -> bool {
        self.stale_endpoints.is_empty()
            && self.stale_service_names.is_empty()
            && self.last_change_trigger_times.is_empty()
    }
}
