use crate::{Endpoints, TenantSource};
use chrono::{offset::Utc, DateTime};
use kube::ResourceExt;
use proxy_sync_core::{
    EndpointAddress, EndpointPort, EndpointSubset, EndpointsObject,
    LAST_CHANGE_TRIGGER_TIME_ANNOTATION,
};

#[cfg(test)]
mod tests;

impl TenantSource {
    /// Reduces a Kubernetes `Endpoints` resource to the fields the proxy tracks.
    ///
    /// Only ready addresses are carried over.
    pub fn endpoints_object(&self, endpoints: &Endpoints) -> EndpointsObject {
        let subsets = endpoints
            .subsets
            .iter()
            .flatten()
            .map(|subset| EndpointSubset {
                addresses: subset
                    .addresses
                    .iter()
                    .flatten()
                    .map(|addr| EndpointAddress {
                        ip: addr.ip.clone(),
                        node_name: addr.node_name.clone(),
                    })
                    .collect(),
                ports: subset
                    .ports
                    .iter()
                    .flatten()
                    .map(|port| EndpointPort {
                        name: port.name.clone().unwrap_or_default(),
                        port: port.port,
                    })
                    .collect(),
            })
            .collect();

        EndpointsObject {
            tenant: self.tenant_of(endpoints),
            namespace: endpoints.namespace().unwrap_or_default(),
            name: endpoints.name_any(),
            subsets,
            last_change_trigger_time: endpoints
                .annotations()
                .get(LAST_CHANGE_TRIGGER_TIME_ANNOTATION)
                .and_then(|value| parse_trigger_time(value)),
        }
    }
}

/// Parses an RFC3339 trigger time annotation, with or without fractional seconds.
///
/// Invalid values are logged and ignored.
pub fn parse_trigger_time(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(error) => {
            tracing::debug!(%error, %value, "Ignoring invalid last change trigger time");
            None
        }
    }
}
