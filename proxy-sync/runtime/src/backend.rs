use crate::{
    core::{ProxyMode, UpdateResult},
    index::{Backend, EndpointsSnapshot},
};
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Reports each sync's diff through `tracing` for the selected proxy mode.
#[derive(Clone, Debug)]
pub struct TracingBackend {
    mode: ProxyMode,
}

// === impl TracingBackend ===

impl TracingBackend {
    pub fn new(mode: ProxyMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ProxyMode {
        self.mode
    }
}

#[async_trait::async_trait]
impl Backend for TracingBackend {
    async fn sync(
        &self,
        snapshot: Arc<EndpointsSnapshot>,
        result: &UpdateResult,
    ) -> anyhow::Result<()> {
        if result.is_empty() {
            tracing::trace!(mode = %self.mode, "No endpoints changes");
            return Ok(());
        }

        for stale in &result.stale_endpoints {
            tracing::debug!(
                mode = %self.mode,
                service = %stale.service_port_name,
                endpoint = %stale.endpoint,
                "Flushing stale endpoint"
            );
        }
        for service in &result.stale_service_names {
            tracing::debug!(
                mode = %self.mode,
                %service,
                endpoints = snapshot.endpoints.get(service).map_or(0, <[_]>::len),
                "Reprogramming service"
            );
        }
        tracing::info!(
            mode = %self.mode,
            services = snapshot.endpoints.len(),
            stale_endpoints = result.stale_endpoints.len(),
            stale_services = result.stale_service_names.len(),
            local_services = snapshot.hc_endpoints_local_ip_size.len(),
            "Synced proxy rules"
        );
        Ok(())
    }
}
