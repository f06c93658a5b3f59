use crate::core::Capabilities;
use std::path::Path;

#[cfg(test)]
mod tests;

/// Present when the IPVS kernel module is loaded.
const IPVS_PROC: &str = "proc/net/ip_vs";

/// Present when the kernel supports routing to localhost, which iptables rules rely on.
const ROUTE_LOCALNET: &str = "proc/sys/net/ipv4/conf/all/route_localnet";

/// Probes the host for the packet-filter backends it supports.
pub fn capabilities() -> Capabilities {
    capabilities_at(Path::new("/"))
}

fn capabilities_at(root: &Path) -> Capabilities {
    let caps = Capabilities {
        iptables: root.join(ROUTE_LOCALNET).exists(),
        ipvs: root.join(IPVS_PROC).exists(),
    };
    tracing::debug!(?caps, root = %root.display(), "Probed capabilities");
    caps
}
