use crate::k8s::Client;
use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::PathBuf;

/// Builds a client for each partition's kubeconfig, in partition order.
pub(crate) async fn clients(kubeconfigs: &[PathBuf]) -> Result<Vec<Client>> {
    let mut clients = Vec::with_capacity(kubeconfigs.len());
    for path in kubeconfigs {
        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
        let options = KubeConfigOptions::default();
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .with_context(|| format!("failed to load kubeconfig {}", path.display()))?;
        let client = Client::try_from(config)
            .with_context(|| format!("failed to build client for {}", path.display()))?;
        tracing::debug!(kubeconfig = %path.display(), "Loaded partition client");
        clients.push(client);
    }
    Ok(clients)
}
