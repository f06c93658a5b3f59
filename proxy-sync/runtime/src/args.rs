use crate::{
    backend::TracingBackend,
    core::{IpFamilyFilter, PartitionId, ProxyMode},
    gc::{KubeNodes, KubePods, PodGc},
    index::{ChangeTracker, Metrics, PartitionIndex, SharedTracker, Syncer},
    k8s::{Client, Endpoints, TenantSource},
    partitions, probe,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use kube::{
    runtime::{watcher, WatchStreamExt},
    Api,
};
use prometheus_client::registry::Registry;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::{info, info_span, Instrument};


#[derive(Debug, Parser)]
#[clap(name = "proxy-sync", about = "Syncs service endpoints from API server partitions")]
pub struct Args {
    #[clap(long, default_value = "proxy_sync=info,warn", env = "PROXY_SYNC_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The name of the node this proxy runs on.
    #[clap(long, env = "HOSTNAME")]
    hostname_override: String,

    /// Restricts endpoints to a single IP family.
    #[clap(long, default_value = "any")]
    ip_family: IpFamilyFilter,

    /// The preferred proxy mode. Falls back to a simpler mode when the host does not support it.
    #[clap(long)]
    proxy_mode: Option<ProxyMode>,

    /// Kubeconfigs of the tenant partitions serving endpoints.
    ///
    /// When empty, endpoints are watched through the primary client.
    #[clap(long, value_delimiter = ',')]
    tenant_partition_kubeconfigs: Vec<PathBuf>,

    /// Kubeconfigs of the resource partitions that register nodes, in addition to the primary
    /// client.
    #[clap(long, value_delimiter = ',')]
    resource_partition_kubeconfigs: Vec<PathBuf>,

    #[clap(long, default_value = "30000")]
    sync_period_ms: u64,

    #[clap(long, default_value = "1000")]
    min_sync_period_ms: u64,

    /// The label that carries the tenant owning an endpoints object.
    #[clap(long, default_value = "tenant")]
    tenant_label: String,

    /// The tenant of endpoints objects without a tenant label.
    #[clap(long, default_value = crate::core::DEFAULT_TENANT)]
    default_tenant: String,

    /// Disables garbage collection of orphaned and terminated pods.
    #[clap(long)]
    pod_gc_disabled: bool,

    /// The number of terminated pods retained before the oldest are deleted. Zero disables
    /// terminated pod collection.
    #[clap(long, default_value = "12500")]
    terminated_pod_gc_threshold: usize,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            hostname_override,
            ip_family,
            proxy_mode,
            tenant_partition_kubeconfigs,
            resource_partition_kubeconfigs,
            sync_period_ms,
            min_sync_period_ms,
            tenant_label,
            default_tenant,
            pod_gc_disabled,
            terminated_pod_gc_threshold,
        } = self;

        let hostname = hostname(&hostname_override)?;

        let mut prom = <Registry>::default();
        let metrics = Metrics::register(prom.sub_registry_with_prefix("proxy_sync"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let mode = ProxyMode::select(proxy_mode, probe::capabilities());
        info!(%mode, %hostname, ?ip_family, "Starting endpoints sync");

        let tracker = ChangeTracker::shared(hostname, ip_family, metrics.clone());
        let tenants = TenantSource::new(tenant_label, default_tenant);

        // Spawn endpoints watches, one per partition.
        let tenant_clients = partitions::clients(&tenant_partition_kubeconfigs).await?;
        if tenant_clients.is_empty() {
            let endpoints = runtime.watch_all::<Endpoints>(watcher::Config::default());
            let index = PartitionIndex::shared(PartitionId(0), tenants, tracker.clone());
            tokio::spawn(
                kubert::index::namespaced(index, endpoints)
                    .instrument(info_span!("endpoints", partition = 0)),
            );
        } else {
            for (i, client) in tenant_clients.into_iter().enumerate() {
                spawn_partition(
                    PartitionId(i as u32),
                    client,
                    tenants.clone(),
                    tracker.clone(),
                );
            }
        }

        // Spawn the sync loop.
        let (syncer, _snapshots) = Syncer::new(
            tracker,
            TracingBackend::new(mode),
            Duration::from_millis(sync_period_ms),
            Duration::from_millis(min_sync_period_ms),
            metrics,
        );
        tokio::spawn(
            syncer
                .run(runtime.shutdown_handle())
                .instrument(info_span!("sync")),
        );

        if pod_gc_disabled {
            info!("Pod garbage collection disabled");
        } else {
            let resource_clients = partitions::clients(&resource_partition_kubeconfigs).await?;
            let nodes = Some(runtime.client())
                .into_iter()
                .chain(resource_clients)
                .map(KubeNodes::new)
                .collect();
            let gc = PodGc::new(
                nodes,
                KubePods::new(runtime.client()),
                terminated_pod_gc_threshold,
            );
            tokio::spawn(
                gc.run(runtime.shutdown_handle())
                    .instrument(info_span!("pod_gc")),
            );
        }

        // Block on the shutdown signal. Once it fires, wait for the sync loop and the collector to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

/// Watches a tenant partition's endpoints through its own client.
fn spawn_partition(
    partition: PartitionId,
    client: Client,
    tenants: TenantSource,
    tracker: SharedTracker,
) {
    let endpoints = watcher(Api::<Endpoints>::all(client), watcher::Config::default())
        .default_backoff()
        .filter_map(move |event| async move {
            match event {
                Ok(event) => Some(event),
                Err(error) => {
                    tracing::info!(%partition, %error, "Endpoints watch failed");
                    None
                }
            }
        })
        .boxed();
    let index = PartitionIndex::shared(partition, tenants, tracker);
    tokio::spawn(
        kubert::index::namespaced(index, endpoints)
            .instrument(info_span!("endpoints", %partition)),
    );
}

/// Normalizes the name this node is registered with.
fn hostname(name: &str) -> Result<String> {
    let hostname = name.trim().to_lowercase();
    if hostname.is_empty() {
        bail!("hostname must not be empty");
    }
    Ok(hostname)
}
