use ahash::AHashSet as HashSet;
use kube::api::{Api, DeleteParams, ListParams};
use proxy_sync_k8s_api::{Client, Node, Pod, ResourceExt};
use std::time::SystemTime;


/// Lists the nodes known to one partition.
#[async_trait::async_trait]
pub trait NodeLister: Send + Sync {
    async fn list_nodes(&self) -> anyhow::Result<HashSet<String>>;
}

/// Lists and deletes the pods subject to collection.
#[async_trait::async_trait]
pub trait PodStore: Send + Sync {
    async fn list_pods(&self) -> anyhow::Result<Vec<PodInfo>>;

    /// Deletes a pod immediately, without a grace period.
    async fn delete_pod(&self, namespace: &str, name: &str) -> anyhow::Result<()>;
}

/// The state of a pod relevant to garbage collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodInfo {
    pub namespace: String,
    pub name: String,
    /// The node the pod is bound to, empty if unscheduled.
    pub node_name: String,
    pub phase: String,
    pub created: Option<SystemTime>,
    pub terminating: bool,
}

/// Lists nodes through a partition's API server.
#[derive(Clone)]
pub struct KubeNodes(Client);

/// Lists and deletes pods through the API server that owns them.
#[derive(Clone)]
pub struct KubePods(Client);

// === impl PodInfo ===

impl PodInfo {
    pub fn id(&self) -> (String, String) {
        (self.namespace.clone(), self.name.clone())
    }

    /// Pods that have completed, successfully or not, and will never run again.
    pub fn is_terminated(&self) -> bool {
        !matches!(self.phase.as_str(), "Pending" | "Running" | "Unknown")
    }
}

impl From<&Pod> for PodInfo {
    fn from(pod: &Pod) -> Self {
        Self {
            namespace: pod.namespace().unwrap_or_default(),
            name: pod.name_any(),
            node_name: pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.clone())
                .unwrap_or_default(),
            phase: pod
                .status
                .as_ref()
                .and_then(|status| status.phase.clone())
                .unwrap_or_default(),
            created: pod
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|time| SystemTime::from(time.0)),
            terminating: pod.metadata.deletion_timestamp.is_some(),
        }
    }
}

// === impl KubeNodes ===

impl KubeNodes {
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

#[async_trait::async_trait]
impl NodeLister for KubeNodes {
    async fn list_nodes(&self) -> anyhow::Result<HashSet<String>> {
        let nodes = Api::<Node>::all(self.0.clone())
            .list(&ListParams::default())
            .await?;
        Ok(nodes.items.iter().map(|node| node.name_any()).collect())
    }
}

// === impl KubePods ===

impl KubePods {
    pub fn new(client: Client) -> Self {
        Self(client)
    }
}

#[async_trait::async_trait]
impl PodStore for KubePods {
    async fn list_pods(&self) -> anyhow::Result<Vec<PodInfo>> {
        let pods = Api::<Pod>::all(self.0.clone())
            .list(&ListParams::default())
            .await?;
        Ok(pods.items.iter().map(PodInfo::from).collect())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> anyhow::Result<()> {
        let params = DeleteParams {
            grace_period_seconds: Some(0),
            ..DeleteParams::default()
        };
        match Api::<Pod>::namespaced(self.0.clone(), namespace)
            .delete(name, &params)
            .await
        {
            Ok(_) => Ok(()),
            // The pod is already gone.
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
