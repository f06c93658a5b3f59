use crate::{
    gather::{scatter_gather, FailurePolicy},
    pods::{NodeLister, PodInfo, PodStore},
};
use ahash::AHashSet as HashSet;
use tokio::time::{self, Duration, MissedTickBehavior};


/// How often pods are collected.
pub const GC_PERIOD: Duration = Duration::from_secs(20);

/// Deletes pods that will never be cleaned up by a kubelet.
///
/// Nodes may be registered with any partition, so a pod is only considered orphaned once no
/// reachable partition knows its node.
pub struct PodGc<N, P> {
    nodes: Vec<N>,
    pods: P,
    terminated_threshold: usize,
}

/// The namespace and name of each pod deleted by a collection phase.
type Deleted = HashSet<(String, String)>;

/// Counts of the pods deleted by a collection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    pub terminated: usize,
    pub orphaned: usize,
    pub unscheduled_terminating: usize,
}

// === impl PodGc ===

impl<N: NodeLister, P: PodStore> PodGc<N, P> {
    /// Creates a collector over the node partitions, in partition order.
    ///
    /// Terminated pods are collected once there are more than `terminated_threshold` of them.
    /// A threshold of zero disables terminated pod collection.
    pub fn new(nodes: Vec<N>, pods: P, terminated_threshold: usize) -> Self {
        Self {
            nodes,
            pods,
            terminated_threshold,
        }
    }

    /// Runs a single collection.
    pub async fn collect(&self) -> anyhow::Result<Collected> {
        let mut pods = self.pods.list_pods().await?;
        let total = pods.len();

        let terminated = self.collect_terminated(&pods).await;
        pods.retain(|pod| !terminated.contains(&pod.id()));
        let orphaned = self.collect_orphaned(&pods).await;
        pods.retain(|pod| !orphaned.contains(&pod.id()));
        let unscheduled_terminating = self.collect_unscheduled_terminating(&pods).await;

        let collected = Collected {
            terminated: terminated.len(),
            orphaned: orphaned.len(),
            unscheduled_terminating: unscheduled_terminating.len(),
        };
        tracing::debug!(?collected, pods = total, "Collected pods");
        Ok(collected)
    }

    /// Collects periodically until shutdown is signaled.
    pub async fn run(self, drain: drain::Watch) {
        tokio::pin! {
            let shutdown = drain.signaled();
        }

        let mut interval = time::interval(GC_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _release = (&mut shutdown) => {
                    tracing::debug!("Shutting down");
                    return;
                }
                _ = interval.tick() => {}
            }

            if let Err(error) = self.collect().await {
                tracing::warn!(%error, "Failed to collect pods");
            }
        }
    }

    async fn collect_terminated(&self, pods: &[PodInfo]) -> Deleted {
        if self.terminated_threshold == 0 {
            return Deleted::new();
        }

        let mut terminated = pods
            .iter()
            .filter(|pod| pod.is_terminated())
            .collect::<Vec<_>>();
        let excess = terminated.len().saturating_sub(self.terminated_threshold);
        if excess == 0 {
            return Deleted::new();
        }
        tracing::info!(
            terminated = terminated.len(),
            threshold = self.terminated_threshold,
            "Collecting terminated pods"
        );

        terminated.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then_with(|| a.name.cmp(&b.name))
        });
        terminated.truncate(excess);
        self.delete_all(terminated).await
    }

    async fn collect_orphaned(&self, pods: &[PodInfo]) -> Deleted {
        let gathered = scatter_gather(&self.nodes, |_, nodes| nodes.list_nodes()).await;
        let live = match gathered.check(FailurePolicy::AbortOnAll) {
            Ok(results) => results
                .into_iter()
                .flat_map(|(_, nodes)| nodes)
                .collect::<HashSet<_>>(),
            Err(error) => {
                tracing::error!(%error, "Skipping orphaned pod collection");
                return Deleted::new();
            }
        };

        let orphaned = pods
            .iter()
            .filter(|pod| !pod.node_name.is_empty() && !live.contains(&pod.node_name))
            .collect::<Vec<_>>();
        self.delete_all(orphaned).await
    }

    async fn collect_unscheduled_terminating(&self, pods: &[PodInfo]) -> Deleted {
        let unscheduled = pods
            .iter()
            .filter(|pod| pod.terminating && pod.node_name.is_empty())
            .collect::<Vec<_>>();
        self.delete_all(unscheduled).await
    }

    async fn delete_all(&self, pods: Vec<&PodInfo>) -> Deleted {
        let mut deleted = Deleted::new();
        for pod in pods {
            match self.pods.delete_pod(&pod.namespace, &pod.name).await {
                Ok(()) => {
                    tracing::info!(
                        namespace = %pod.namespace,
                        name = %pod.name,
                        node = %pod.node_name,
                        "Deleted pod"
                    );
                    deleted.insert(pod.id());
                }
                Err(error) => {
                    tracing::warn!(
                        namespace = %pod.namespace,
                        name = %pod.name,
                        %error,
                        "Failed to delete pod"
                    );
                }
            }
        }
        deleted
    }
}
