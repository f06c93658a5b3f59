use futures::future;
use proxy_sync_core::PartitionId;
use std::future::Future;

#[cfg(test)]
mod tests;

/// Decides whether the results gathered from a set of partitions may be used.
///
/// The policy is chosen per call site. Orphaned pod collection uses [`FailurePolicy::AbortOnAll`]
/// since a node missing from one partition may be registered with another. Queries whose
/// partial results would be wrong rather than incomplete use [`FailurePolicy::AbortOnAny`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any failed partition invalidates the gathered results.
    AbortOnAny,
    /// The gathered results are usable as long as at least one partition answered.
    AbortOnAll,
}

#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error("no partitions to query")]
    NoPartitions,

    #[error("{failed} of {total} partitions failed")]
    PartitionsFailed { failed: usize, total: usize },
}

/// The outcome of querying every partition.
#[derive(Debug)]
pub struct Gathered<T> {
    pub results: Vec<(PartitionId, T)>,
    pub errors: Vec<(PartitionId, anyhow::Error)>,
}

/// Issues one query per partition concurrently and gathers every result.
///
/// Partitions are identified by their position in `partitions`.
pub async fn scatter_gather<'p, P, T, F, Fut>(partitions: &'p [P], query: F) -> Gathered<T>
where
    F: Fn(PartitionId, &'p P) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let queries = partitions
        .iter()
        .enumerate()
        .map(|(i, partition)| {
            let id = PartitionId(i as u32);
            let query = query(id, partition);
            async move { (id, query.await) }
        })
        .collect::<Vec<_>>();

    let mut gathered = Gathered {
        results: Vec::with_capacity(partitions.len()),
        errors: Vec::new(),
    };
    for (id, result) in future::join_all(queries).await {
        match result {
            Ok(value) => gathered.results.push((id, value)),
            Err(error) => {
                tracing::debug!(partition = %id, %error, "Partition query failed");
                gathered.errors.push((id, error));
            }
        }
    }
    gathered
}

// === impl Gathered ===

impl<T> Gathered<T> {
    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    /// Applies a failure policy, returning the results from the partitions that answered.
    pub fn check(self, policy: FailurePolicy) -> Result<Vec<(PartitionId, T)>, GatherError> {
        let total = self.total();
        if total == 0 {
            return Err(GatherError::NoPartitions);
        }

        let failed = self.errors.len();
        let abort = match policy {
            FailurePolicy::AbortOnAny => failed > 0,
            FailurePolicy::AbortOnAll => failed == total,
        };
        if abort {
            return Err(GatherError::PartitionsFailed { failed, total });
        }

        for (partition, error) in &self.errors {
            tracing::warn!(%partition, %error, "Proceeding without partition");
        }
        Ok(self.results)
    }
}
