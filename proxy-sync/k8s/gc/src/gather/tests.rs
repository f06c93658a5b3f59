use super::*;

async fn query(id: PartitionId, ok: &bool) -> anyhow::Result<u32> {
    if *ok {
        Ok(id.0 * 10)
    } else {
        anyhow::bail!("partition {id} unreachable")
    }
}

#[tokio::test]
async fn gathers_results_in_partition_order() {
    let gathered = scatter_gather(&[true, false, true], query).await;
    assert_eq!(gathered.total(), 3);
    assert_eq!(
        gathered.results,
        vec![(PartitionId(0), 0), (PartitionId(2), 20)]
    );
    assert_eq!(
        gathered
            .errors
            .iter()
            .map(|(id, _)| *id)
            .collect::<Vec<_>>(),
        vec![PartitionId(1)]
    );
}

#[tokio::test]
async fn abort_on_all_tolerates_partial_failure() {
    let gathered = scatter_gather(&[true, false], query).await;
    let results = gathered
        .check(FailurePolicy::AbortOnAll)
        .expect("one partition answered");
    assert_eq!(results, vec![(PartitionId(0), 0)]);
}

#[tokio::test]
async fn abort_on_all_fails_when_every_partition_fails() {
    let gathered = scatter_gather(&[false, false], query).await;
    assert!(matches!(
        gathered.check(FailurePolicy::AbortOnAll),
        Err(GatherError::PartitionsFailed {
            failed: 2,
            total: 2
        })
    ));
}

#[tokio::test]
async fn abort_on_any_fails_on_partial_failure() {
    let gathered = scatter_gather(&[true, false, true], query).await;
    assert!(matches!(
        gathered.check(FailurePolicy::AbortOnAny),
        Err(GatherError::PartitionsFailed {
            failed: 1,
            total: 3
        })
    ));

    let gathered = scatter_gather(&[true, true], query).await;
    assert_eq!(
        gathered.check(FailurePolicy::AbortOnAny).unwrap().len(),
        2
    );
}

#[tokio::test]
async fn no_partitions_is_an_error() {
    let gathered = scatter_gather(&[] as &[bool], query).await;
    assert!(matches!(
        gathered.check(FailurePolicy::AbortOnAll),
        Err(GatherError::NoPartitions)
    ));
}
