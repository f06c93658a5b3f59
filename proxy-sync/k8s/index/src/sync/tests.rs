use super::*;
use crate::tests::*;
use tokio::sync::mpsc;

const SYNC_PERIOD: Duration = Duration::from_secs(30);
const MIN_SYNC_PERIOD: Duration = Duration::from_secs(1);

struct MockBackend {
    tx: mpsc::UnboundedSender<UpdateResult>,
    fail: bool,
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    async fn sync(
        &self,
        _snapshot: Arc<EndpointsSnapshot>,
        result: &UpdateResult,
    ) -> anyhow::Result<()> {
        let _ = self.tx.send(result.clone());
        if self.fail {
            anyhow::bail!("backend unavailable");
        }
        Ok(())
    }
}

fn mk_syncer(
    fail: bool,
) -> (
    Syncer<MockBackend>,
    SharedTracker,
    watch::Receiver<Arc<EndpointsSnapshot>>,
    mpsc::UnboundedReceiver<UpdateResult>,
) {
    let tracker = Arc::new(mk_tracker());
    let (tx, results) = mpsc::unbounded_channel();
    let (syncer, snapshots) = Syncer::new(
        tracker.clone(),
        MockBackend { tx, fail },
        SYNC_PERIOD,
        MIN_SYNC_PERIOD,
        Metrics::default(),
    );
    (syncer, tracker, snapshots, results)
}

fn add_ep1(tracker: &SharedTracker) {
    let obj = mk_endpoints(
        "ns1",
        "ep1",
        vec![subset(vec![local("1.1.1.1")], vec![port("", 11)])],
    );
    tracker.update(None, Some(&obj), PARTITION);
}

#[tokio::test]
async fn sync_publishes_a_snapshot() {
    init_tracing();
    let (mut syncer, tracker, snapshots, mut results) = mk_syncer(false);

    add_ep1(&tracker);
    let result = syncer.sync().await;
    assert!(result.stale_service_names.contains(&spn("ns1", "ep1", "")));
    assert_eq!(results.recv().await, Some(result));

    let expected = mk_map([(spn("ns1", "ep1", ""), vec![ep("1.1.1.1:11", true)])]);
    assert_eq!(syncer.endpoints(), &expected);

    let snapshot = snapshots.borrow().clone();
    assert_eq!(snapshot.endpoints, expected);
    assert_eq!(
        snapshot.hc_endpoints_local_ip_size.get(&nsn("ns1", "ep1")),
        Some(&1)
    );
}

#[tokio::test]
async fn sync_without_changes_is_empty() {
    init_tracing();
    let (mut syncer, _tracker, _snapshots, _results) = mk_syncer(false);

    let result = syncer.sync().await;
    assert!(result.is_empty());
    assert!(syncer.endpoints().is_empty());
}

#[tokio::test(start_paused = true)]
async fn run_syncs_initially_and_periodically() {
    init_tracing();
    let (syncer, _tracker, _snapshots, mut results) = mk_syncer(false);
    let (signal, drain) = drain::channel();
    let task = tokio::spawn(syncer.run(drain));

    let start = Instant::now();
    let initial = results.recv().await.expect("initial sync");
    assert!(initial.is_empty());
    assert!(start.elapsed() < MIN_SYNC_PERIOD);

    results.recv().await.expect("periodic sync");
    assert!(start.elapsed() >= SYNC_PERIOD);

    signal.drain().await;
    task.await.expect("sync loop must not panic");
}

#[tokio::test(start_paused = true)]
async fn run_syncs_on_change_after_the_minimum_period() {
    init_tracing();
    let (syncer, tracker, _snapshots, mut results) = mk_syncer(false);
    let (signal, drain) = drain::channel();
    let task = tokio::spawn(syncer.run(drain));

    results.recv().await.expect("initial sync");
    let start = Instant::now();

    add_ep1(&tracker);
    let result = results.recv().await.expect("triggered sync");
    assert!(result.stale_service_names.contains(&spn("ns1", "ep1", "")));
    assert!(start.elapsed() >= MIN_SYNC_PERIOD);
    assert!(start.elapsed() < SYNC_PERIOD);

    signal.drain().await;
    task.await.expect("sync loop must not panic");
}

#[tokio::test(start_paused = true)]
async fn changes_are_batched_while_rate_limited() {
    init_tracing();
    let (syncer, tracker, _snapshots, mut results) = mk_syncer(false);
    let (signal, drain) = drain::channel();
    let task = tokio::spawn(syncer.run(drain));

    results.recv().await.expect("initial sync");

    add_ep1(&tracker);
    let obj = mk_endpoints(
        "ns1",
        "ep2",
        vec![subset(vec![remote("1.1.1.2")], vec![port("", 12)])],
    );
    tracker.update(None, Some(&obj), PARTITION);

    let result = results.recv().await.expect("triggered sync");
    assert_eq!(result.stale_service_names.len(), 2);

    signal.drain().await;
    task.await.expect("sync loop must not panic");
}

#[tokio::test(start_paused = true)]
async fn backend_errors_do_not_stop_the_loop() {
    init_tracing();
    let (syncer, tracker, snapshots, mut results) = mk_syncer(true);
    let (signal, drain) = drain::channel();
    let task = tokio::spawn(syncer.run(drain));

    results.recv().await.expect("initial sync");

    add_ep1(&tracker);
    results.recv().await.expect("triggered sync");
    assert_eq!(snapshots.borrow().endpoints.len(), 1);

    signal.drain().await;
    task.await.expect("sync loop must not panic");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    init_tracing();
    let (syncer, tracker, _snapshots, mut results) = mk_syncer(false);
    let (signal, drain) = drain::channel();
    let task = tokio::spawn(syncer.run(drain));

    results.recv().await.expect("initial sync");
    signal.drain().await;
    task.await.expect("sync loop must not panic");

    add_ep1(&tracker);
    assert!(results.recv().await.is_none());
}
