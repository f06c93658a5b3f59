use super::*;
use crate::core::{Endpoint, ServiceEndpoint, ServicePortName};
use tracing::Level;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .try_init()
        .ok();
}

#[tokio::test]
async fn syncs_empty_results() {
    init_tracing();
    let backend = TracingBackend::new(ProxyMode::IpTables);
    backend
        .sync(Arc::default(), &UpdateResult::default())
        .await
        .expect("sync must succeed");
}

#[tokio::test]
async fn syncs_stale_endpoints_and_services() {
    init_tracing();
    let backend = TracingBackend::new(ProxyMode::Ipvs);
    assert_eq!(backend.mode(), ProxyMode::Ipvs);

    let name = ServicePortName::new("te", "ns1", "ep1", "p");
    let snapshot = EndpointsSnapshot {
        endpoints: Some((name.clone(), vec![Endpoint::new("1.1.1.2:11", false)]))
            .into_iter()
            .collect(),
        ..Default::default()
    };
    let result = UpdateResult {
        stale_endpoints: vec![ServiceEndpoint::new("1.1.1.1:11", name.clone())],
        stale_service_names: Some(name).into_iter().collect(),
        ..Default::default()
    };
    backend
        .sync(Arc::new(snapshot), &result)
        .await
        .expect("sync must succeed");
}
