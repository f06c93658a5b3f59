use super::*;
use crate::{api::core::v1, ObjectMeta};
use chrono::TimeZone;
use maplit::btreemap;

fn mk_endpoints(labels: Option<(&str, &str)>, trigger: Option<&str>) -> Endpoints {
    Endpoints {
        metadata: ObjectMeta {
            namespace: Some("ns1".to_string()),
            name: Some("ep1".to_string()),
            labels: labels.map(|(k, v)| btreemap! { k.to_string() => v.to_string() }),
            annotations: trigger.map(|t| {
                btreemap! { LAST_CHANGE_TRIGGER_TIME_ANNOTATION.to_string() => t.to_string() }
            }),
            ..Default::default()
        },
        subsets: Some(vec![v1::EndpointSubset {
            addresses: Some(vec![
                v1::EndpointAddress {
                    ip: "1.1.1.1".to_string(),
                    node_name: Some("host".to_string()),
                    ..Default::default()
                },
                v1::EndpointAddress {
                    ip: "1.1.1.2".to_string(),
                    ..Default::default()
                },
            ]),
            not_ready_addresses: Some(vec![v1::EndpointAddress {
                ip: "1.1.1.3".to_string(),
                ..Default::default()
            }]),
            ports: Some(vec![
                v1::EndpointPort {
                    name: Some("p11".to_string()),
                    port: 11,
                    ..Default::default()
                },
                v1::EndpointPort {
                    port: 12,
                    ..Default::default()
                },
            ]),
        }]),
    }
}

#[test]
fn converts_ready_addresses_and_ports() {
    let obj = TenantSource::default().endpoints_object(&mk_endpoints(None, None));
    assert_eq!(
        obj,
        EndpointsObject {
            tenant: "system".to_string(),
            namespace: "ns1".to_string(),
            name: "ep1".to_string(),
            subsets: vec![EndpointSubset {
                addresses: vec![
                    EndpointAddress::on_node("1.1.1.1", "host"),
                    EndpointAddress::new("1.1.1.2"),
                ],
                ports: vec![EndpointPort::new("p11", 11), EndpointPort::new("", 12)],
            }],
            last_change_trigger_time: None,
        }
    );
}

#[test]
fn tenant_from_label() {
    let tenants = TenantSource::new("example.com/tenant", "system");

    let obj = tenants.endpoints_object(&mk_endpoints(Some(("example.com/tenant", "t1")), None));
    assert_eq!(obj.tenant, "t1");

    let obj = tenants.endpoints_object(&mk_endpoints(Some(("example.com/tenant", "")), None));
    assert_eq!(obj.tenant, "system", "an empty label selects the default");

    let obj = tenants.endpoints_object(&mk_endpoints(Some(("other", "t2")), None));
    assert_eq!(obj.tenant, "system");
}

#[test]
fn trigger_time_annotation() {
    let tenants = TenantSource::default();

    let obj = tenants.endpoints_object(&mk_endpoints(None, Some("2018-01-01T00:00:00Z")));
    assert_eq!(
        obj.last_change_trigger_time,
        Some(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap())
    );

    let obj =
        tenants.endpoints_object(&mk_endpoints(None, Some("2018-01-01T00:00:01.500000000Z")));
    assert_eq!(
        obj.last_change_trigger_time,
        Some(
            Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 1).unwrap()
                + chrono::Duration::milliseconds(500)
        )
    );

    let obj = tenants.endpoints_object(&mk_endpoints(None, Some("yesterday")));
    assert_eq!(obj.last_change_trigger_time, None);
}
