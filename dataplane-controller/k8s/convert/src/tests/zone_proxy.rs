use super::*;
use crate::{public_coordinates, settings, PublicCoordinates, Role};
use dataplane_controller_core::EgressRole;
use pretty_assertions::assert_eq;

fn zone_proxy_pod(ns: &str, role: &'static str) -> k8s::Pod {
    let pod = mk_pod(
        ns,
        "zone-proxy-0",
        "10.0.0.50",
        [("app", "zone-proxy")],
        [mk_container("proxy", &[(Some("proxy"), 10001)])],
    );
    annotate(pod, [(role, "enabled")])
}

fn zone_proxy_service(name: &str, type_: &str) -> k8s::Service {
    let mut port = mk_port(10001, None);
    port.node_port = Some(30001);
    with_type(
        mk_service(
            "kuma-system",
            name,
            [("app", "zone-proxy")],
            "10.96.0.100",
            [port],
        ),
        type_,
    )
}

fn load_balanced(hostname: Option<&str>, ip: Option<&str>) -> k8s::Service {
    let mut svc = zone_proxy_service("ingress", k8s::service_type::LOAD_BALANCER);
    svc.status = Some(k8s::ServiceStatus {
        load_balancer: Some(k8s::LoadBalancerStatus {
            ingress: Some(vec![k8s::LoadBalancerIngress {
                hostname: hostname.map(ToString::to_string),
                ip: ip.map(ToString::to_string),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    });
    svc
}

#[tokio::test]
async fn ingress_with_load_balancer() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = zone_proxy_pod("kuma-system", settings::INGRESS);
    let svc = load_balanced(Some("ingress.example.com"), Some("203.0.113.10"));

    let dp = test.convert(&pod, &[svc], &[]).await.unwrap();
    assert_eq!(dp.mesh, None);
    assert_eq!(dp.spec.inbound, vec![]);
    let ingress = dp.spec.ingress.expect("ingress must be set");
    assert_eq!(ingress.public_address.as_deref(), Some("ingress.example.com"));
    assert_eq!(ingress.public_port, Some(10001));
    assert_eq!(ingress.inbound.port, 10001);
    assert_eq!(
        ingress.inbound.tags.get(tags::SERVICE).map(String::as_str),
        Some("ingress_kuma-system_svc_10001")
    );
}

#[tokio::test]
async fn load_balancer_coordinates() {
    let nodes = Vec::<k8s::Node>::new();
    let ip_only = load_balanced(None, Some("203.0.113.10"));
    assert_eq!(
        public_coordinates(&ip_only, &nodes).await.unwrap(),
        PublicCoordinates {
            address: Some("203.0.113.10".to_string()),
            port: Some(10001),
        }
    );

    let pending = zone_proxy_service("ingress", k8s::service_type::LOAD_BALANCER);
    assert_eq!(
        public_coordinates(&pending, &nodes).await.unwrap(),
        PublicCoordinates::default(),
        "an unassigned load balancer is not an error"
    );
}

#[tokio::test]
async fn ingress_with_node_port() {
    let nodes = vec![
        mk_node("node-b", [], &[("ExternalIP", "198.51.100.2")]),
        mk_node(
            "node-a",
            [],
            &[("InternalIP", "192.168.0.1"), ("ExternalIP", "198.51.100.1")],
        ),
    ];
    let test = TestConfig::new(vec![], nodes);
    let pod = zone_proxy_pod("kuma-system", settings::INGRESS);
    let svc = zone_proxy_service("ingress", k8s::service_type::NODE_PORT);

    let dp = test.convert(&pod, &[svc], &[]).await.unwrap();
    let ingress = dp.spec.ingress.expect("ingress must be set");
    assert_eq!(ingress.public_address.as_deref(), Some("198.51.100.1"));
    assert_eq!(ingress.public_port, Some(30001));
}

#[tokio::test]
async fn node_port_falls_back_to_internal_ip() {
    let nodes = vec![mk_node("node-a", [], &[("InternalIP", "192.168.0.1")])];
    let svc = zone_proxy_service("ingress", k8s::service_type::NODE_PORT);
    assert_eq!(
        public_coordinates(&svc, &nodes).await.unwrap(),
        PublicCoordinates {
            address: Some("192.168.0.1".to_string()),
            port: Some(30001),
        }
    );
}

#[tokio::test]
async fn node_port_without_nodes() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = zone_proxy_pod("kuma-system", settings::INGRESS);
    let svc = zone_proxy_service("ingress", k8s::service_type::NODE_PORT);

    let err = test.convert(&pod, &[svc], &[]).await.unwrap_err();
    assert!(matches!(err, ConvertError::EmptyNodeSet), "{err}");
}

#[tokio::test]
async fn node_port_lookup_failure() {
    let svc = zone_proxy_service("ingress", k8s::service_type::NODE_PORT);
    let err = public_coordinates(&svc, &FailingNodes).await.unwrap_err();
    assert!(matches!(err, ConvertError::UpstreamLookupFailure(_)), "{err}");
}

#[tokio::test]
async fn ingress_annotations_override() {
    // Both coordinates are set, so the Nodes are never consulted.
    let test = TestConfig::new(vec![], vec![]);
    let pod = annotate(
        zone_proxy_pod("kuma-system", settings::INGRESS),
        [
            (settings::INGRESS_PUBLIC_ADDRESS, "ingress.example.com"),
            (settings::INGRESS_PUBLIC_PORT, "443"),
        ],
    );
    let svc = zone_proxy_service("ingress", k8s::service_type::NODE_PORT);

    let dp = test.convert(&pod, &[svc], &[]).await.unwrap();
    let ingress = dp.spec.ingress.expect("ingress must be set");
    assert_eq!(ingress.public_address.as_deref(), Some("ingress.example.com"));
    assert_eq!(ingress.public_port, Some(443));

    // A single override is merged with the Service's coordinates.
    let pod = annotate(
        zone_proxy_pod("kuma-system", settings::INGRESS),
        [(settings::INGRESS_PUBLIC_PORT, "443")],
    );
    let svc = load_balanced(None, Some("203.0.113.10"));
    let dp = test.convert(&pod, &[svc], &[]).await.unwrap();
    let ingress = dp.spec.ingress.expect("ingress must be set");
    assert_eq!(ingress.public_address.as_deref(), Some("203.0.113.10"));
    assert_eq!(ingress.public_port, Some(443));
}

#[tokio::test]
async fn ingress_requires_single_service() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = zone_proxy_pod("kuma-system", settings::INGRESS);
    let services = [
        zone_proxy_service("ingress", k8s::service_type::LOAD_BALANCER),
        zone_proxy_service("ingress-internal", k8s::service_type::CLUSTER_IP),
    ];

    let err = test.convert(&pod, &services, &[]).await.unwrap_err();
    assert!(
        matches!(
            err,
            ConvertError::AmbiguousServiceMatch {
                role: Role::Ingress,
                count: 2
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn ingress_requires_single_port() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = zone_proxy_pod("kuma-system", settings::INGRESS);
    let svc = mk_service(
        "kuma-system",
        "ingress",
        [("app", "zone-proxy")],
        "10.96.0.100",
        [mk_port(10001, None), mk_port(10002, None)],
    );

    let err = test.convert(&pod, &[svc], &[]).await.unwrap_err();
    assert!(
        matches!(
            err,
            ConvertError::AmbiguousInbound {
                role: Role::Ingress,
                count: 2
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn ingress_outside_system_namespace() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = zone_proxy_pod("demo", settings::INGRESS);
    let svc = zone_proxy_service("ingress", k8s::service_type::LOAD_BALANCER);

    let err = test.convert(&pod, &[svc], &[]).await.unwrap_err();
    match err {
        ConvertError::RoleNamespaceViolation {
            role,
            namespace,
            system_namespace,
        } => {
            assert_eq!(role, Role::Ingress);
            assert_eq!(namespace, "demo");
            assert_eq!(system_namespace, "kuma-system");
        }
        err => panic!("unexpected error: {err}"),
    }
}

#[tokio::test]
async fn egress() {
    let test = TestConfig::new(vec![], vec![]);
    let pod = annotate(
        zone_proxy_pod("kuma-system", settings::EGRESS),
        [(settings::ENVOY_ADMIN_PORT, "9902")],
    );
    let svc = zone_proxy_service("egress", k8s::service_type::CLUSTER_IP);

    let dp = test.convert(&pod, &[svc], &[]).await.unwrap();
    assert_eq!(dp.mesh, None);
    assert_eq!(dp.spec.egress, Some(EgressRole { port: 10001 }));
    assert_eq!(dp.spec.admin_port, Some(9902));
    assert_eq!(dp.spec.ingress, None);

    let pod = zone_proxy_pod("demo", settings::EGRESS);
    let svc = zone_proxy_service("egress", k8s::service_type::CLUSTER_IP);
    let err = test.convert(&pod, &[svc], &[]).await.unwrap_err();
    assert!(
        matches!(
            err,
            ConvertError::RoleNamespaceViolation {
                role: Role::Egress,
                ..
            }
        ),
        "{err}"
    );
}
