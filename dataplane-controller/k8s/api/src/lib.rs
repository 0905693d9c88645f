#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod labels;

pub use self::{
    annotations::{Annotations, InvalidAnnotation},
    labels::{services_selecting, Labels, Selector},
};
pub use k8s_openapi::{
    api::core::v1::{
        Container, ContainerPort, ContainerStatus, HTTPGetAction, LoadBalancerIngress,
        LoadBalancerStatus, Namespace, Node, NodeAddress, NodeStatus, Pod, PodSpec, PodStatus,
        Probe, Service, ServicePort, ServiceSpec, ServiceStatus,
    },
    apimachinery::pkg::{
        apis::meta::v1::{ObjectMeta, OwnerReference},
        util::intstr::IntOrString,
    },
};
pub use kube::ResourceExt;

/// Service types, as set in `spec.type`.
pub mod service_type {
    pub const CLUSTER_IP: &str = "ClusterIP";
    pub const NODE_PORT: &str = "NodePort";
    pub const LOAD_BALANCER: &str = "LoadBalancer";
    pub const EXTERNAL_NAME: &str = "ExternalName";
}

/// The `spec.clusterIP` value of a headless Service.
pub const CLUSTER_IP_NONE: &str = "None";

/// Returns the Service's type, defaulting to `ClusterIP` as the API server does.
pub fn service_type(svc: &Service) -> &str {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.type_.as_deref())
        .unwrap_or(service_type::CLUSTER_IP)
}

/// Returns true if the Service explicitly has no cluster IP.
pub fn is_headless(svc: &Service) -> bool {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.as_deref())
        .is_some_and(|ip| ip == CLUSTER_IP_NONE)
}

/// Returns the Service's assigned cluster IP, if any. Headless Services have none.
pub fn cluster_ip(svc: &Service) -> Option<&str> {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.as_deref())
        .filter(|ip| !ip.is_empty() && *ip != CLUSTER_IP_NONE)
}

pub fn service_ports(svc: &Service) -> &[ServicePort] {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or_default()
}

/// Returns true if the port's protocol is TCP, which is the default when unset.
pub fn is_tcp(protocol: Option<&str>) -> bool {
    protocol.map_or(true, |p| p.eq_ignore_ascii_case("TCP"))
}
