use crate::Tags;
use serde::{Deserialize, Serialize};

/// The inbound port of a workload that no Service selects.
///
/// No real listener can bind port 0, so this can never collide with a workload port, and the
/// matching [`ServiceIdentity`](crate::ServiceIdentity) carries no port at all.
pub const SERVICELESS_PORT: u16 = 0;

/// A dataplane descriptor, as persisted for one workload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataplaneResource {
    pub name: String,
    pub namespace: String,

    /// Zone ingress and egress proxies serve every mesh and are not bound to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,

    pub spec: Dataplane,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataplane {
    pub address: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbound: Vec<Inbound>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbound: Vec<Outbound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Gateway>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress: Option<EgressRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_proxying: Option<TransparentProxying>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probes: Option<Probes>,
}

/// A port on which a workload accepts mesh traffic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub port: u16,

    /// Overrides the dataplane's address for this listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub tags: Tags,

    /// Unset when no readiness has been observed yet, which is distinct from not ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub ready: bool,
}

/// A remote mesh service that a workload may reach.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub address: String,
    pub port: u16,
    pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    #[serde(rename = "type")]
    pub kind: GatewayType,
    pub tags: Tags,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GatewayType {
    /// The workload runs a gateway configured by the control plane.
    Builtin,

    /// The workload runs a third-party gateway with a sidecar.
    Delegated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRole {
    /// Unset until the ingress Service has been assigned an external address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,

    pub inbound: Inbound,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressRole {
    pub port: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransparentProxying {
    pub redirect_port_inbound: u16,
    pub redirect_port_outbound: u16,
    pub ip_family_mode: IpFamilyMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reachable_services: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub direct_access_services: Vec<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamilyMode {
    #[default]
    DualStack,
    Ipv4,
}

/// Prometheus scraping configuration for the workload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregate: Vec<AggregateMetrics>,
}

/// Metrics scraped from an application and merged into the sidecar's own metrics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub name: String,
    pub path: String,
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub enabled: bool,
}

/// Application HTTP probes rewritten to be served by the sidecar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probes {
    pub port: u16,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<ProbeEndpoint>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEndpoint {
    pub inbound_port: u16,
    pub inbound_path: String,
    pub path: String,
}

/// A network endpoint backing a mesh service, derived from another workload's inbound.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
    pub instance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn omits_unset_sections() {
        let dp = Dataplane {
            address: "192.0.2.1".to_string(),
            inbound: vec![Inbound {
                port: 8080,
                tags: Some(("kuma.io/service".to_string(), "demo_example_svc_80".to_string()))
                    .into_iter()
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&dp).unwrap(),
            serde_json::json!({
                "address": "192.0.2.1",
                "inbound": [{
                    "port": 8080,
                    "tags": { "kuma.io/service": "demo_example_svc_80" },
                }],
            })
        );
    }

    #[test]
    fn serializes_gateway_type() {
        let gw = Gateway {
            kind: GatewayType::Builtin,
            tags: Tags::new(),
        };
        assert_eq!(
            serde_json::to_value(&gw).unwrap(),
            serde_json::json!({ "type": "BUILTIN", "tags": {} })
        );
    }
}
