//! Per-workload settings, parsed once from a pod's annotations.

use crate::{metrics, ConverterConfig};
use ahash::AHashSet;
use dataplane_controller_core::{GatewayType, IpFamilyMode, Metrics, TransparentProxying};
use dataplane_controller_k8s_api::{Annotations, InvalidAnnotation};

pub const MESH: &str = "kuma.io/mesh";
pub const GATEWAY: &str = "kuma.io/gateway";
pub const INGRESS: &str = "kuma.io/ingress";
pub const EGRESS: &str = "kuma.io/egress";
pub const INGRESS_PUBLIC_ADDRESS: &str = "kuma.io/ingress-public-address";
pub const INGRESS_PUBLIC_PORT: &str = "kuma.io/ingress-public-port";
pub const TRANSPARENT_PROXYING: &str = "kuma.io/transparent-proxying";
pub const TRANSPARENT_PROXYING_INBOUND_PORT: &str = "kuma.io/transparent-proxying-inbound-port";
pub const TRANSPARENT_PROXYING_OUTBOUND_PORT: &str = "kuma.io/transparent-proxying-outbound-port";
pub const TRANSPARENT_PROXYING_IP_FAMILY_MODE: &str =
    "kuma.io/transparent-proxying-ip-family-mode";
pub const REACHABLE_SERVICES: &str = "kuma.io/transparent-proxying-reachable-services";
pub const DIRECT_ACCESS_SERVICES: &str = "kuma.io/direct-access-services";
pub const VIRTUAL_PROBES: &str = "kuma.io/virtual-probes";
pub const VIRTUAL_PROBES_PORT: &str = "kuma.io/virtual-probes-port";
pub const APPLICATION_PROBE_PROXY_PORT: &str = "kuma.io/application-probe-proxy-port";
pub const ENVOY_ADMIN_PORT: &str = "kuma.io/envoy-admin-port";

/// Matches every direct-access service.
const DIRECT_ACCESS_ALL: &str = "*";

/// The role a workload plays, in order of precedence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum WorkloadRole {
    Gateway(GatewayType),
    Ingress,
    Egress,
    Sidecar,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub role: WorkloadRole,
    pub ingress_public_address: Option<String>,
    pub ingress_public_port: Option<u16>,
    pub transparent_proxying: Option<TransparentProxying>,
    pub probe_port: Option<u16>,
    pub admin_port: Option<u16>,
    pub metrics: Option<Metrics>,
}

// === impl Settings ===

impl Settings {
    pub(crate) fn from_annotations(
        anns: Annotations<'_>,
        config: &ConverterConfig,
    ) -> Result<Self, InvalidAnnotation> {
        let settings = Self {
            role: role(anns)?,
            ingress_public_address: anns
                .get(INGRESS_PUBLIC_ADDRESS)
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(ToString::to_string),
            ingress_public_port: anns.get_port(INGRESS_PUBLIC_PORT)?,
            transparent_proxying: transparent_proxying(anns)?,
            probe_port: probe_port(anns, config)?,
            admin_port: anns.get_port(ENVOY_ADMIN_PORT)?,
            metrics: metrics::from_annotations(anns)?,
        };
        tracing::trace!(?settings);
        Ok(settings)
    }

    /// The set of service identities a workload's outbounds are limited to, or `None` if every
    /// known service may be reached.
    ///
    /// Direct-access services only widen a non-empty reachable-services list.
    pub(crate) fn outbound_allow_list(&self) -> Option<AHashSet<String>> {
        let tp = self.transparent_proxying.as_ref()?;
        if tp.reachable_services.is_empty() {
            return None;
        }
        let direct = tp
            .direct_access_services
            .iter()
            .filter(|s| s.as_str() != DIRECT_ACCESS_ALL);
        Some(tp.reachable_services.iter().chain(direct).cloned().collect())
    }
}

fn role(anns: Annotations<'_>) -> Result<WorkloadRole, InvalidAnnotation> {
    if let Some(gateway) = anns.get(GATEWAY) {
        return match gateway {
            "builtin" => Ok(WorkloadRole::Gateway(GatewayType::Builtin)),
            "enabled" | "provided" => Ok(WorkloadRole::Gateway(GatewayType::Delegated)),
            _ => Err(InvalidAnnotation {
                key: GATEWAY.to_string(),
                value: gateway.to_string(),
                reason: "expected one of builtin, enabled, provided".to_string(),
            }),
        };
    }
    if anns.get_enabled(INGRESS)? == Some(true) {
        return Ok(WorkloadRole::Ingress);
    }
    if anns.get_enabled(EGRESS)? == Some(true) {
        return Ok(WorkloadRole::Egress);
    }
    Ok(WorkloadRole::Sidecar)
}

fn transparent_proxying(
    anns: Annotations<'_>,
) -> Result<Option<TransparentProxying>, InvalidAnnotation> {
    if anns.get_enabled(TRANSPARENT_PROXYING)? != Some(true) {
        return Ok(None);
    }

    let required = |key: &str| -> Result<u16, InvalidAnnotation> {
        anns.get_port(key)?.ok_or_else(|| InvalidAnnotation {
            key: key.to_string(),
            value: String::new(),
            reason: "must be set when transparent proxying is enabled".to_string(),
        })
    };
    let redirect_port_inbound = required(TRANSPARENT_PROXYING_INBOUND_PORT)?;
    let redirect_port_outbound = required(TRANSPARENT_PROXYING_OUTBOUND_PORT)?;

    let ip_family_mode = match anns.get(TRANSPARENT_PROXYING_IP_FAMILY_MODE) {
        None | Some("dualstack") => IpFamilyMode::DualStack,
        Some("ipv4") => IpFamilyMode::Ipv4,
        Some(mode) => {
            return Err(InvalidAnnotation {
                key: TRANSPARENT_PROXYING_IP_FAMILY_MODE.to_string(),
                value: mode.to_string(),
                reason: "expected one of dualstack, ipv4".to_string(),
            })
        }
    };

    Ok(Some(TransparentProxying {
        redirect_port_inbound,
        redirect_port_outbound,
        ip_family_mode,
        reachable_services: anns.get_list(REACHABLE_SERVICES).unwrap_or_default(),
        direct_access_services: anns.get_list(DIRECT_ACCESS_SERVICES).unwrap_or_default(),
    }))
}

/// The port on which the sidecar serves rewritten application probes, if virtual probes are
/// enabled.
fn probe_port(
    anns: Annotations<'_>,
    config: &ConverterConfig,
) -> Result<Option<u16>, InvalidAnnotation> {
    if anns.get_enabled(VIRTUAL_PROBES)? != Some(true) {
        return Ok(None);
    }
    let port = match anns.get_port(APPLICATION_PROBE_PROXY_PORT)? {
        Some(port) => port,
        None => anns
            .get_port(VIRTUAL_PROBES_PORT)?
            .unwrap_or(config.virtual_probes_port),
    };
    Ok(Some(port))
}
