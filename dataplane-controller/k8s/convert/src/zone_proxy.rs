//! Zone ingress and egress proxies.
//!
//! Zone proxies run in the control plane's namespace, serve every mesh, and are fronted by
//! exactly one Service exposing exactly one port.

use crate::{error::Role, ConvertError, ConverterConfig, NodeAccessor};
use dataplane_controller_core::{EgressRole, Inbound, IngressRole};
use dataplane_controller_k8s_api::{self as k8s, ResourceExt};
use tracing::debug;

/// Addresses assigned to the ingress by its Service, or overridden by annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicCoordinates {
    pub address: Option<String>,
    pub port: Option<u16>,
}

/// Checks that a zone proxy runs in the control plane's namespace and is selected by exactly one
/// Service, which is returned.
pub fn validate<'s>(
    role: Role,
    config: &ConverterConfig,
    pod: &k8s::Pod,
    services: &[&'s k8s::Service],
) -> Result<&'s k8s::Service, ConvertError> {
    let namespace = pod.namespace().unwrap_or_default();
    if namespace != config.system_namespace {
        return Err(ConvertError::RoleNamespaceViolation {
            role,
            namespace,
            system_namespace: config.system_namespace.clone(),
        });
    }

    match services {
        [svc] => Ok(*svc),
        _ => Err(ConvertError::AmbiguousServiceMatch {
            role,
            count: services.len(),
        }),
    }
}

pub async fn ingress<N>(
    svc: &k8s::Service,
    inbound: Vec<Inbound>,
    overrides: PublicCoordinates,
    nodes: &N,
) -> Result<IngressRole, ConvertError>
where
    N: NodeAccessor + ?Sized,
{
    let inbound = single_inbound(Role::Ingress, inbound)?;

    let coordinates = match overrides {
        PublicCoordinates {
            address: Some(address),
            port: Some(port),
        } => PublicCoordinates {
            address: Some(address),
            port: Some(port),
        },
        overrides => {
            let resolved = public_coordinates(svc, nodes).await?;
            PublicCoordinates {
                address: overrides.address.or(resolved.address),
                port: overrides.port.or(resolved.port),
            }
        }
    };

    Ok(IngressRole {
        public_address: coordinates.address,
        public_port: coordinates.port,
        inbound,
    })
}

/// Egress is only reached from inside the zone, so it carries its listener port and no public
/// coordinates.
pub fn egress(inbound: Vec<Inbound>) -> Result<EgressRole, ConvertError> {
    let inbound = single_inbound(Role::Egress, inbound)?;
    Ok(EgressRole { port: inbound.port })
}

fn single_inbound(role: Role, inbound: Vec<Inbound>) -> Result<Inbound, ConvertError> {
    let count = inbound.len();
    let mut inbound = inbound.into_iter();
    match (inbound.next(), inbound.next()) {
        (Some(inbound), None) => Ok(inbound),
        _ => Err(ConvertError::AmbiguousInbound { role, count }),
    }
}

/// Resolves where a zone proxy's Service is reachable from outside the cluster.
///
/// LoadBalancer Services use their first ingress point, preferring a hostname. NodePort Services
/// use the first Node's external address, falling back to its internal address. Coordinates that
/// have not been assigned yet are left unset.
pub async fn public_coordinates<N>(
    svc: &k8s::Service,
    nodes: &N,
) -> Result<PublicCoordinates, ConvertError>
where
    N: NodeAccessor + ?Sized,
{
    let Some(svc_port) = k8s::service_ports(svc).first() else {
        return Ok(PublicCoordinates::default());
    };

    match k8s::service_type(svc) {
        k8s::service_type::LOAD_BALANCER => {
            let ingress = svc
                .status
                .as_ref()
                .and_then(|s| s.load_balancer.as_ref())
                .and_then(|lb| lb.ingress.as_deref())
                .and_then(|ingress| ingress.first());
            let Some(ingress) = ingress else {
                debug!(service = %svc.name_any(), "Load balancer has not been assigned an address");
                return Ok(PublicCoordinates::default());
            };
            let address = ingress
                .hostname
                .as_deref()
                .filter(|h| !h.is_empty())
                .or_else(|| ingress.ip.as_deref().filter(|ip| !ip.is_empty()));
            Ok(PublicCoordinates {
                address: address.map(ToString::to_string),
                port: u16::try_from(svc_port.port).ok(),
            })
        }

        k8s::service_type::NODE_PORT => {
            let mut nodes = nodes
                .list()
                .await
                .map_err(ConvertError::UpstreamLookupFailure)?;
            if nodes.is_empty() {
                return Err(ConvertError::EmptyNodeSet);
            }
            nodes.sort_by_key(|n| n.name_any());
            let addresses = nodes[0]
                .status
                .as_ref()
                .and_then(|s| s.addresses.as_deref())
                .unwrap_or_default();
            let address = ["ExternalIP", "InternalIP"].iter().find_map(|kind| {
                addresses
                    .iter()
                    .find(|a| a.type_ == *kind && !a.address.is_empty())
                    .map(|a| a.address.clone())
            });
            Ok(PublicCoordinates {
                address,
                port: svc_port.node_port.and_then(|p| u16::try_from(p).ok()),
            })
        }

        _ => Ok(PublicCoordinates::default()),
    }
}
