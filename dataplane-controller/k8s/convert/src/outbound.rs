use crate::{endpoints::EndpointsByService, ServiceLookup};
use ahash::AHashSet;
use dataplane_controller_core::{tags, Endpoint, Outbound, ServiceIdentity, Tags};
use dataplane_controller_k8s_api as k8s;
use tracing::{debug, trace, warn};

/// How a mesh service is reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    /// Each endpoint is addressed individually.
    Headless,

    /// The Service's cluster IP fronts every endpoint on the Service port.
    Clustered { cluster_ip: String, port: u16 },
}

/// Builds a workload's outbound listeners from the endpoints of the other workloads in its mesh.
///
/// When `allowed` is set, only the named services are considered. Services that cannot be
/// resolved are skipped. Headless services produce one listener per endpoint, except for
/// endpoints at `own_address`; other services produce one listener on their cluster IP.
pub async fn synthesize_outbound<S>(
    endpoints: &EndpointsByService,
    services: &S,
    allowed: Option<&AHashSet<String>>,
    own_address: &str,
) -> Vec<Outbound>
where
    S: ServiceLookup + ?Sized,
{
    let mut outbound = Vec::new();
    for (service, endpoints) in endpoints {
        if let Some(allowed) = allowed {
            if !allowed.contains(service) {
                trace!(%service, "Service is not reachable");
                continue;
            }
        }
        let Some((_, target)) = resolve(service, services).await else {
            continue;
        };
        match target {
            Target::Headless => outbound.extend(
                endpoints
                    .iter()
                    .filter(|ep| ep.address != own_address)
                    .map(|ep| Outbound {
                        address: ep.address.clone(),
                        port: ep.port,
                        tags: endpoint_tags(service, ep),
                    }),
            ),
            Target::Clustered { cluster_ip, port } => outbound.push(Outbound {
                address: cluster_ip,
                port,
                tags: Some((tags::SERVICE.to_string(), service.clone()))
                    .into_iter()
                    .collect(),
            }),
        }
    }
    outbound
}

pub(crate) fn endpoint_tags(service: &str, ep: &Endpoint) -> Tags {
    let mut tags = Tags::new();
    tags.insert(tags::SERVICE.to_string(), service.to_string());
    if let Some(instance) = ep.instance.as_ref() {
        tags.insert(tags::INSTANCE.to_string(), instance.clone());
    }
    tags
}

/// Resolves a service tag to the Service backing it.
///
/// Returns `None`, after logging, for tags that are malformed or serviceless, for Services that
/// cannot be found or are of type ExternalName, and for clustered Services that have no cluster
/// IP yet or no longer expose the port.
pub(crate) async fn resolve<S>(service: &str, services: &S) -> Option<(ServiceIdentity, Target)>
where
    S: ServiceLookup + ?Sized,
{
    let id = match service.parse::<ServiceIdentity>() {
        Ok(id) => id,
        Err(error) => {
            warn!(%error, %service, "Ignoring malformed service tag");
            return None;
        }
    };
    let port = match id.port {
        Some(port) => port.get(),
        None => {
            trace!(%service, "Serviceless workloads are not routable");
            return None;
        }
    };

    let svc = match services.get(&id.namespace, &id.name).await {
        Ok(Some(svc)) => svc,
        Ok(None) => {
            debug!(%service, "Service not found");
            return None;
        }
        Err(error) => {
            warn!(%error, %service, "Failed to look up Service");
            return None;
        }
    };

    if k8s::service_type(&svc) == k8s::service_type::EXTERNAL_NAME {
        debug!(%service, "ExternalName Services are not supported");
        return None;
    }
    if k8s::is_headless(&svc) {
        return Some((id, Target::Headless));
    }

    let Some(cluster_ip) = k8s::cluster_ip(&svc) else {
        debug!(%service, "Service has no cluster IP");
        return None;
    };
    if !k8s::service_ports(&svc)
        .iter()
        .any(|p| p.port == i32::from(port))
    {
        debug!(%service, port, "Service does not expose the port");
        return None;
    }
    let target = Target::Clustered {
        cluster_ip: cluster_ip.to_string(),
        port,
    };
    Some((id, target))
}
