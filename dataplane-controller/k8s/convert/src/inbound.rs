use crate::{
    health::{app_containers_ready, container_ready, resolve_health, sidecar_ready},
    protocol::infer_protocol,
    workload, ConvertError, ConverterConfig,
};
use dataplane_controller_core::{tags, Health, Inbound, ServiceIdentity, Tags, SERVICELESS_PORT};
use dataplane_controller_k8s_api::{self as k8s, ResourceExt};
use std::num::NonZeroU16;
use tracing::{debug, trace};

/// Builds the inbound listeners of a pod from the Services that select it.
///
/// Services are visited in (namespace, name) order and their TCP ports in declaration order.
/// A Service port that no container port satisfies is skipped. ExternalName Services are
/// ignored; a pod selected by no other Service gets a single serviceless listener.
///
/// `node_tags` are copied into every listener's tags.
pub fn synthesize_inbound(
    config: &ConverterConfig,
    pod: &k8s::Pod,
    services: &[&k8s::Service],
    node_tags: &Tags,
) -> Result<Vec<Inbound>, ConvertError> {
    let mut services = services
        .iter()
        .copied()
        .filter(|svc| k8s::service_type(svc) != k8s::service_type::EXTERNAL_NAME)
        .collect::<Vec<_>>();
    if services.is_empty() {
        return Ok(vec![serviceless(config, pod, node_tags)]);
    }
    services.sort_by_key(|svc| (svc.namespace(), svc.name_any()));

    let sidecar = sidecar_ready(pod, &config.sidecar_container_name);
    let terminating = workload::is_terminating(pod);
    let labels = workload::label_tags(pod);

    let mut inbound = Vec::new();
    for svc in services {
        for svc_port in k8s::service_ports(svc) {
            if !k8s::is_tcp(svc_port.protocol.as_deref()) {
                trace!(service = %svc.name_any(), port = svc_port.port, "Skipping non-TCP port");
                continue;
            }
            let Some(id_port) = u16::try_from(svc_port.port).ok().and_then(NonZeroU16::new) else {
                continue;
            };
            let Some((port, container)) = find_port(pod, svc_port) else {
                debug!(
                    service = %svc.name_any(),
                    port = svc_port.port,
                    "No container port in the pod matches the Service port"
                );
                continue;
            };

            let mut tags = labels.clone();
            let ns = svc.namespace().unwrap_or_default();
            let id = ServiceIdentity::service(svc.name_any(), ns, id_port);
            tags.insert(tags::SERVICE.to_string(), id.to_string());
            if let Some(zone) = config.zone() {
                tags.insert(tags::ZONE.to_string(), zone.to_string());
            }
            tags.extend(node_tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            tags.insert(tags::PROTOCOL.to_string(), infer_protocol(svc, svc_port));
            if k8s::is_headless(svc) {
                tags.insert(tags::INSTANCE.to_string(), pod.name_any());
            }

            let matched = container.and_then(|c| container_ready(pod, &c.name));
            inbound.push(Inbound {
                port,
                address: None,
                tags,
                health: health(terminating, matched, sidecar),
            });
        }
    }

    if inbound.is_empty() {
        return Err(ConvertError::NoRoutablePort);
    }
    Ok(inbound)
}

/// The listener of a pod that no Service selects. It identifies the workload but is never
/// routable.
fn serviceless(config: &ConverterConfig, pod: &k8s::Pod, node_tags: &Tags) -> Inbound {
    let mut tags = workload::label_tags(pod);
    let id = ServiceIdentity::serviceless(
        workload::workload_name(pod),
        pod.namespace().unwrap_or_default(),
    );
    tags.insert(tags::SERVICE.to_string(), id.to_string());
    if let Some(zone) = config.zone() {
        tags.insert(tags::ZONE.to_string(), zone.to_string());
    }
    tags.insert(tags::PROTOCOL.to_string(), tags::PROTOCOL_TCP.to_string());
    tags.insert(tags::INSTANCE.to_string(), pod.name_any());
    tags.extend(node_tags.iter().map(|(k, v)| (k.clone(), v.clone())));

    let apps = app_containers_ready(pod, &config.sidecar_container_name);
    let sidecar = sidecar_ready(pod, &config.sidecar_container_name);
    Inbound {
        port: SERVICELESS_PORT,
        address: None,
        tags,
        health: health(workload::is_terminating(pod), apps, sidecar),
    }
}

fn health(terminating: bool, matched: Option<bool>, sidecar: Option<bool>) -> Option<Health> {
    if terminating {
        return Some(Health { ready: false });
    }
    resolve_health(matched, sidecar)
}

/// Resolves the container port targeted by a Service port.
///
/// A named target port must match a TCP container port by name. A numeric target port, or the
/// Service port itself when no target is set, resolves even if no container declares it; the
/// declaring container is returned when one exists.
fn find_port<'p>(
    pod: &'p k8s::Pod,
    svc_port: &k8s::ServicePort,
) -> Option<(u16, Option<&'p k8s::Container>)> {
    let containers = pod.spec.as_ref().map(|s| s.containers.as_slice()).unwrap_or_default();
    let tcp_ports = || {
        containers.iter().flat_map(|c| {
            c.ports
                .iter()
                .flatten()
                .filter(|p| k8s::is_tcp(p.protocol.as_deref()))
                .map(move |p| (c, p))
        })
    };

    let port = match svc_port.target_port.as_ref() {
        Some(k8s::IntOrString::String(name)) => {
            return tcp_ports()
                .find(|(_, p)| p.name.as_deref() == Some(name.as_str()))
                .and_then(|(c, p)| Some((nonzero(p.container_port)?, Some(c))));
        }
        Some(k8s::IntOrString::Int(port)) => nonzero(*port)?,
        None => nonzero(svc_port.port)?,
    };
    let container = tcp_ports()
        .find(|(_, p)| p.container_port == i32::from(port))
        .map(|(c, _)| c);
    Some((port, container))
}

fn nonzero(port: i32) -> Option<u16> {
    u16::try_from(port).ok().filter(|p| *p != 0)
}
