use dataplane_controller_core::{ProbeEndpoint, Probes};
use dataplane_controller_k8s_api as k8s;
use std::num::NonZeroU16;

/// Rewrites the pod's HTTP probes so that the sidecar can serve them on `port`.
///
/// Each probe becomes reachable at `/<container port><path>` on the probe port.
pub(crate) fn virtual_probes(pod: &k8s::PodSpec, port: u16) -> Probes {
    let mut endpoints = pod
        .containers
        .iter()
        .flat_map(container_http_probes)
        .map(|(inbound_port, inbound_path)| ProbeEndpoint {
            path: format!("/{inbound_port}{inbound_path}"),
            inbound_port: inbound_port.get(),
            inbound_path,
        })
        .collect::<Vec<_>>();
    endpoints.sort_by(|a, b| a.path.cmp(&b.path));
    endpoints.dedup();
    Probes { port, endpoints }
}

fn container_http_probes(
    container: &k8s::Container,
) -> impl Iterator<Item = (NonZeroU16, String)> + '_ {
    fn find_by_name(name: &str, ports: &[k8s::ContainerPort]) -> Option<NonZeroU16> {
        ports
            .iter()
            .filter(|p| k8s::is_tcp(p.protocol.as_deref()))
            .find(|p| p.name.as_deref() == Some(name))
            .and_then(|p| u16::try_from(p.container_port).ok())
            .and_then(NonZeroU16::new)
    }

    fn get_port(port: &k8s::IntOrString, container: &k8s::Container) -> Option<NonZeroU16> {
        match port {
            k8s::IntOrString::Int(p) => u16::try_from(*p).ok()?.try_into().ok(),
            k8s::IntOrString::String(n) => find_by_name(n, container.ports.as_ref()?),
        }
    }

    (container.liveness_probe.iter())
        .chain(container.readiness_probe.iter())
        .chain(container.startup_probe.iter())
        .filter_map(|p| {
            let probe = p.http_get.as_ref()?;
            let port = get_port(&probe.port, container)?;
            let path = probe.path.as_deref().unwrap_or("/");
            match http::Uri::try_from(path) {
                Ok(uri) => {
                    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
                    Some((port, path.to_string()))
                }
                Err(error) => {
                    tracing::warn!(%error, path, container = %container.name, "Invalid probe path");
                    None
                }
            }
        })
}
