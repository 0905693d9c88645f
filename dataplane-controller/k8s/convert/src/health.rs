use dataplane_controller_core::Health;
use dataplane_controller_k8s_api as k8s;

/// Combines the readiness of the container serving a listener with the sidecar's.
///
/// Unknown readiness is skipped. When neither is known, health is absent rather than not-ready.
pub fn resolve_health(matched: Option<bool>, sidecar: Option<bool>) -> Option<Health> {
    let ready = match (matched, sidecar) {
        (None, None) => return None,
        (Some(ready), None) | (None, Some(ready)) => ready,
        (Some(matched), Some(sidecar)) => matched && sidecar,
    };
    Some(Health { ready })
}

/// Finds a container's readiness among the pod's container statuses.
pub(crate) fn container_ready(pod: &k8s::Pod, name: &str) -> Option<bool> {
    statuses(pod, |s| s.container_statuses.as_deref())
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.ready)
}

/// Finds the sidecar's readiness. A sidecar may also run as a native sidecar init container.
pub(crate) fn sidecar_ready(pod: &k8s::Pod, name: &str) -> Option<bool> {
    container_ready(pod, name).or_else(|| {
        statuses(pod, |s| s.init_container_statuses.as_deref())
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.ready)
    })
}

/// The combined readiness of every known application container, excluding the sidecar.
pub(crate) fn app_containers_ready(pod: &k8s::Pod, sidecar: &str) -> Option<bool> {
    statuses(pod, |s| s.container_statuses.as_deref())
        .iter()
        .filter(|s| s.name != sidecar)
        .map(|s| s.ready)
        .reduce(|a, b| a && b)
}

fn statuses<'p>(
    pod: &'p k8s::Pod,
    f: impl FnOnce(&'p k8s::PodStatus) -> Option<&'p [k8s::ContainerStatus]>,
) -> &'p [k8s::ContainerStatus] {
    pod.status.as_ref().and_then(f).unwrap_or_default()
}
