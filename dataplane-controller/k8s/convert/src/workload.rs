use crate::{settings, ConvertError, ConverterConfig};
use dataplane_controller_core::{tags, Tags};
use dataplane_controller_k8s_api::{self as k8s, ResourceExt};

const POD_TEMPLATE_HASH: &str = "pod-template-hash";

/// Returns the name of the workload that owns the pod.
///
/// Pods created by a Deployment are owned by a ReplicaSet whose name is the Deployment's name
/// suffixed with the pod template hash; the suffix is stripped. Pods without a controller are
/// their own workload.
pub(crate) fn workload_name(pod: &k8s::Pod) -> String {
    let owner = pod
        .owner_references()
        .iter()
        .find(|o| o.controller == Some(true))
        .or_else(|| pod.owner_references().first());
    let owner = match owner {
        Some(owner) => owner,
        None => return pod.name_any(),
    };

    if owner.kind == "ReplicaSet" {
        if let Some(hash) = pod.labels().get(POD_TEMPLATE_HASH) {
            if let Some(deployment) = owner
                .name
                .strip_suffix(hash.as_str())
                .and_then(|n| n.strip_suffix('-'))
                .filter(|n| !n.is_empty())
            {
                return deployment.to_string();
            }
        }
    }
    owner.name.clone()
}

/// Resolves the mesh a pod belongs to: the pod's own mesh annotation or label, then its
/// namespace's, then the configured default.
pub(crate) fn mesh_of(
    pod: &k8s::Pod,
    ns: Option<&k8s::Namespace>,
    config: &ConverterConfig,
) -> String {
    fn get(map: Option<&std::collections::BTreeMap<String, String>>) -> Option<&str> {
        map.and_then(|m| m.get(settings::MESH))
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }

    fn declared(meta: &k8s::ObjectMeta) -> Option<&str> {
        get(meta.annotations.as_ref()).or_else(|| get(meta.labels.as_ref()))
    }

    declared(&pod.metadata)
        .or_else(|| ns.and_then(|ns| declared(&ns.metadata)))
        .unwrap_or(&config.default_mesh)
        .to_string()
}

pub(crate) fn pod_ip(pod: &k8s::Pod) -> Result<String, ConvertError> {
    pod.status
        .as_ref()
        .and_then(|s| s.pod_ip.as_deref())
        .filter(|ip| !ip.is_empty())
        .map(ToString::to_string)
        .ok_or(ConvertError::MissingAddress)
}

pub(crate) fn node_name(pod: &k8s::Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .filter(|n| !n.is_empty())
}

pub(crate) fn is_terminating(pod: &k8s::Pod) -> bool {
    pod.metadata.deletion_timestamp.is_some()
}

/// The pod's labels that may be used as tags. Empty values and internal `kuma.io/` labels are
/// dropped.
pub(crate) fn label_tags(pod: &k8s::Pod) -> Tags {
    let mut tags = Tags::new();
    for (key, value) in pod.labels() {
        if value.is_empty() {
            continue;
        }
        if key.contains(tags::INTERNAL_MARKER) {
            tracing::trace!(label = %key, "Ignoring internal label");
            continue;
        }
        tags.insert(key.clone(), value.clone());
    }
    tags
}
