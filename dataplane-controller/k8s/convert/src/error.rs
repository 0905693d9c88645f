use crate::host_view::HostKey;
use dataplane_controller_core::MalformedIdentity;
use dataplane_controller_k8s_api::InvalidAnnotation;

/// Errors that abort the conversion of a workload.
///
/// Failures scoped to a single sibling dataplane or a single service identity are logged and
/// skipped instead; they never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{role} requires exactly one Service to select the pod, found {count}")]
    AmbiguousServiceMatch { role: Role, count: usize },

    #[error("{role} requires exactly one inbound, found {count}")]
    AmbiguousInbound { role: Role, count: usize },

    #[error(
        "every pod in a mesh must be part of at least one Service, but no container port \
         satisfies any Service that selects this pod"
    )]
    NoRoutablePort,

    #[error(transparent)]
    MalformedIdentity(#[from] MalformedIdentity),

    #[error("{role} can only be deployed in namespace {system_namespace:?}, not {namespace:?}")]
    RoleNamespaceViolation {
        role: Role,
        namespace: String,
        system_namespace: String,
    },

    #[error("no nodes available to resolve the public address of a NodePort Service")]
    EmptyNodeSet,

    #[error("lookup failed: {0}")]
    UpstreamLookupFailure(#[source] anyhow::Error),

    #[error(transparent)]
    InvalidAnnotation(#[from] InvalidAnnotation),

    #[error("pod has no IP address")]
    MissingAddress,

    #[error("host {host} port {port} is already mapped to {existing}, cannot map it to {conflicting}")]
    HostConflict {
        host: HostKey,
        port: u16,
        existing: String,
        conflicting: String,
    },
}

/// The specialized role a workload plays, used to qualify errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Gateway,
    Ingress,
    Egress,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gateway => "gateway".fmt(f),
            Self::Ingress => "zone ingress".fmt(f),
            Self::Egress => "zone egress".fmt(f),
        }
    }
}
