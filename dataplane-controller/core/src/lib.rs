//! Kubernetes-independent model of a mesh dataplane.
//!
//! A [`Dataplane`] describes how one workload participates in the mesh: the ports it accepts
//! traffic on (inbound), the services it may reach (outbound), and the specialized role it plays,
//! if any. Workloads are joined to each other through the `kuma.io/service` tag, whose value is a
//! [`ServiceIdentity`].

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod dataplane;
mod identity;
pub mod tags;

pub use self::{
    dataplane::{
        AggregateMetrics, Dataplane, DataplaneResource, EgressRole, Endpoint, Gateway,
        GatewayType, Health, Inbound, IngressRole, IpFamilyMode, Metrics, Outbound, ProbeEndpoint,
        Probes, TransparentProxying, SERVICELESS_PORT,
    },
    identity::{MalformedIdentity, ServiceIdentity},
    tags::Tags,
};
