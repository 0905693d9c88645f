//! Converts Kubernetes workloads into mesh dataplane descriptors.
//!
//! A [`Converter`] inspects a pod, the Services that select it, and the descriptors of the other
//! workloads in its mesh, and produces the pod's [`DataplaneResource`]:
//!
//! - inbound listeners, one per Service port that the pod serves, tagged with the Service's
//!   identity, protocol, and the pod's labels;
//! - outbound listeners for every mesh service the pod may reach, fanned out per endpoint for
//!   headless Services;
//! - the specialized role of gateways and zone proxies.
//!
//! Conversion is a pure function of its inputs except for the [`ServiceLookup`] and
//! [`NodeAccessor`] collaborators, which read secondary cluster state. Mesh-wide, a [`HostView`]
//! maps DNS hosts to the services they reach.
//!
//! [`DataplaneResource`]: dataplane_controller_core::DataplaneResource

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod config;
mod converter;
mod endpoints;
mod error;
mod gateway;
mod health;
mod host_view;
mod inbound;
mod lookup;
mod metrics;
mod outbound;
mod probes;
mod protocol;
pub mod settings;
mod workload;
mod zone_proxy;


pub use self::{
    config::ConverterConfig,
    converter::Converter,
    endpoints::{aggregate_endpoints, EndpointsByService},
    error::{ConvertError, Role},
    gateway::{builtin_gateway, delegated_gateway},
    health::resolve_health,
    host_view::{build_host_view, HostEntry, HostKey, HostView, Origin},
    inbound::synthesize_inbound,
    lookup::{NodeAccessor, ServiceLookup},
    outbound::synthesize_outbound,
    protocol::infer_protocol,
    zone_proxy::{public_coordinates, PublicCoordinates},
};
