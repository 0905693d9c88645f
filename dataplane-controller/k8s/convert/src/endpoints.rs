use dataplane_controller_core::{tags, DataplaneResource, Endpoint};
use std::collections::BTreeMap;
use tracing::warn;

/// Endpoints grouped by the `kuma.io/service` tag of the listener that exposes them.
///
/// Keys are ordered lexicographically, endpoints by address and port.
pub type EndpointsByService = BTreeMap<String, Vec<Endpoint>>;

/// Groups the inbound listeners of other dataplanes by service.
///
/// A listener without its own address is reached at its dataplane's address. A dataplane with
/// no address at all is skipped.
pub fn aggregate_endpoints<'d>(
    siblings: impl IntoIterator<Item = &'d DataplaneResource>,
) -> EndpointsByService {
    let mut by_service = EndpointsByService::new();
    for dp in siblings {
        for inbound in &dp.spec.inbound {
            let Some(service) = inbound.tags.get(tags::SERVICE) else {
                continue;
            };
            let address = inbound.address.as_deref().unwrap_or(&dp.spec.address);
            if address.is_empty() {
                warn!(
                    dataplane = %dp.name,
                    namespace = %dp.namespace,
                    %service,
                    "Dataplane has no address"
                );
                continue;
            }
            by_service.entry(service.clone()).or_default().push(Endpoint {
                address: address.to_string(),
                port: inbound.port,
                instance: inbound.tags.get(tags::INSTANCE).cloned(),
            });
        }
    }
    for endpoints in by_service.values_mut() {
        endpoints.sort();
        endpoints.dedup();
    }
    by_service
}
