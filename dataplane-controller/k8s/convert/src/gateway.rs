use crate::{error::Role, ConvertError, ConverterConfig};
use dataplane_controller_core::{tags, Gateway, GatewayType, Inbound, ServiceIdentity, Tags};
use dataplane_controller_k8s_api::{self as k8s, ResourceExt};

/// Builds the marker of a builtin gateway, identified by the single Service that selects it.
pub fn builtin_gateway(
    config: &ConverterConfig,
    services: &[&k8s::Service],
) -> Result<Gateway, ConvertError> {
    let svc = match services {
        [svc] => svc,
        _ => {
            return Err(ConvertError::AmbiguousServiceMatch {
                role: Role::Gateway,
                count: services.len(),
            })
        }
    };

    let id = ServiceIdentity::serviceless(svc.name_any(), svc.namespace().unwrap_or_default());
    let mut tags = Some((tags::SERVICE.to_string(), id.to_string()))
        .into_iter()
        .collect::<Tags>();
    if let Some(zone) = config.zone() {
        tags.insert(tags::ZONE.to_string(), zone.to_string());
    }
    Ok(Gateway {
        kind: GatewayType::Builtin,
        tags,
    })
}

/// Builds the marker of a delegated gateway from its synthesized inbound listeners.
///
/// The gateway is identified by its first listener. The listeners themselves are not exposed.
pub fn delegated_gateway(inbound: &[Inbound]) -> Result<Gateway, ConvertError> {
    let first = inbound.first().ok_or(ConvertError::NoRoutablePort)?;
    Ok(Gateway {
        kind: GatewayType::Delegated,
        tags: first.tags.clone(),
    })
}
