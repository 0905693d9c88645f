use dataplane_controller_core::tags;
use dataplane_controller_k8s_api::{self as k8s, Annotations};

/// Infers the protocol served on a Service port.
///
/// A non-empty `appProtocol` wins, then the legacy `<port>.service.kuma.io/protocol` Service
/// annotation, then `tcp`. Values are lower-cased but otherwise kept verbatim, so custom protocol
/// names survive into the tags.
pub fn infer_protocol(svc: &k8s::Service, port: &k8s::ServicePort) -> String {
    if let Some(app_protocol) = port.app_protocol.as_deref().filter(|p| !p.is_empty()) {
        return app_protocol.to_lowercase();
    }

    let key = format!("{}.service.kuma.io/protocol", port.port);
    if let Some(protocol) = Annotations::new(&svc.metadata)
        .get(&key)
        .filter(|p| !p.is_empty())
    {
        return protocol.to_lowercase();
    }

    tags::PROTOCOL_TCP.to_string()
}
