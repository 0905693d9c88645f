use crate::{
    endpoints::aggregate_endpoints,
    gateway, host_view,
    inbound::synthesize_inbound,
    outbound::synthesize_outbound,
    probes,
    settings::{Settings, WorkloadRole},
    workload,
    zone_proxy::{self, PublicCoordinates},
    ConvertError, ConverterConfig, HostView, NodeAccessor, Role, ServiceLookup,
};
use dataplane_controller_core::{Dataplane, DataplaneResource, GatewayType, Inbound, Tags};
use dataplane_controller_k8s_api::{self as k8s, services_selecting, Annotations, ResourceExt};
use tracing::{debug, instrument, warn};

/// Converts pods into dataplane descriptors.
///
/// A converter holds no state between conversions; the same inputs always produce the same
/// descriptor.
#[derive(Clone, Debug)]
pub struct Converter<S, N> {
    config: ConverterConfig,
    services: S,
    nodes: N,
}

// === impl Converter ===

impl<S, N> Converter<S, N>
where
    S: ServiceLookup,
    N: NodeAccessor,
{
    pub fn new(config: ConverterConfig, services: S, nodes: N) -> Self {
        Self {
            config,
            services,
            nodes,
        }
    }

    /// Builds the descriptor of `pod`.
    ///
    /// `services` may hold any Services; only those in the pod's namespace that select it are
    /// used. `siblings` are the descriptors already known for the cluster. The pod's own
    /// descriptor and those of other meshes are ignored.
    #[instrument(
        skip_all,
        fields(ns = %pod.namespace().unwrap_or_default(), pod = %pod.name_any())
    )]
    pub async fn convert(
        &self,
        pod: &k8s::Pod,
        ns: Option<&k8s::Namespace>,
        services: &[k8s::Service],
        siblings: &[DataplaneResource],
    ) -> Result<DataplaneResource, ConvertError> {
        let settings = Settings::from_annotations(Annotations::new(&pod.metadata), &self.config)?;
        let address = workload::pod_ip(pod)?;
        let selecting = services_selecting(pod, services);
        debug!(role = ?settings.role, services = selecting.len(), "Converting pod");

        let mut resource = DataplaneResource {
            name: pod.name_any(),
            namespace: pod.namespace().unwrap_or_default(),
            mesh: None,
            spec: Dataplane {
                address,
                admin_port: settings.admin_port,
                ..Default::default()
            },
        };

        match settings.role {
            WorkloadRole::Ingress => {
                let svc = zone_proxy::validate(Role::Ingress, &self.config, pod, &selecting)?;
                let inbound = self.inbound(pod, &[svc]).await?;
                let overrides = PublicCoordinates {
                    address: settings.ingress_public_address.clone(),
                    port: settings.ingress_public_port,
                };
                let ingress = zone_proxy::ingress(svc, inbound, overrides, &self.nodes).await?;
                resource.spec.ingress = Some(ingress);
                return Ok(resource);
            }
            WorkloadRole::Egress => {
                let svc = zone_proxy::validate(Role::Egress, &self.config, pod, &selecting)?;
                let inbound = self.inbound(pod, &[svc]).await?;
                resource.spec.egress = Some(zone_proxy::egress(inbound)?);
                return Ok(resource);
            }
            WorkloadRole::Gateway(GatewayType::Builtin) => {
                let gateway = gateway::builtin_gateway(&self.config, &selecting)?;
                resource.spec.gateway = Some(gateway);
            }
            WorkloadRole::Gateway(GatewayType::Delegated) => {
                let inbound = self.inbound(pod, &selecting).await?;
                resource.spec.gateway = Some(gateway::delegated_gateway(&inbound)?);
            }
            WorkloadRole::Sidecar => {
                resource.spec.inbound = self.inbound(pod, &selecting).await?;
            }
        }

        let mesh = workload::mesh_of(pod, ns, &self.config);
        let builtin = settings.role == WorkloadRole::Gateway(GatewayType::Builtin);
        if !builtin && !self.config.outbounds_as_vips {
            let others = siblings.iter().filter(|dp| {
                dp.mesh.as_deref() == Some(mesh.as_str())
                    && !(dp.name == resource.name && dp.namespace == resource.namespace)
            });
            let endpoints = aggregate_endpoints(others);
            let allowed = settings.outbound_allow_list();
            resource.spec.outbound = synthesize_outbound(
                &endpoints,
                &self.services,
                allowed.as_ref(),
                &resource.spec.address,
            )
            .await;
        }

        resource.mesh = Some(mesh);
        resource.spec.transparent_proxying = settings.transparent_proxying;
        resource.spec.metrics = settings.metrics;
        resource.spec.probes = settings
            .probe_port
            .zip(pod.spec.as_ref())
            .map(|(port, spec)| probes::virtual_probes(spec, port));
        Ok(resource)
    }

    /// Builds the host view of `mesh` from all known descriptors.
    #[instrument(skip_all, fields(%mesh))]
    pub async fn host_view(
        &self,
        mesh: &str,
        dataplanes: &[DataplaneResource],
    ) -> Result<HostView, ConvertError> {
        host_view::build_host_view(&self.config, mesh, dataplanes, &self.services).await
    }

    async fn inbound(
        &self,
        pod: &k8s::Pod,
        services: &[&k8s::Service],
    ) -> Result<Vec<Inbound>, ConvertError> {
        let node_tags = self.node_tags(pod).await?;
        synthesize_inbound(&self.config, pod, services, &node_tags)
    }

    /// Reads the configured labels of the pod's Node.
    async fn node_tags(&self, pod: &k8s::Pod) -> Result<Tags, ConvertError> {
        if self.config.node_labels_to_copy.is_empty() {
            return Ok(Tags::new());
        }
        let Some(name) = workload::node_name(pod) else {
            return Ok(Tags::new());
        };
        let node = self
            .nodes
            .get(name)
            .await
            .map_err(ConvertError::UpstreamLookupFailure)?;
        let Some(node) = node else {
            warn!(node = %name, "Node not found");
            return Ok(Tags::new());
        };

        let labels = node.labels();
        Ok(self
            .config
            .node_labels_to_copy
            .iter()
            .filter_map(|key| Some((key.clone(), labels.get(key)?.clone())))
            .collect())
    }
}
