/// Cluster-wide converter configuration.
///
/// May be flattened into a runtime's command-line arguments.
#[derive(Clone, Debug, clap::Args)]
pub struct ConverterConfig {
    /// The zone in which this control plane runs. When set, every listener is tagged with it.
    #[clap(long = "zone", env = "KUMA_MULTIZONE_ZONE_NAME")]
    pub zone: Option<String>,

    /// The namespace where the control plane is deployed. Zone ingress and egress workloads must
    /// run in this namespace.
    #[clap(long, default_value = "kuma-system")]
    pub system_namespace: String,

    #[clap(long, default_value = "kuma-sidecar")]
    pub sidecar_container_name: String,

    /// The mesh of workloads that do not name one.
    #[clap(long, default_value = "default")]
    pub default_mesh: String,

    /// E.g. "cluster.local"
    #[clap(long, default_value = "cluster.local")]
    pub cluster_domain: String,

    /// Node labels copied into the tags of every inbound on that node.
    #[clap(long, value_delimiter = ',')]
    pub node_labels_to_copy: Vec<String>,

    /// Skips per-workload outbound generation; outbounds are instead derived from the mesh-wide
    /// host view and served through DNS virtual IPs.
    #[clap(long)]
    pub outbounds_as_vips: bool,

    #[clap(long, default_value = "9000")]
    pub virtual_probes_port: u16,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            zone: None,
            system_namespace: "kuma-system".to_string(),
            sidecar_container_name: "kuma-sidecar".to_string(),
            default_mesh: "default".to_string(),
            cluster_domain: "cluster.local".to_string(),
            node_labels_to_copy: Vec::new(),
            outbounds_as_vips: false,
            virtual_probes_port: 9000,
        }
    }
}

impl ConverterConfig {
    pub(crate) fn zone(&self) -> Option<&str> {
        self.zone.as_deref().filter(|z| !z.is_empty())
    }

    pub(crate) fn service_hostname(&self, ns: &str, svc: &str) -> String {
        format!("{svc}.{ns}.svc.{}", self.cluster_domain)
    }
}
