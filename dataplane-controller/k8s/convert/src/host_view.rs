//! The mesh-wide mapping of DNS hosts to the services they reach.

use crate::{
    endpoints::aggregate_endpoints,
    outbound::{endpoint_tags, resolve, Target},
    ConvertError, ConverterConfig, ServiceLookup,
};
use dataplane_controller_core::{tags, DataplaneResource, Tags};
use std::collections::{btree_map::Entry, BTreeMap};
use tracing::trace;

/// Maps each host of a mesh to the services reachable through it, by port.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostView {
    hosts: BTreeMap<HostKey, BTreeMap<u16, HostEntry>>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostKey {
    Address(String),
    Hostname(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEntry {
    pub port: u16,
    pub tags: Tags,
    pub origin: Origin,
}

/// The kind of Service that produced an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Clustered,
    Headless,
}

// === impl HostView ===

impl HostView {
    /// Registers `entry` under `key`.
    ///
    /// Registering an identical entry twice is a no-op. Registering a different service on a
    /// host and port that is already taken fails.
    pub fn add(&mut self, key: HostKey, entry: HostEntry) -> Result<(), ConvertError> {
        let by_port = self.hosts.entry(key.clone()).or_default();
        match by_port.entry(entry.port) {
            Entry::Vacant(e) => {
                e.insert(entry);
                Ok(())
            }
            Entry::Occupied(e) if e.get().tags == entry.tags => Ok(()),
            Entry::Occupied(e) => Err(ConvertError::HostConflict {
                host: key,
                port: entry.port,
                existing: describe(&e.get().tags),
                conflicting: describe(&entry.tags),
            }),
        }
    }

    pub fn get(&self, key: &HostKey) -> Option<&BTreeMap<u16, HostEntry>> {
        self.hosts.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HostKey, &BTreeMap<u16, HostEntry>)> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

fn describe(tags: &Tags) -> String {
    tags.get(tags::SERVICE)
        .cloned()
        .unwrap_or_else(|| format!("{tags:?}"))
}

/// Builds the host view of `mesh` from every dataplane in it.
///
/// Clustered Services are reachable at their cluster IP and at their cluster DNS name. Headless
/// Services are reachable at each endpoint's address and, when the endpoint names its instance,
/// at `<instance>.<service DNS name>`.
pub async fn build_host_view<S>(
    config: &ConverterConfig,
    mesh: &str,
    dataplanes: &[DataplaneResource],
    services: &S,
) -> Result<HostView, ConvertError>
where
    S: ServiceLookup + ?Sized,
{
    let in_mesh = dataplanes
        .iter()
        .filter(|dp| dp.mesh.as_deref() == Some(mesh));
    let endpoints = aggregate_endpoints(in_mesh);

    let mut view = HostView::default();
    for (service, endpoints) in &endpoints {
        let Some((id, target)) = resolve(service, services).await else {
            continue;
        };
        let hostname = config.service_hostname(&id.namespace, &id.name);
        match target {
            Target::Clustered { cluster_ip, port } => {
                let entry = HostEntry {
                    port,
                    tags: Some((tags::SERVICE.to_string(), service.clone()))
                        .into_iter()
                        .collect(),
                    origin: Origin::Clustered,
                };
                view.add(HostKey::Address(cluster_ip), entry.clone())?;
                view.add(HostKey::Hostname(hostname), entry)?;
            }
            Target::Headless => {
                for ep in endpoints {
                    let entry = HostEntry {
                        port: ep.port,
                        tags: endpoint_tags(service, ep),
                        origin: Origin::Headless,
                    };
                    if let Some(instance) = ep.instance.as_ref() {
                        let host = format!("{instance}.{hostname}");
                        view.add(HostKey::Hostname(host), entry.clone())?;
                    }
                    view.add(HostKey::Address(ep.address.clone()), entry)?;
                }
            }
        }
    }
    trace!(%mesh, hosts = view.len(), "Built host view");
    Ok(view)
}

impl std::fmt::Display for HostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address(a) => a.fmt(f),
            Self::Hostname(h) => h.fmt(f),
        }
    }
}
