//! Read-only accessors for cluster state that is not part of a conversion's snapshot.

use anyhow::Result;
use dataplane_controller_k8s_api::{self as k8s, ResourceExt};
use kube::runtime::reflector::{ObjectRef, Store};

/// Looks up Services by namespace and name.
///
/// Returns `Ok(None)` when the Service does not exist. Errors indicate that the lookup itself
/// failed and may succeed on a later attempt.
#[async_trait::async_trait]
pub trait ServiceLookup: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<k8s::Service>>;
}

/// Lists the cluster's Nodes.
#[async_trait::async_trait]
pub trait NodeAccessor: Send + Sync {
    async fn list(&self) -> Result<Vec<k8s::Node>>;

    async fn get(&self, name: &str) -> Result<Option<k8s::Node>> {
        let nodes = self.list().await?;
        Ok(nodes.into_iter().find(|node| node.name_any() == name))
    }
}

// === impl Store ===

#[async_trait::async_trait]
impl ServiceLookup for Store<k8s::Service> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<k8s::Service>> {
        let svc = Store::get(self, &ObjectRef::new(name).within(namespace));
        Ok(svc.map(|svc| (*svc).clone()))
    }
}

#[async_trait::async_trait]
impl NodeAccessor for Store<k8s::Node> {
    async fn list(&self) -> Result<Vec<k8s::Node>> {
        Ok(self.state().iter().map(|node| (**node).clone()).collect())
    }

    async fn get(&self, name: &str) -> Result<Option<k8s::Node>> {
        Ok(Store::get(self, &ObjectRef::new(name)).map(|node| (*node).clone()))
    }
}

// === impl Vec ===

#[async_trait::async_trait]
impl ServiceLookup for Vec<k8s::Service> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<k8s::Service>> {
        Ok(self
            .iter()
            .find(|svc| svc.namespace().as_deref() == Some(namespace) && svc.name_any() == name)
            .cloned())
    }
}

#[async_trait::async_trait]
impl NodeAccessor for Vec<k8s::Node> {
    async fn list(&self) -> Result<Vec<k8s::Node>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::runtime::{reflector, watcher};

    fn svc(ns: &str, name: &str) -> k8s::Service {
        k8s::Service {
            metadata: k8s::ObjectMeta {
                namespace: Some(ns.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn node(name: &str) -> k8s::Node {
        k8s::Node {
            metadata: k8s::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn store_lookups() {
        let (services, mut writer) = reflector::store::<k8s::Service>();
        writer.apply_watcher_event(&watcher::Event::Apply(svc("ns-0", "demo")));

        let found = ServiceLookup::get(&services, "ns-0", "demo").await.unwrap();
        assert_eq!(found.map(|s| s.name_any()), Some("demo".to_string()));
        assert!(ServiceLookup::get(&services, "ns-1", "demo")
            .await
            .unwrap()
            .is_none());

        let (nodes, mut writer) = reflector::store::<k8s::Node>();
        writer.apply_watcher_event(&watcher::Event::Apply(node("node-0")));
        assert_eq!(nodes.list().await.unwrap().len(), 1);
        assert!(NodeAccessor::get(&nodes, "node-0").await.unwrap().is_some());
        assert!(NodeAccessor::get(&nodes, "node-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn in_memory_lookups() {
        let services = vec![svc("ns-0", "demo"), svc("ns-1", "other")];
        assert!(ServiceLookup::get(&services, "ns-1", "other")
            .await
            .unwrap()
            .is_some());
        assert!(ServiceLookup::get(&services, "ns-0", "other")
            .await
            .unwrap()
            .is_none());

        let nodes = vec![node("node-0"), node("node-1")];
        let found = NodeAccessor::get(&nodes, "node-1").await.unwrap();
        assert_eq!(found.map(|n| n.name_any()), Some("node-1".to_string()));
    }
}
