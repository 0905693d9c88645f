use crate::{Pod, ResourceExt, Service};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Clone, Debug, Eq, Default)]
pub struct Labels(Arc<Map>);

pub type Map = BTreeMap<String, String>;

/// A Service's pod selector.
///
/// Unlike workload selectors, Service selectors only support exact label matches. A Service
/// without a selector selects nothing: its endpoints are managed out-of-band.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Selector(Option<Map>);

// === Selector ===

impl Selector {
    pub fn from_map(map: Map) -> Self {
        Self(Some(map))
    }

    pub fn from_service(svc: &Service) -> Self {
        Self(
            svc.spec
                .as_ref()
                .and_then(|spec| spec.selector.clone())
                .filter(|sel| !sel.is_empty()),
        )
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        match self.0.as_ref() {
            None => false,
            Some(match_labels) => match_labels
                .iter()
                .all(|(k, v)| labels.0.get(k) == Some(v)),
        }
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Selector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Returns the Services in the pod's namespace whose selector matches the pod.
pub fn services_selecting<'s>(
    pod: &Pod,
    services: impl IntoIterator<Item = &'s Service>,
) -> Vec<&'s Service> {
    let labels = Labels::from(pod.labels().clone());
    let ns = pod.namespace();
    services
        .into_iter()
        .filter(|svc| svc.namespace() == ns)
        .filter(|svc| Selector::from_service(svc).matches(&labels))
        .collect()
}

// === Labels ===

impl From<Map> for Labels {
    #[inline]
    fn from(labels: Map) -> Self {
        Self(Arc::new(labels))
    }
}

impl AsRef<Map> for Labels {
    #[inline]
    fn as_ref(&self) -> &Map {
        self.0.as_ref()
    }
}

impl<T: AsRef<Map>> std::cmp::PartialEq<T> for Labels {
    #[inline]
    fn eq(&self, t: &T) -> bool {
        self.0.as_ref().eq(t.as_ref())
    }
}

impl std::iter::FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Labels {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
