use std::{fmt, num::NonZeroU16, str::FromStr};

/// Identifies a mesh service.
///
/// The wire form is `<name>_<namespace>_svc_<port>` for a Service port, or
/// `<name>_<namespace>_svc` for a workload that no Service selects. The wire form is persisted
/// in dataplane tags and must remain byte-stable.
///
/// Kubernetes object names never contain `_`, so the encoding is unambiguous for every identity
/// derived from cluster objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceIdentity {
    pub name: String,
    pub namespace: String,

    /// The Service port, or `None` for a serviceless identity, which has no routable port.
    pub port: Option<NonZeroU16>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedIdentity {
    #[error("service tag {tag:?} has {segments} segments; expected 3 or 4")]
    Segments { tag: String, segments: usize },

    #[error("service tag {0:?} does not contain a 'svc' segment")]
    MissingSvc(String),

    #[error("service tag {0:?} has an empty name or namespace")]
    Empty(String),

    #[error("service tag {tag:?} has an invalid port: {source}")]
    Port {
        tag: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// The port is numeric but not in its canonical form, e.g. `080` or `+80`. Such a tag would
    /// alias the canonical one.
    #[error("service tag {0:?} has a non-canonical port")]
    NonCanonicalPort(String),
}

const SVC: &str = "svc";

// === impl ServiceIdentity ===

impl ServiceIdentity {
    pub fn service(name: impl Into<String>, namespace: impl Into<String>, port: NonZeroU16) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            port: Some(port),
        }
    }

    pub fn serviceless(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            port: None,
        }
    }

    pub fn is_serviceless(&self) -> bool {
        self.port.is_none()
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}_{}_{SVC}_{port}", self.name, self.namespace),
            None => write!(f, "{}_{}_{SVC}", self.name, self.namespace),
        }
    }
}

impl FromStr for ServiceIdentity {
    type Err = MalformedIdentity;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let segments = tag.split('_').collect::<Vec<_>>();
        let (name, namespace, svc, port) = match segments[..] {
            [name, namespace, svc] => (name, namespace, svc, None),
            [name, namespace, svc, port] => (name, namespace, svc, Some(port)),
            _ => {
                return Err(MalformedIdentity::Segments {
                    tag: tag.to_string(),
                    segments: segments.len(),
                })
            }
        };

        if svc != SVC {
            return Err(MalformedIdentity::MissingSvc(tag.to_string()));
        }
        if name.is_empty() || namespace.is_empty() {
            return Err(MalformedIdentity::Empty(tag.to_string()));
        }

        let port = match port {
            None => None,
            Some(segment) => {
                let port = segment
                    .parse::<NonZeroU16>()
                    .map_err(|source| MalformedIdentity::Port {
                        tag: tag.to_string(),
                        source,
                    })?;
                if port.to_string() != segment {
                    return Err(MalformedIdentity::NonCanonicalPort(tag.to_string()));
                }
                Some(port)
            }
        };

        Ok(Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};

    fn port(p: u16) -> NonZeroU16 {
        NonZeroU16::new(p).unwrap()
    }

    #[test]
    fn encodes_service_ports() {
        let id = ServiceIdentity::service("demo", "example", port(80));
        assert_eq!(id.to_string(), "demo_example_svc_80");
    }

    #[test]
    fn encodes_serviceless() {
        let id = ServiceIdentity::serviceless("demo", "example");
        assert_eq!(id.to_string(), "demo_example_svc");
        assert!(id.is_serviceless());
    }

    #[test]
    fn decodes_what_it_encodes() {
        for id in [
            ServiceIdentity::service("demo", "example", port(80)),
            ServiceIdentity::service("demo-headless", "kuma-demo", port(65535)),
            ServiceIdentity::service("a", "b", port(1)),
            ServiceIdentity::serviceless("backend-v1", "kuma-demo"),
        ] {
            let tag = id.to_string();
            assert_eq!(tag.parse::<ServiceIdentity>(), Ok(id), "{tag}");
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            "demo".parse::<ServiceIdentity>(),
            Err(MalformedIdentity::Segments { segments: 1, .. })
        ));
        assert!(matches!(
            "demo_example_svc_80_extra".parse::<ServiceIdentity>(),
            Err(MalformedIdentity::Segments { segments: 5, .. })
        ));
        assert!(matches!(
            "demo_example_svx_80".parse::<ServiceIdentity>(),
            Err(MalformedIdentity::MissingSvc(_))
        ));
        assert!(matches!(
            "_example_svc".parse::<ServiceIdentity>(),
            Err(MalformedIdentity::Empty(_))
        ));
        assert!(matches!(
            "demo_example_svc_http".parse::<ServiceIdentity>(),
            Err(MalformedIdentity::Port { .. })
        ));
        assert!(
            "demo_example_svc_0".parse::<ServiceIdentity>().is_err(),
            "port 0 is reserved"
        );
        assert!(
            "demo_example_svc_65536".parse::<ServiceIdentity>().is_err(),
            "port out of range"
        );
        for tag in ["demo_example_svc_080", "demo_example_svc_+80", "demo_example_svc_00080"] {
            assert_eq!(
                tag.parse::<ServiceIdentity>(),
                Err(MalformedIdentity::NonCanonicalPort(tag.to_string())),
                "{tag}"
            );
        }
    }

    /// A DNS label, as Kubernetes requires of object names.
    #[derive(Clone, Debug)]
    struct Label(String);

    impl Arbitrary for Label {
        fn arbitrary(g: &mut Gen) -> Self {
            const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
            const INNER: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789-";
            let len = 1 + usize::arbitrary(g) % 63;
            let label = (0..len)
                .map(|i| {
                    let chars = if i == 0 || i == len - 1 { ALNUM } else { INNER };
                    char::from(*g.choose(chars).unwrap())
                })
                .collect();
            Label(label)
        }
    }

    quickcheck! {
        fn service_tags_round_trip(name: Label, namespace: Label, port: u16) -> TestResult {
            let Some(port) = NonZeroU16::new(port) else {
                return TestResult::discard();
            };
            let id = ServiceIdentity::service(name.0, namespace.0, port);
            TestResult::from_bool(id.to_string().parse::<ServiceIdentity>() == Ok(id))
        }

        fn serviceless_tags_round_trip(name: Label, namespace: Label) -> bool {
            let id = ServiceIdentity::serviceless(name.0, namespace.0);
            id.to_string().parse::<ServiceIdentity>() == Ok(id)
        }
    }
}
