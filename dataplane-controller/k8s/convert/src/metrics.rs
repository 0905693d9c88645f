use dataplane_controller_core::{AggregateMetrics, Metrics};
use dataplane_controller_k8s_api::{Annotations, InvalidAnnotation};
use regex::Regex;
use std::{collections::BTreeSet, sync::OnceLock};

pub const PATH: &str = "prometheus.metrics.kuma.io/path";
pub const PORT: &str = "prometheus.metrics.kuma.io/port";

const AGGREGATE_PREFIX: &str = "prometheus.metrics.kuma.io/aggregate-";
const DEFAULT_PATH: &str = "/metrics";

fn aggregate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^prometheus\.metrics\.kuma\.io/aggregate-([a-zA-Z0-9-]+)-(port|path|address|enabled)$")
            .expect("aggregate pattern must compile")
    })
}

/// Reads the workload's metrics overrides. Returns `None` when no metrics annotation is set.
pub(crate) fn from_annotations(anns: Annotations<'_>) -> Result<Option<Metrics>, InvalidAnnotation> {
    let path = anns.get(PATH).filter(|p| !p.is_empty()).map(ToString::to_string);
    let port = anns.get_port(PORT)?;
    let aggregate = aggregates(anns)?;
    if path.is_none() && port.is_none() && aggregate.is_empty() {
        return Ok(None);
    }
    Ok(Some(Metrics {
        path,
        port,
        aggregate,
    }))
}

/// Reads the per-application scrape configurations, ordered by application name.
fn aggregates(anns: Annotations<'_>) -> Result<Vec<AggregateMetrics>, InvalidAnnotation> {
    let names = anns
        .iter()
        .filter_map(|(key, _)| aggregate_pattern().captures(key))
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str())
        .collect::<BTreeSet<_>>();

    names
        .into_iter()
        .map(|name| {
            let key = |field: &str| format!("{AGGREGATE_PREFIX}{name}-{field}");
            let enabled = anns.get_enabled(&key("enabled"))?.unwrap_or(true);
            let port = match anns.get_port(&key("port"))? {
                Some(port) => port,
                None if !enabled => 0,
                None => {
                    return Err(InvalidAnnotation {
                        key: key("port"),
                        value: String::new(),
                        reason: "a port is required to scrape metrics".to_string(),
                    })
                }
            };
            Ok(AggregateMetrics {
                name: name.to_string(),
                path: anns.get(&key("path")).unwrap_or(DEFAULT_PATH).to_string(),
                port,
                address: anns.get(&key("address")).map(ToString::to_string),
                enabled,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_annotations() {
        let anns = btreemap! {};
        assert_eq!(from_annotations(Annotations::from_map(&anns)), Ok(None));
    }

    #[test]
    fn overrides_and_aggregates() {
        let anns = btreemap! {
            PATH.to_string() => "/stats".to_string(),
            PORT.to_string() => "5670".to_string(),
            "prometheus.metrics.kuma.io/aggregate-sidecar-port".to_string() => "1234".to_string(),
            "prometheus.metrics.kuma.io/aggregate-app-port".to_string() => "8080".to_string(),
            "prometheus.metrics.kuma.io/aggregate-app-path".to_string() => "/prom".to_string(),
            "prometheus.metrics.kuma.io/aggregate-app-address".to_string() => "127.0.0.2".to_string(),
            "prometheus.metrics.kuma.io/aggregate-off-enabled".to_string() => "false".to_string(),
        };
        assert_eq!(
            from_annotations(Annotations::from_map(&anns)),
            Ok(Some(Metrics {
                path: Some("/stats".to_string()),
                port: Some(5670),
                aggregate: vec![
                    AggregateMetrics {
                        name: "app".to_string(),
                        path: "/prom".to_string(),
                        port: 8080,
                        address: Some("127.0.0.2".to_string()),
                        enabled: true,
                    },
                    AggregateMetrics {
                        name: "off".to_string(),
                        path: DEFAULT_PATH.to_string(),
                        port: 0,
                        address: None,
                        enabled: false,
                    },
                    AggregateMetrics {
                        name: "sidecar".to_string(),
                        path: DEFAULT_PATH.to_string(),
                        port: 1234,
                        address: None,
                        enabled: true,
                    },
                ],
            }))
        );
    }

    #[test]
    fn enabled_aggregate_requires_port() {
        let anns = btreemap! {
            "prometheus.metrics.kuma.io/aggregate-app-path".to_string() => "/prom".to_string(),
        };
        let err = from_annotations(Annotations::from_map(&anns)).unwrap_err();
        assert_eq!(err.key, "prometheus.metrics.kuma.io/aggregate-app-port");
    }
}
