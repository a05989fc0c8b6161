//! Fixed demonstration dataset used when live collection fails

use crate::age::Age;
use crate::models::{Container, ContainerState, Pod, PodPhase, PortMapping};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::BTreeMap;

const NODE_0: &str = "aks-nodepool1-12345678-vmss000000";
const NODE_1: &str = "aks-nodepool1-12345678-vmss000001";
const NODE_2: &str = "aks-nodepool1-12345678-vmss000002";

struct ContainerSeed {
    name: &'static str,
    image: &'static str,
    restarts: u32,
    port: Option<u16>,
    cpu: &'static str,
    memory: &'static str,
}

struct PodSeed {
    name: &'static str,
    namespace: &'static str,
    node: &'static str,
    age: Duration,
    containers: &'static [ContainerSeed],
}

fn seeds() -> Vec<PodSeed> {
    vec![
        PodSeed {
            name: "nginx-deployment-7d4f8b8b8b",
            namespace: "default",
            node: NODE_0,
            age: Duration::days(2),
            containers: &[ContainerSeed {
                name: "nginx",
                image: "nginx:1.21",
                restarts: 0,
                port: Some(80),
                cpu: "100m",
                memory: "128Mi",
            }],
        },
        PodSeed {
            name: "redis-master-6b7d8c9d0e",
            namespace: "default",
            node: NODE_1,
            age: Duration::days(1),
            containers: &[ContainerSeed {
                name: "redis",
                image: "redis:6.2-alpine",
                restarts: 1,
                port: Some(6379),
                cpu: "200m",
                memory: "256Mi",
            }],
        },
        PodSeed {
            name: "postgres-db-9e8f7g6h5i",
            namespace: "database",
            node: NODE_2,
            age: Duration::days(3),
            containers: &[ContainerSeed {
                name: "postgres",
                image: "postgres:13",
                restarts: 0,
                port: Some(5432),
                cpu: "500m",
                memory: "1Gi",
            }],
        },
        PodSeed {
            name: "api-gateway-4j3k2l1m0n",
            namespace: "api",
            node: NODE_0,
            age: Duration::hours(6),
            containers: &[
                ContainerSeed {
                    name: "api-gateway",
                    image: "nginx:1.21",
                    restarts: 0,
                    port: Some(80),
                    cpu: "150m",
                    memory: "200Mi",
                },
                ContainerSeed {
                    name: "sidecar-proxy",
                    image: "envoyproxy/envoy:v1.20",
                    restarts: 0,
                    port: Some(8080),
                    cpu: "100m",
                    memory: "128Mi",
                },
            ],
        },
        PodSeed {
            name: "monitoring-prometheus-5o4p3q2r1s",
            namespace: "monitoring",
            node: NODE_1,
            age: Duration::days(1),
            containers: &[ContainerSeed {
                name: "prometheus",
                image: "prom/prometheus:v2.30.0",
                restarts: 0,
                port: Some(9090),
                cpu: "300m",
                memory: "512Mi",
            }],
        },
        PodSeed {
            name: "logging-fluentd-6t5u4v3w2x",
            namespace: "logging",
            node: NODE_2,
            age: Duration::days(4),
            containers: &[ContainerSeed {
                name: "fluentd",
                image: "fluent/fluentd-kubernetes-daemonset:v1.14",
                restarts: 2,
                port: None,
                cpu: "100m",
                memory: "200Mi",
            }],
        },
    ]
}

/// Deterministic synthetic pods, shaped like live data, aged relative to `now`
pub fn fallback_pods(now: DateTime<Utc>) -> Vec<Pod> {
    seeds()
        .into_iter()
        .map(|seed| {
            let created = now - seed.age;
            let containers = seed
                .containers
                .iter()
                .map(|c| Container {
                    name: c.name.to_string(),
                    pod_name: seed.name.to_string(),
                    namespace: seed.namespace.to_string(),
                    image: c.image.to_string(),
                    state: ContainerState::Running,
                    ready: true,
                    restart_count: c.restarts,
                    ports: c
                        .port
                        .map(|port| PortMapping {
                            container_port: port,
                            host_port: Some(port),
                            protocol: "TCP".to_string(),
                        })
                        .into_iter()
                        .collect(),
                    limits: BTreeMap::from([
                        ("cpu".to_string(), c.cpu.to_string()),
                        ("memory".to_string(), c.memory.to_string()),
                    ]),
                })
                .collect();

            Pod {
                name: seed.name.to_string(),
                namespace: seed.namespace.to_string(),
                phase: PodPhase::Running,
                containers,
                node: Some(seed.node.to_string()),
                creation_timestamp: Some(created.to_rfc3339_opts(SecondsFormat::Secs, true)),
                age: Age::between(created, now),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{group_by_namespace, group_by_node, summarize};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_pods(now()), fallback_pods(now()));
    }

    #[test]
    fn test_fallback_shape() {
        let pods = fallback_pods(now());
        assert_eq!(pods.len(), 6);

        let ages: Vec<_> = pods.iter().map(|p| p.age.to_string()).collect();
        assert_eq!(ages, vec!["2d", "1d", "3d", "6h", "1d", "4d"]);

        let namespaces: Vec<_> = group_by_namespace(&pods).namespaces().collect();
        assert_eq!(
            namespaces,
            vec!["default", "database", "api", "monitoring", "logging"]
        );
        assert_eq!(group_by_node(&pods).len(), 3);

        let summary = summarize(&pods);
        assert_eq!(summary.total_containers, 7);
        assert!(summary.is_healthy());
    }

    #[test]
    fn test_fallback_timestamps_round_trip_to_ages() {
        for pod in fallback_pods(now()) {
            let recomputed = Age::from_timestamp(pod.creation_timestamp.as_deref(), now());
            assert_eq!(recomputed, pod.age);
        }
    }
}
