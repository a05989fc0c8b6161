//! Pod listing through the `kubectl` CLI
//!
//! The listing is decoded into `k8s-openapi` core types, whose optional
//! fields fall back to defaults when absent.

use super::{async_trait, PodSource};
use crate::age::Age;
use crate::error::CollectError;
use crate::models::{Container, ContainerState, Pod, PodPhase, PortMapping};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default bound on a single `kubectl` invocation
pub const DEFAULT_KUBECTL_TIMEOUT: Duration = Duration::from_secs(30);

/// Lists pods across all namespaces with `kubectl get pods -o json`
#[derive(Debug, Clone)]
pub struct KubectlPodSource {
    program: PathBuf,
    timeout: Duration,
}

impl Default for KubectlPodSource {
    fn default() -> Self {
        Self::new("kubectl", DEFAULT_KUBECTL_TIMEOUT)
    }
}

impl KubectlPodSource {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PodSource for KubectlPodSource {
    async fn list_pods(
        &self,
        kubeconfig: &Path,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pod>, CollectError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--kubeconfig")
            .arg(kubeconfig)
            .args(["get", "pods", "--all-namespaces", "-o", "json"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), "Running kubectl");
        // Dropping the future on timeout kills the child
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CollectError::CliTimeout(self.timeout))?
            .map_err(CollectError::CliSpawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), stderr = %stderr, "kubectl command failed");
            return Err(CollectError::CliFailed {
                code: output.status.code(),
                stderr,
            });
        }

        parse_pod_list(&output.stdout, now)
    }
}

#[derive(Deserialize)]
struct PodListJson {
    #[serde(default)]
    items: Vec<Value>,
}

/// Decode `kubectl get pods -o json` output into pod snapshots
///
/// Items are decoded one by one; an item that does not fit the pod schema is
/// skipped with a warning instead of failing the listing.
pub fn parse_pod_list(json: &[u8], now: DateTime<Utc>) -> Result<Vec<Pod>, CollectError> {
    let list: PodListJson = serde_json::from_slice(json)
        .map_err(|e| CollectError::Decode(format!("kubectl output: {}", e)))?;

    let mut pods = Vec::with_capacity(list.items.len());
    for (index, item) in list.items.into_iter().enumerate() {
        match pod_from_value(item, now) {
            Ok(pod) => pods.push(pod),
            Err(e) => warn!(index, error = %e, "Skipping undecodable pod"),
        }
    }
    Ok(pods)
}

fn pod_from_value(mut item: Value, now: DateTime<Utc>) -> Result<Pod, serde_json::Error> {
    // Split off the raw instant so a malformed one degrades to an unknown age
    let creation_timestamp = item
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .and_then(|metadata| metadata.remove("creationTimestamp"))
        .and_then(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    let pod: k8s::Pod = serde_json::from_value(item)?;
    Ok(pod_from_k8s(pod, creation_timestamp, now))
}

fn pod_from_k8s(pod: k8s::Pod, creation_timestamp: Option<String>, now: DateTime<Utc>) -> Pod {
    let name = pod.metadata.name.unwrap_or_default();
    let namespace = pod.metadata.namespace.unwrap_or_default();
    let spec = pod.spec.unwrap_or_default();
    let status = pod.status.unwrap_or_default();
    let age = Age::from_timestamp(creation_timestamp.as_deref(), now);

    let specs: BTreeMap<&str, &k8s::Container> =
        spec.containers.iter().map(|c| (c.name.as_str(), c)).collect();

    let containers = status
        .container_statuses
        .unwrap_or_default()
        .into_iter()
        .map(|s| {
            let container_spec = specs.get(s.name.as_str()).copied();
            Container {
                pod_name: name.clone(),
                namespace: namespace.clone(),
                image: s.image,
                state: state_from_k8s(s.state),
                ready: s.ready,
                restart_count: u32::try_from(s.restart_count).unwrap_or_default(),
                ports: container_spec.map(ports_from_spec).unwrap_or_default(),
                limits: container_spec.map(limits_from_spec).unwrap_or_default(),
                name: s.name,
            }
        })
        .collect();

    let node = spec
        .node_name
        .filter(|n| !n.is_empty())
        .or(status.host_ip.filter(|ip| !ip.is_empty()));

    Pod {
        name,
        namespace,
        phase: PodPhase::parse(status.phase.as_deref().unwrap_or("")),
        containers,
        node,
        creation_timestamp,
        age,
    }
}

fn state_from_k8s(state: Option<k8s::ContainerState>) -> ContainerState {
    match state {
        Some(k8s::ContainerState {
            running: Some(_), ..
        }) => ContainerState::Running,
        Some(k8s::ContainerState {
            waiting: Some(w), ..
        }) => ContainerState::Waiting { reason: w.reason },
        Some(k8s::ContainerState {
            terminated: Some(t),
            ..
        }) => ContainerState::Terminated {
            reason: t.reason,
            exit_code: t.exit_code,
        },
        _ => ContainerState::Unknown,
    }
}

fn ports_from_spec(spec: &k8s::Container) -> Vec<PortMapping> {
    spec.ports
        .iter()
        .flatten()
        .map(|p| PortMapping {
            container_port: u16::try_from(p.container_port).unwrap_or_default(),
            host_port: p.host_port.and_then(|h| u16::try_from(h).ok()),
            protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
        })
        .collect()
}

fn limits_from_spec(spec: &k8s::Container) -> BTreeMap<String, String> {
    spec.resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .map(|limits| {
            limits
                .iter()
                .map(|(k, Quantity(q))| (k.clone(), q.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    const POD_LIST: &str = r#"{
        "apiVersion": "v1",
        "kind": "List",
        "items": [
            {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "name": "web-6d4cf56db6-abcde",
                    "namespace": "default",
                    "creationTimestamp": "2024-05-08T12:00:00Z"
                },
                "spec": {
                    "nodeName": "aks-nodepool1-1-vmss000000",
                    "containers": [
                        {
                            "name": "web",
                            "image": "nginx:1.21",
                            "ports": [{"containerPort": 80, "protocol": "TCP"}],
                            "resources": {"limits": {"cpu": "100m", "memory": "128Mi"}}
                        },
                        {"name": "sidecar", "image": "envoyproxy/envoy:v1.20"}
                    ]
                },
                "status": {
                    "phase": "Running",
                    "hostIP": "10.224.0.4",
                    "containerStatuses": [
                        {
                            "name": "web",
                            "image": "nginx:1.21",
                            "imageID": "",
                            "ready": true,
                            "restartCount": 0,
                            "state": {"running": {"startedAt": "2024-05-08T12:00:05Z"}}
                        },
                        {
                            "name": "sidecar",
                            "image": "envoyproxy/envoy:v1.20",
                            "imageID": "",
                            "ready": false,
                            "restartCount": 7,
                            "state": {"waiting": {"reason": "CrashLoopBackOff"}}
                        }
                    ]
                }
            },
            {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {
                    "name": "job-1",
                    "namespace": "batch",
                    "creationTimestamp": "not-a-time"
                },
                "spec": {"containers": [{"name": "job"}]},
                "status": {
                    "phase": "Succeeded",
                    "hostIP": "10.224.0.5",
                    "containerStatuses": [
                        {
                            "name": "job",
                            "image": "busybox",
                            "imageID": "",
                            "ready": false,
                            "restartCount": 0,
                            "state": {"terminated": {"reason": "Completed", "exitCode": 0}}
                        }
                    ]
                }
            },
            {
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": {"name": "pending-1", "namespace": "batch"},
                "status": {"phase": "Pending"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_pod_list_maps_fields() {
        let pods = parse_pod_list(POD_LIST.as_bytes(), now()).unwrap();
        assert_eq!(pods.len(), 3);

        let web = &pods[0];
        assert_eq!(web.name, "web-6d4cf56db6-abcde");
        assert_eq!(web.phase, PodPhase::Running);
        assert_eq!(web.node.as_deref(), Some("aks-nodepool1-1-vmss000000"));
        assert_eq!(web.age, Age::Days(2));
        assert_eq!(web.creation_timestamp.as_deref(), Some("2024-05-08T12:00:00Z"));
        assert_eq!(web.readiness().ready, 1);
        assert_eq!(web.readiness().total, 2);

        let container = &web.containers[0];
        assert_eq!(container.pod_name, web.name);
        assert_eq!(container.namespace, "default");
        assert_eq!(container.state, ContainerState::Running);
        assert_eq!(container.ports[0].container_port, 80);
        assert_eq!(container.limits.get("cpu").map(String::as_str), Some("100m"));

        let sidecar = &web.containers[1];
        assert_eq!(sidecar.restart_count, 7);
        assert_eq!(
            sidecar.state,
            ContainerState::Waiting {
                reason: Some("CrashLoopBackOff".to_string())
            }
        );
        assert!(sidecar.ports.is_empty());
    }

    #[test]
    fn test_parse_pod_list_tolerates_missing_fields() {
        let pods = parse_pod_list(POD_LIST.as_bytes(), now()).unwrap();

        let job = &pods[1];
        assert_eq!(job.age, Age::Unknown);
        assert_eq!(job.phase, PodPhase::Other("Succeeded".to_string()));
        // No nodeName in the spec, so the host IP stands in
        assert_eq!(job.node.as_deref(), Some("10.224.0.5"));
        assert_eq!(
            job.containers[0].state,
            ContainerState::Terminated {
                reason: Some("Completed".to_string()),
                exit_code: 0
            }
        );

        let pending = &pods[2];
        assert!(pending.containers.is_empty());
        assert!(pending.node.is_none());
        assert_eq!(pending.age, Age::Unknown);
    }

    #[test]
    fn test_parse_pod_list_rejects_garbage() {
        let err = parse_pod_list(b"error: You must be logged in", now()).unwrap_err();
        assert!(matches!(err, CollectError::Decode(_)));
    }

    #[test]
    fn test_parse_empty_list() {
        let pods = parse_pod_list(br#"{"apiVersion":"v1","items":[],"kind":"List"}"#, now()).unwrap();
        assert!(pods.is_empty());
    }

    #[test]
    fn test_negative_restart_count_keeps_listing() {
        let json = br#"{"apiVersion": "v1", "kind": "List", "items": [
            {"apiVersion": "v1", "kind": "Pod",
             "metadata": {"name": "odd", "namespace": "default"},
             "status": {"phase": "Running", "containerStatuses": [
                {"name": "app", "image": "app:1", "imageID": "", "ready": true,
                 "restartCount": -1, "state": {"running": {}}}
             ]}},
            {"apiVersion": "v1", "kind": "Pod",
             "metadata": {"name": "fine", "namespace": "default"},
             "status": {"phase": "Running"}}
        ]}"#;

        let pods = parse_pod_list(json, now()).unwrap();
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].containers[0].restart_count, 0);
        assert_eq!(pods[0].containers[0].state, ContainerState::Running);
    }

    #[test]
    fn test_undecodable_item_is_skipped() {
        let json = br#"{"apiVersion": "v1", "kind": "List", "items": [
            {"apiVersion": "v1", "kind": "Pod",
             "metadata": {"name": "broken", "namespace": "default"},
             "status": {"containerStatuses": [
                {"name": "app", "image": "app:1", "imageID": "", "ready": true,
                 "restartCount": "many"}
             ]}},
            {"apiVersion": "v1", "kind": "Pod",
             "metadata": {"name": "fine", "namespace": "default"},
             "status": {"phase": "Running"}}
        ]}"#;

        let pods = parse_pod_list(json, now()).unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].name, "fine");
    }

    #[test]
    fn test_empty_node_name_falls_back_to_host_ip() {
        let json = br#"{"apiVersion": "v1", "kind": "List", "items": [
            {"apiVersion": "v1", "kind": "Pod",
             "metadata": {"name": "web", "namespace": "default"},
             "spec": {"nodeName": "", "containers": []},
             "status": {"phase": "Running", "hostIP": "10.224.0.9"}}
        ]}"#;

        let pods = parse_pod_list(json, now()).unwrap();
        assert_eq!(pods[0].node.as_deref(), Some("10.224.0.9"));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_kubectl_output_is_parsed() {
            let dir = TempDir::new().unwrap();
            let fixture = dir.path().join("pods.json");
            std::fs::write(&fixture, POD_LIST).unwrap();
            let program = script(&dir, "kubectl", &format!("cat '{}'", fixture.display()));

            let source = KubectlPodSource::new(program, Duration::from_secs(10));
            let pods = source
                .list_pods(Path::new("/nonexistent/kubeconfig"), now())
                .await
                .unwrap();
            assert_eq!(pods.len(), 3);
        }

        #[tokio::test]
        async fn test_kubectl_nonzero_exit() {
            let dir = TempDir::new().unwrap();
            let program = script(&dir, "kubectl", "echo 'Unauthorized' >&2; exit 1");

            let source = KubectlPodSource::new(program, Duration::from_secs(10));
            let err = source
                .list_pods(Path::new("/nonexistent/kubeconfig"), now())
                .await
                .unwrap_err();
            match err {
                CollectError::CliFailed { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert_eq!(stderr, "Unauthorized");
                }
                other => panic!("expected CliFailed, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_kubectl_timeout() {
            let dir = TempDir::new().unwrap();
            let program = script(&dir, "kubectl", "sleep 10");

            let source = KubectlPodSource::new(program, Duration::from_millis(200));
            let started = std::time::Instant::now();
            let err = source
                .list_pods(Path::new("/nonexistent/kubeconfig"), now())
                .await
                .unwrap_err();

            assert!(matches!(err, CollectError::CliTimeout(_)));
            assert!(started.elapsed() < Duration::from_secs(5));
        }

        #[tokio::test]
        async fn test_missing_binary() {
            let source =
                KubectlPodSource::new("/nonexistent/bin/kubectl", Duration::from_secs(1));
            let err = source
                .list_pods(Path::new("/nonexistent/kubeconfig"), now())
                .await
                .unwrap_err();
            assert!(matches!(err, CollectError::CliSpawn(_)));
        }
    }
}
