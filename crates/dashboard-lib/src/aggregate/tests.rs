//! Grouping and rollup tests over hand-built pod sets

use super::*;
use crate::age::Age;
use crate::models::{Container, ContainerState, Pod, PodPhase, Resource};
use std::collections::BTreeMap;

fn container(pod: &str, namespace: &str, ready: bool) -> Container {
    Container {
        name: format!("{}-c", pod),
        pod_name: pod.to_string(),
        namespace: namespace.to_string(),
        image: "nginx:1.21".to_string(),
        state: if ready {
            ContainerState::Running
        } else {
            ContainerState::Waiting {
                reason: Some("CrashLoopBackOff".to_string()),
            }
        },
        ready,
        restart_count: 0,
        ports: vec![],
        limits: BTreeMap::new(),
    }
}

fn pod(name: &str, namespace: &str, node: Option<&str>, ready: &[bool]) -> Pod {
    Pod {
        name: name.to_string(),
        namespace: namespace.to_string(),
        phase: PodPhase::Running,
        containers: ready
            .iter()
            .map(|&r| container(name, namespace, r))
            .collect(),
        node: node.map(str::to_string),
        creation_timestamp: None,
        age: Age::Unknown,
    }
}

fn scenario() -> Vec<Pod> {
    vec![
        pod("a", "default", Some("n1"), &[true]),
        pod("b", "default", Some("n1"), &[false]),
        pod("c", "db", Some("n2"), &[true]),
    ]
}

#[test]
fn test_scenario_by_namespace() {
    let pods = scenario();
    let groups = group_by_namespace(&pods);

    let namespaces: Vec<_> = groups.namespaces().collect();
    assert_eq!(namespaces, vec!["default", "db"]);

    let default = groups.get("default").unwrap();
    assert_eq!(default.rollup.total_pods, 2);
    assert_eq!(default.rollup.total_containers, 2);
    assert_eq!(default.rollup.healthy_containers, 1);
    assert!(!default.is_healthy());

    let db = groups.get("db").unwrap();
    assert_eq!(db.rollup.total_pods, 1);
    assert_eq!(db.rollup.total_containers, 1);
    assert_eq!(db.rollup.healthy_containers, 1);
    assert!(db.is_healthy());
}

#[test]
fn test_scenario_by_node() {
    let pods = scenario();
    let nodes = group_by_node(&pods);

    assert_eq!(nodes.len(), 2);
    assert!(!nodes.named("n1").unwrap().is_healthy());
    assert!(nodes.named("n2").unwrap().is_healthy());
    assert!(nodes.unknown().is_none());
}

#[test]
fn test_empty_input_yields_empty_groups() {
    assert!(group_by_namespace(&[]).is_empty());
    assert!(group_by_node(&[]).is_empty());

    let rollup = summarize(&[]);
    assert_eq!(rollup, HealthRollup::default());
    assert!(!rollup.is_healthy());
}

#[test]
fn test_namespace_order_follows_first_occurrence() {
    let pods = vec![
        pod("1", "zeta", None, &[true]),
        pod("2", "alpha", None, &[true]),
        pod("3", "zeta", None, &[true]),
        pod("4", "mid", None, &[true]),
        pod("5", "alpha", None, &[true]),
    ];
    let groups = group_by_namespace(&pods);

    let namespaces: Vec<_> = groups.namespaces().collect();
    assert_eq!(namespaces, vec!["zeta", "alpha", "mid"]);

    let zeta: Vec<_> = groups
        .get("zeta")
        .unwrap()
        .pods
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(zeta, vec!["1", "3"]);
}

#[test]
fn test_flattening_groups_reproduces_input() {
    let pods = vec![
        pod("a", "default", Some("n1"), &[true]),
        pod("b", "kube-system", Some("n2"), &[true, false]),
        pod("c", "default", None, &[]),
        pod("a", "default", Some("n1"), &[true]),
        pod("d", "db", Some("n1"), &[false]),
    ];

    let mut flattened: Vec<&Pod> = group_by_namespace(&pods)
        .iter()
        .flat_map(|g| g.pods.iter().copied())
        .collect();
    let mut original: Vec<&Pod> = pods.iter().collect();

    let by_identity = |p: &&Pod| (p.namespace.clone(), p.name.clone(), p.node.clone());
    flattened.sort_by_key(by_identity);
    original.sort_by_key(by_identity);
    assert_eq!(flattened, original);

    let node_total: usize = group_by_node(&pods).iter().map(|g| g.pods.len()).sum();
    assert_eq!(node_total, pods.len());
}

#[test]
fn test_zero_container_pod_is_never_healthy() {
    let pods = vec![pod("lonely", "empty", Some("n1"), &[])];

    let groups = group_by_namespace(&pods);
    let group = groups.get("empty").unwrap();
    assert_eq!(group.rollup.total_containers, 0);
    assert_eq!(group.rollup.healthy_containers, 0);
    assert!(!group.is_healthy());

    assert!(!group_by_node(&pods).named("n1").unwrap().is_healthy());
}

#[test]
fn test_healthy_containers_never_exceed_total() {
    let pods = vec![
        pod("a", "x", None, &[true, true, false]),
        pod("b", "x", None, &[false]),
        pod("c", "y", None, &[true, true]),
        pod("d", "z", None, &[]),
    ];

    for group in &group_by_namespace(&pods) {
        let r = group.rollup;
        assert!(r.healthy_containers <= r.total_containers);
        let all_ready = r.total_containers > 0 && r.healthy_containers == r.total_containers;
        assert_eq!(group.is_healthy(), all_ready);
    }

    assert!(group_by_namespace(&pods).get("y").unwrap().is_healthy());
}

#[test]
fn test_unset_nodes_only_in_unknown_group() {
    let pods = vec![
        pod("a", "default", None, &[true]),
        pod("b", "default", Some(""), &[true]),
        pod("c", "default", Some("Unknown"), &[true]),
        pod("d", "default", Some("n1"), &[true]),
    ];
    let nodes = group_by_node(&pods);

    let unknown = nodes.unknown().unwrap();
    let names: Vec<_> = unknown.pods.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(unknown.node.to_string(), "Unknown Node");

    for group in nodes.iter().filter(|g| g.node != NodeKey::Unknown) {
        assert!(group.pods.iter().all(|p| NodeKey::of(p) != NodeKey::Unknown));
    }
    assert_eq!(nodes.named("n1").unwrap().pods.len(), 1);
}

#[test]
fn test_node_names_match_exactly() {
    let pods = vec![
        pod("a", "default", Some("n1"), &[true]),
        pod("b", "default", Some(" n1"), &[true]),
    ];
    let nodes = group_by_node(&pods);

    assert_eq!(nodes.named("n1").unwrap().pods.len(), 1);
    assert_eq!(nodes.named(" n1").unwrap().pods.len(), 1);
    assert!(nodes.unknown().is_none());
}

#[test]
fn test_node_counts_match_nested_namespace_sums() {
    let mut pods = vec![
        pod("a", "default", Some("n1"), &[true, false]),
        pod("b", "monitoring", Some("n1"), &[true]),
        pod("c", "default", Some("n1"), &[true]),
        pod("d", "default", Some("n2"), &[false]),
    ];
    pods[1].phase = PodPhase::Pending;

    for node in &group_by_node(&pods) {
        let pods_sum: usize = node.namespaces.iter().map(|g| g.rollup.total_pods).sum();
        let healthy_pods: usize = node.namespaces.iter().map(|g| g.rollup.healthy_pods).sum();
        let containers: usize = node
            .namespaces
            .iter()
            .map(|g| g.rollup.total_containers)
            .sum();
        let healthy: usize = node
            .namespaces
            .iter()
            .map(|g| g.rollup.healthy_containers)
            .sum();

        assert_eq!(node.rollup.total_pods, pods_sum);
        assert_eq!(node.rollup.healthy_pods, healthy_pods);
        assert_eq!(node.rollup.total_containers, containers);
        assert_eq!(node.rollup.healthy_containers, healthy);
    }

    let n1 = group_by_node(&pods);
    let n1 = n1.named("n1").unwrap();
    let nested: Vec<_> = n1.namespaces.namespaces().collect();
    assert_eq!(nested, vec!["default", "monitoring"]);
    assert!(!n1.namespaces.get("default").unwrap().is_healthy());
    assert!(n1.namespaces.get("monitoring").unwrap().is_healthy());
    assert_eq!(n1.rollup.unhealthy_pods(), 1);
}

#[test]
fn test_pod_phase_drives_pod_counts_not_verdict() {
    let mut pods = vec![pod("a", "jobs", None, &[true])];
    pods[0].phase = PodPhase::Failed;

    let groups = group_by_namespace(&pods);
    let group = groups.get("jobs").unwrap();
    assert_eq!(group.rollup.healthy_pods, 0);
    assert_eq!(group.rollup.unhealthy_pods(), 1);
    assert!(group.is_healthy());
}

#[test]
fn test_summarize_counts_everything() {
    let pods = scenario();
    let rollup = summarize(&pods);

    assert_eq!(rollup.total_pods, 3);
    assert_eq!(rollup.healthy_pods, 3);
    assert_eq!(rollup.total_containers, 3);
    assert_eq!(rollup.healthy_containers, 2);
    assert!(!rollup.is_healthy());
}

#[test]
fn test_group_resources_by_kind_filters_and_orders() {
    let resource = |name: &str, ty: &str| Resource {
        name: name.to_string(),
        resource_type: ty.to_string(),
        location: "eastus".to_string(),
        resource_group: "rg".to_string(),
        tags: BTreeMap::new(),
    };
    let resources = vec![
        resource("transact", "Microsoft.ContainerService/managedClusters"),
        resource("store", "Microsoft.Storage/storageAccounts"),
        resource("registry", "Microsoft.ContainerRegistry/registries"),
        resource("transact-2", "Microsoft.ContainerService/managedClusters"),
    ];

    let groups = group_resources_by_kind(&resources);
    let kinds: Vec<_> = groups.iter().map(|g| g.kind).collect();
    assert_eq!(kinds, vec!["managedClusters", "registries"]);
    assert_eq!(groups[0].resources.len(), 2);
}
