//! Core data models for the dashboard
//!
//! Every record is a snapshot taken during one refresh cycle. Nothing here is
//! mutated after construction; the next refresh builds a fresh set.

use crate::age::Age;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Managed cluster metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub kubernetes_version: String,
    pub node_count: u32,
    pub vm_size: String,
    pub power_state: String,
    pub fqdn: Option<String>,
}

/// A resource from the resource group inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    /// Hierarchical type, e.g. `Microsoft.ContainerService/managedClusters`
    pub resource_type: String,
    pub location: String,
    pub resource_group: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

const CONTAINER_KEYWORDS: &[&str] = &["container", "pod", "deployment", "service", "namespace"];

impl Resource {
    /// Last segment of the resource type
    pub fn kind(&self) -> &str {
        self.resource_type
            .rsplit('/')
            .next()
            .unwrap_or(&self.resource_type)
    }

    /// Whether the resource belongs in the container inventory section
    pub fn is_container_related(&self) -> bool {
        let lowered = self.resource_type.to_lowercase();
        CONTAINER_KEYWORDS.iter().any(|k| lowered.contains(k))
    }
}

/// Pod lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodPhase {
    Running,
    Failed,
    Pending,
    Other(String),
}

impl PodPhase {
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Running" => PodPhase::Running,
            "Failed" => PodPhase::Failed,
            "Pending" => PodPhase::Pending,
            other => PodPhase::Other(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PodPhase::Running)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Other(s) if s.is_empty() => write!(f, "Unknown"),
            PodPhase::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Container state descriptor, independent of the ready flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ContainerState {
    Running,
    Waiting {
        reason: Option<String>,
    },
    Terminated {
        reason: Option<String>,
        exit_code: i32,
    },
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Running => write!(f, "running"),
            ContainerState::Waiting { reason: Some(r) } => write!(f, "waiting ({})", r),
            ContainerState::Waiting { reason: None } => write!(f, "waiting"),
            ContainerState::Terminated {
                reason: Some(r),
                exit_code,
            } => write!(f, "terminated ({}, exit {})", r, exit_code),
            ContainerState::Terminated {
                reason: None,
                exit_code,
            } => write!(f, "terminated (exit {})", exit_code),
            ContainerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// A container port exposure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub protocol: String,
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host_port.unwrap_or(self.container_port);
        write!(f, "{}:{}/{}", host, self.container_port, self.protocol)
    }
}

/// Container status within a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub pod_name: String,
    pub namespace: String,
    pub image: String,
    pub state: ContainerState,
    pub ready: bool,
    pub restart_count: u32,
    pub ports: Vec<PortMapping>,
    /// Resource limit name -> quantity, e.g. `cpu` -> `100m`
    pub limits: BTreeMap<String, String>,
}

/// Ready containers out of containers with a known status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: usize,
    pub total: usize,
}

/// Pod snapshot with its containers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub phase: PodPhase,
    pub containers: Vec<Container>,
    /// Hosting node; `None` when the pod is not scheduled or the source omitted it
    pub node: Option<String>,
    /// Raw creation timestamp as reported by the source
    pub creation_timestamp: Option<String>,
    pub age: Age,
}

impl Pod {
    /// Readiness ratio derived from the container list
    pub fn readiness(&self) -> Readiness {
        Readiness {
            ready: self.containers.iter().filter(|c| c.ready).count(),
            total: self.containers.len(),
        }
    }

    pub fn total_restarts(&self) -> u64 {
        self.containers.iter().map(|c| c.restart_count as u64).sum()
    }
}
