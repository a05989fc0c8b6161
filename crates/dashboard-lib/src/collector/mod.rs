//! Data collection from the cloud APIs and the cluster CLI
//!
//! Collaborators are passed in as trait objects so the pipeline can run
//! against the real Azure Resource Manager and `kubectl`, or against fakes.
//! Pod collection never fails: any error substitutes the fallback dataset.

mod arm;
mod fallback;
mod kubectl;


pub use arm::{ArmClient, ArmCredentials, ArmEndpoints};
pub use fallback::fallback_pods;
pub use kubectl::{parse_pod_list, KubectlPodSource};

use crate::error::CollectError;
use crate::models::{Cluster, Pod, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub use async_trait::async_trait;

/// Cloud inventory: managed cluster metadata, resource group listing and credentials
#[async_trait]
pub trait CloudInventory: Send + Sync {
    async fn cluster(&self, resource_group: &str, cluster_name: &str)
        -> Result<Cluster, CollectError>;

    async fn resources(&self, resource_group: &str) -> Result<Vec<Resource>, CollectError>;

    /// Admin kubeconfig for the cluster, `None` if the API returned none
    async fn admin_kubeconfig(
        &self,
        resource_group: &str,
        cluster_name: &str,
    ) -> Result<Option<String>, CollectError>;
}

/// Source of pod status for a cluster reachable through a kubeconfig
#[async_trait]
pub trait PodSource: Send + Sync {
    async fn list_pods(
        &self,
        kubeconfig: &Path,
        now: DateTime<Utc>,
    ) -> Result<Vec<Pod>, CollectError>;
}

/// The cluster a dashboard describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub resource_group: String,
    pub cluster_name: String,
}

/// Where the pods in a collection came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "origin")]
pub enum DataOrigin {
    Live,
    Fallback { reason: String },
}

impl DataOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataOrigin::Fallback { .. })
    }
}

/// Which collection step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStep {
    Cluster,
    Resources,
    Pods,
}

impl CollectionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStep::Cluster => "cluster",
            CollectionStep::Resources => "resources",
            CollectionStep::Pods => "pods",
        }
    }
}

/// A recovered collection failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionIssue {
    pub step: CollectionStep,
    pub message: String,
}

/// Everything gathered in one refresh cycle
#[derive(Debug, Clone)]
pub struct Collection {
    pub cluster: Option<Cluster>,
    pub resources: Vec<Resource>,
    pub pods: Vec<Pod>,
    pub origin: DataOrigin,
    pub issues: Vec<CollectionIssue>,
}

/// Combines the cloud inventory and the pod source for one cluster
#[derive(Clone)]
pub struct Collector {
    inventory: Arc<dyn CloudInventory>,
    pod_source: Arc<dyn PodSource>,
    target: ClusterTarget,
}

impl Collector {
    pub fn new(
        inventory: Arc<dyn CloudInventory>,
        pod_source: Arc<dyn PodSource>,
        target: ClusterTarget,
    ) -> Self {
        Self {
            inventory,
            pod_source,
            target,
        }
    }

    pub fn target(&self) -> &ClusterTarget {
        &self.target
    }

    /// Collect a full snapshot. Failures are recorded as issues, never returned.
    pub async fn collect(&self, now: DateTime<Utc>) -> Collection {
        let mut issues = Vec::new();
        let rg = &self.target.resource_group;

        let cluster = match self.inventory.cluster(rg, &self.target.cluster_name).await {
            Ok(cluster) => Some(cluster),
            Err(e) => {
                warn!(error = %e, cluster = %self.target.cluster_name, "Failed to get cluster info");
                issues.push(CollectionIssue {
                    step: CollectionStep::Cluster,
                    message: e.to_string(),
                });
                None
            }
        };

        let resources = match self.inventory.resources(rg).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(error = %e, resource_group = %rg, "Failed to list resources");
                issues.push(CollectionIssue {
                    step: CollectionStep::Resources,
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        let (pods, origin) = match self.collect_pods(now).await {
            Ok(pods) => {
                debug!(count = pods.len(), "Collected live pods");
                (pods, DataOrigin::Live)
            }
            Err(e) => {
                warn!(error = %e, "Pod collection failed, using fallback dataset");
                issues.push(CollectionIssue {
                    step: CollectionStep::Pods,
                    message: e.to_string(),
                });
                (
                    fallback_pods(now),
                    DataOrigin::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        Collection {
            cluster,
            resources,
            pods,
            origin,
            issues,
        }
    }

    async fn collect_pods(&self, now: DateTime<Utc>) -> Result<Vec<Pod>, CollectError> {
        let kubeconfig = self
            .inventory
            .admin_kubeconfig(&self.target.resource_group, &self.target.cluster_name)
            .await?
            .ok_or_else(|| CollectError::NoKubeconfig(self.target.cluster_name.clone()))?;

        // Removed when `staged` drops, including on error paths
        let staged = stage_kubeconfig(&kubeconfig)?;
        self.pod_source.list_pods(staged.path(), now).await
    }
}

fn stage_kubeconfig(contents: &str) -> Result<tempfile::NamedTempFile, CollectError> {
    let mut file = tempfile::Builder::new()
        .prefix("kubeconfig-")
        .suffix(".yaml")
        .tempfile()
        .map_err(CollectError::Staging)?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .map_err(CollectError::Staging)?;
    Ok(file)
}
