//! One refresh cycle: collect, aggregate, render, publish
//!
//! At most one cycle runs at a time. A trigger that arrives while a cycle is
//! running is rejected rather than queued.

use crate::aggregate::HealthRollup;
use crate::collector::{
    ArmClient, CollectionIssue, CollectionStep, Collector, DataOrigin, KubectlPodSource,
};
use crate::config::DashboardConfig;
use crate::error::{ConfigError, RefreshError};
use crate::health::{Component, HealthRegistry};
use crate::observability::{DashboardMetrics, StructuredLogger};
use crate::render::{render_dashboard, DashboardView};
use crate::store::ArtifactStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Cluster identity as reported on the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub name: String,
    pub nodes: u32,
    pub status: String,
}

/// Per-namespace verdict from one refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSummary {
    pub namespace: String,
    pub rollup: HealthRollup,
    pub healthy: bool,
}

/// Outcome of a completed refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub timestamp: DateTime<Utc>,
    pub cluster: ClusterStatus,
    /// False when the cluster metadata could not be fetched
    pub cluster_available: bool,
    pub pods_count: usize,
    pub resources_count: usize,
    pub rollup: HealthRollup,
    pub namespaces: Vec<NamespaceSummary>,
    pub origin: DataOrigin,
    pub issues: Vec<CollectionIssue>,
    pub artifact: PathBuf,
}

impl RefreshReport {
    pub fn healthy(&self) -> bool {
        self.rollup.is_healthy()
    }
}

/// The refresh pipeline and its last outcome
pub struct Dashboard {
    collector: Collector,
    store: ArtifactStore,
    health: HealthRegistry,
    metrics: DashboardMetrics,
    logger: StructuredLogger,
    guard: Mutex<()>,
    last: RwLock<Option<RefreshReport>>,
}

impl Dashboard {
    pub fn new(collector: Collector, store: ArtifactStore, health: HealthRegistry) -> Self {
        let logger = StructuredLogger::new(&collector.target().cluster_name);
        Self {
            collector,
            store,
            health,
            metrics: DashboardMetrics::new(),
            logger,
            guard: Mutex::new(()),
            last: RwLock::new(None),
        }
    }

    /// Wire the management API client and kubectl from configuration
    pub fn from_config(
        config: &DashboardConfig,
        health: HealthRegistry,
    ) -> Result<Self, ConfigError> {
        let (subscription_id, credentials) = config.credentials()?;
        let inventory = ArmClient::new(subscription_id, credentials, config.endpoints()?)
            .map_err(ConfigError::Client)?;
        let pods = KubectlPodSource::new(&config.kubectl_path, config.kubectl_timeout());
        let collector = Collector::new(Arc::new(inventory), Arc::new(pods), config.target());

        Ok(Self::new(
            collector,
            ArtifactStore::new(&config.output_path),
            health,
        ))
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The last completed refresh, if any
    pub async fn last_report(&self) -> Option<RefreshReport> {
        self.last.read().await.clone()
    }

    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        self.refresh_at(Utc::now()).await
    }

    /// Run one cycle with `now` as the reference instant for ages
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<RefreshReport, RefreshError> {
        let _running = match self.guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.metrics.inc_refreshes_rejected();
                self.logger.log_refresh_rejected();
                return Err(RefreshError::InProgress);
            }
        };

        let started = Instant::now();
        let collection = self.collector.collect(now).await;
        self.record_collection_health(&collection.issues, &collection.origin)
            .await;

        let view = DashboardView::new(
            now,
            collection.cluster.as_ref(),
            &collection.resources,
            &collection.pods,
            &collection.origin,
        );
        let html = match render_dashboard(&view) {
            Ok(html) => html,
            Err(e) => return Err(self.refresh_failed(e.into())),
        };

        let target = self.collector.target();
        let cluster = match view.cluster {
            Some(c) => ClusterStatus {
                name: c.name.clone(),
                nodes: c.node_count,
                status: c.power_state.clone(),
            },
            None => ClusterStatus {
                name: target.cluster_name.clone(),
                nodes: 0,
                status: "Unknown".to_string(),
            },
        };
        let namespaces = view
            .namespaces
            .iter()
            .map(|g| NamespaceSummary {
                namespace: g.namespace.to_string(),
                rollup: g.rollup,
                healthy: g.is_healthy(),
            })
            .collect();
        let rollup = view.summary;

        let artifact = self.store.path().display().to_string();
        if let Err(e) = self.store.publish(&html).await {
            self.logger.log_publish_failed(&artifact, &e.to_string());
            self.health
                .mark_unhealthy(Component::ArtifactStore, e.to_string())
                .await;
            return Err(self.refresh_failed(e.into()));
        }
        self.logger.log_published(&artifact, html.len());
        self.health.mark_healthy(Component::ArtifactStore).await;
        self.health.mark_published().await;

        let report = RefreshReport {
            timestamp: now,
            cluster,
            cluster_available: collection.cluster.is_some(),
            pods_count: collection.pods.len(),
            resources_count: collection.resources.len(),
            rollup,
            namespaces,
            origin: collection.origin,
            issues: collection.issues,
            artifact: self.store.path().to_path_buf(),
        };

        let elapsed = started.elapsed();
        self.metrics.observe_refresh_latency(elapsed.as_secs_f64());
        self.metrics
            .record_refresh(report.pods_count, report.resources_count, &report.origin);
        self.logger.log_refresh(
            report.pods_count,
            report.resources_count,
            &report.origin,
            report.issues.len(),
            elapsed.as_millis(),
        );

        *self.last.write().await = Some(report.clone());
        Ok(report)
    }

    fn refresh_failed(&self, err: RefreshError) -> RefreshError {
        self.metrics.inc_refresh_failures();
        self.logger.log_refresh_failed(&err.to_string());
        err
    }

    async fn record_collection_health(&self, issues: &[CollectionIssue], origin: &DataOrigin) {
        for issue in issues {
            self.metrics.inc_collection_errors(issue.step.as_str());
        }

        let cloud_issues: Vec<&str> = issues
            .iter()
            .filter(|i| i.step != CollectionStep::Pods)
            .map(|i| i.message.as_str())
            .collect();
        if cloud_issues.is_empty() {
            self.health.mark_healthy(Component::CloudApi).await;
        } else {
            self.health
                .mark_degraded(Component::CloudApi, cloud_issues.join("; "))
                .await;
        }

        match origin {
            DataOrigin::Live => {
                debug!("Pods collected live");
                self.health.mark_healthy(Component::ClusterCli).await;
            }
            DataOrigin::Fallback { reason } => {
                self.logger.log_fallback(reason);
                self.health
                    .mark_degraded(Component::ClusterCli, reason.clone())
                    .await;
            }
        }
    }
}
