//! Component health for the dashboard service
//!
//! Each refresh marks the collaborators it touched. Readiness flips once the
//! first dashboard has been published.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collaborators a refresh depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Azure token and management endpoints
    CloudApi,
    /// kubectl against the target cluster
    ClusterCli,
    /// The published HTML artifact
    ArtifactStore,
}

impl Component {
    pub const ALL: [Component; 3] = [
        Component::CloudApi,
        Component::ClusterCli,
        Component::ArtifactStore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::CloudApi => "cloud_api",
            Component::ClusterCli => "cluster_cli",
            Component::ArtifactStore => "artifact_store",
        }
    }
}

/// Ordered from best to worst, so the overall status is the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, possibly from fallback data
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            checked_at: Utc::now(),
        }
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<Component, ComponentHealth>,
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug)]
struct State {
    components: BTreeMap<Component, ComponentHealth>,
    published: bool,
}

/// Shared health view updated by the refresh pipeline
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    state: Arc<RwLock<State>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// Every component starts healthy and nothing is published yet
    pub fn new() -> Self {
        let components = Component::ALL
            .into_iter()
            .map(|c| (c, ComponentHealth::new(ComponentStatus::Healthy, None)))
            .collect();
        Self {
            state: Arc::new(RwLock::new(State {
                components,
                published: false,
            })),
        }
    }

    async fn mark(&self, component: Component, status: ComponentStatus, message: Option<String>) {
        self.state
            .write()
            .await
            .components
            .insert(component, ComponentHealth::new(status, message));
    }

    pub async fn mark_healthy(&self, component: Component) {
        self.mark(component, ComponentStatus::Healthy, None).await;
    }

    pub async fn mark_degraded(&self, component: Component, message: impl Into<String>) {
        self.mark(component, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn mark_unhealthy(&self, component: Component, message: impl Into<String>) {
        self.mark(component, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    pub async fn mark_published(&self) {
        self.state.write().await.published = true;
    }

    pub async fn status_of(&self, component: Component) -> ComponentStatus {
        self.state
            .read()
            .await
            .components
            .get(&component)
            .map_or(ComponentStatus::Healthy, |h| h.status)
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: overall(&state.components),
            components: state.components.clone(),
        }
    }

    /// Ready once a dashboard exists and no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        let reason = if !state.published {
            Some("No dashboard published yet".to_string())
        } else if overall(&state.components) == ComponentStatus::Unhealthy {
            Some("Critical component unhealthy".to_string())
        } else {
            None
        };

        ReadinessResponse {
            ready: reason.is_none(),
            reason,
        }
    }
}

fn overall(components: &BTreeMap<Component, ComponentHealth>) -> ComponentStatus {
    components
        .values()
        .map(|h| h.status)
        .max()
        .unwrap_or(ComponentStatus::Healthy)
}
