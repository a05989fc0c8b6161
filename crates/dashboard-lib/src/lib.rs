//! Core library for the AKS cluster dashboard
//!
//! This crate provides:
//! - Collection from Azure Resource Manager and `kubectl`, with a fallback dataset
//! - Aggregation of pods by namespace and by node with health rollups
//! - Static HTML rendering and atomic publishing of the dashboard
//! - The refresh pipeline, health checks and observability

pub mod age;
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod refresh;
pub mod render;
pub mod store;

pub use aggregate::{group_by_namespace, group_by_node, summarize, HealthRollup, NodeKey};
pub use config::DashboardConfig;
pub use error::{CollectError, ConfigError, PersistError, RefreshError};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{DashboardMetrics, StructuredLogger};
pub use refresh::{ClusterStatus, Dashboard, NamespaceSummary, RefreshReport};
pub use store::ArtifactStore;
