//! Observability infrastructure for the dashboard service
//!
//! Provides:
//! - Prometheus metrics (refresh latency, outcomes, fallback activations, inventory sizes)
//! - Structured JSON logging with tracing

use crate::collector::DataOrigin;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Refresh cycles span network calls and a kubectl run
const REFRESH_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DashboardMetricsInner> = OnceLock::new();

struct DashboardMetricsInner {
    refresh_latency_seconds: Histogram,
    refreshes: IntCounter,
    refresh_failures: IntCounter,
    refreshes_rejected: IntCounter,
    fallback_activations: IntCounter,
    collection_errors: IntCounterVec,
    pods: IntGauge,
    resources: IntGauge,
}

impl DashboardMetricsInner {
    fn new() -> Self {
        Self {
            refresh_latency_seconds: register_histogram!(
                "aks_dashboard_refresh_latency_seconds",
                "Time spent collecting, rendering and publishing one dashboard",
                REFRESH_BUCKETS.to_vec()
            )
            .expect("Failed to register refresh_latency_seconds"),

            refreshes: register_int_counter!(
                "aks_dashboard_refreshes_total",
                "Total number of completed dashboard refreshes"
            )
            .expect("Failed to register refreshes_total"),

            refresh_failures: register_int_counter!(
                "aks_dashboard_refresh_failures_total",
                "Total number of refreshes that failed to publish"
            )
            .expect("Failed to register refresh_failures_total"),

            refreshes_rejected: register_int_counter!(
                "aks_dashboard_refreshes_rejected_total",
                "Total number of refresh requests rejected while another was running"
            )
            .expect("Failed to register refreshes_rejected_total"),

            fallback_activations: register_int_counter!(
                "aks_dashboard_fallback_activations_total",
                "Total number of refreshes that used demonstration pod data"
            )
            .expect("Failed to register fallback_activations_total"),

            collection_errors: register_int_counter_vec!(
                "aks_dashboard_collection_errors_total",
                "Total number of recovered collection errors by step",
                &["step"]
            )
            .expect("Failed to register collection_errors_total"),

            pods: register_int_gauge!(
                "aks_dashboard_pods",
                "Number of pods shown on the current dashboard"
            )
            .expect("Failed to register pods"),

            resources: register_int_gauge!(
                "aks_dashboard_resources",
                "Number of resource group resources shown on the current dashboard"
            )
            .expect("Failed to register resources"),
        }
    }
}

/// Dashboard metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance. Clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct DashboardMetrics {
    _private: (),
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DashboardMetricsInner {
        GLOBAL_METRICS.get_or_init(DashboardMetricsInner::new)
    }

    pub fn observe_refresh_latency(&self, duration_secs: f64) {
        self.inner().refresh_latency_seconds.observe(duration_secs);
    }

    /// Record a published refresh and the inventory it showed
    pub fn record_refresh(&self, pods: usize, resources: usize, origin: &DataOrigin) {
        let inner = self.inner();
        inner.refreshes.inc();
        inner.pods.set(pods as i64);
        inner.resources.set(resources as i64);
        if origin.is_fallback() {
            inner.fallback_activations.inc();
        }
    }

    pub fn inc_refresh_failures(&self) {
        self.inner().refresh_failures.inc();
    }

    pub fn inc_refreshes_rejected(&self) {
        self.inner().refreshes_rejected.inc();
    }

    pub fn inc_collection_errors(&self, step: &str) {
        self.inner()
            .collection_errors
            .with_label_values(&[step])
            .inc();
    }

    pub fn refreshes_total(&self) -> u64 {
        self.inner().refreshes.get()
    }

    pub fn refresh_failures_total(&self) -> u64 {
        self.inner().refresh_failures.get()
    }

    pub fn fallback_activations_total(&self) -> u64 {
        self.inner().fallback_activations.get()
    }
}

/// Structured logger for dashboard events
///
/// Every event carries the cluster it describes so logs from several
/// dashboards can share a sink.
#[derive(Clone)]
pub struct StructuredLogger {
    cluster: String,
}

impl StructuredLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "dashboard_started",
            cluster = %self.cluster,
            version = %version,
            port = port,
            "AKS dashboard started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "dashboard_shutdown",
            cluster = %self.cluster,
            reason = %reason,
            "AKS dashboard shutting down"
        );
    }

    pub fn log_refresh(
        &self,
        pods: usize,
        resources: usize,
        origin: &DataOrigin,
        issues: usize,
        elapsed_ms: u128,
    ) {
        info!(
            event = "refresh_completed",
            cluster = %self.cluster,
            pods = pods,
            resources = resources,
            fallback = origin.is_fallback(),
            issues = issues,
            elapsed_ms = elapsed_ms as u64,
            "Dashboard refreshed"
        );
    }

    pub fn log_refresh_rejected(&self) {
        warn!(
            event = "refresh_rejected",
            cluster = %self.cluster,
            "Refresh already in progress, request rejected"
        );
    }

    pub fn log_fallback(&self, reason: &str) {
        warn!(
            event = "collection_fallback",
            cluster = %self.cluster,
            reason = %reason,
            "Live pod data unavailable, using demonstration data"
        );
    }

    pub fn log_published(&self, path: &str, bytes: usize) {
        info!(
            event = "artifact_published",
            cluster = %self.cluster,
            path = %path,
            bytes = bytes,
            "Dashboard artifact published"
        );
    }

    pub fn log_refresh_failed(&self, error: &str) {
        error!(
            event = "refresh_failed",
            cluster = %self.cluster,
            error = %error,
            "Dashboard refresh failed"
        );
    }

    pub fn log_publish_failed(&self, path: &str, error: &str) {
        warn!(
            event = "artifact_publish_failed",
            cluster = %self.cluster,
            path = %path,
            error = %error,
            "Failed to publish dashboard, previous artifact kept"
        );
    }
}
