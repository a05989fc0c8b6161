//! HTTP API for refreshing and serving the dashboard, with health checks and metrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::SecondsFormat;
use dashboard_lib::{
    collector::DataOrigin,
    health::{ComponentStatus, HealthRegistry},
    Dashboard, RefreshError,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        let health_registry = dashboard.health().clone();
        Self {
            dashboard,
            health_registry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub pods_count: usize,
    pub resources_count: usize,
    pub data_origin: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClusterSummary {
    pub name: String,
    pub nodes: u32,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cluster: ClusterSummary,
    pub pods: usize,
    pub resources: usize,
    pub healthy: bool,
    pub data_origin: &'static str,
    pub last_updated: String,
}

fn origin_label(origin: &DataOrigin) -> &'static str {
    match origin {
        DataOrigin::Live => "live",
        DataOrigin::Fallback { .. } => "fallback",
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Run one refresh cycle - 409 while another is running, 500 if publishing fails
async fn refresh_dashboard(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.refresh().await {
        Ok(report) => {
            let message = match &report.origin {
                DataOrigin::Live => "Dashboard refreshed successfully".to_string(),
                DataOrigin::Fallback { reason } => {
                    format!("Dashboard refreshed with demonstration pod data: {}", reason)
                }
            };
            let body = RefreshResponse {
                success: true,
                message,
                timestamp: report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                pods_count: report.pods_count,
                resources_count: report.resources_count,
                data_origin: origin_label(&report.origin),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e @ RefreshError::InProgress) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => {
            error!(error = %e, "Dashboard refresh failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to refresh dashboard: {}", e),
            )
        }
    }
}

/// Summary of the last completed refresh - 503 before the first one
async fn status(State(state): State<Arc<AppState>>) -> Response {
    let Some(report) = state.dashboard.last_report().await else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "No dashboard has been generated yet",
        );
    };

    let body = StatusResponse {
        healthy: report.healthy(),
        data_origin: origin_label(&report.origin),
        cluster: ClusterSummary {
            name: report.cluster.name,
            nodes: report.cluster.nodes,
            status: report.cluster.status,
        },
        pods: report.pods_count,
        resources: report.resources_count,
        last_updated: report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// The published dashboard document
async fn dashboard_page(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.store().read().await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Dashboard not generated yet. POST /refresh-dashboard to create it.",
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read dashboard artifact");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving, possibly fallback data
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once a dashboard is published
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/aks-dashboard.html", get(dashboard_page))
        .route("/refresh-dashboard", post(refresh_dashboard))
        .route("/api/status", get(status))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, returning when `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting dashboard server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
