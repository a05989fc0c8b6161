//! AKS Dashboard server
//!
//! Collects cluster state from Azure and kubectl, publishes a static HTML
//! dashboard and serves it alongside refresh, status and health endpoints.

use aks_dashboard_server::api;
use anyhow::{Context, Result};
use dashboard_lib::{health::HealthRegistry, Dashboard, DashboardConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Explicit configuration file, otherwise the default file is used if present
const CONFIG_FILE_ENV: &str = "AKSDASH_CONFIG_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting aks-dashboard-server");

    let config_file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
    let config = DashboardConfig::load(config_file.as_deref())
        .context("failed to load dashboard configuration")?;
    info!(
        cluster = %config.azure.cluster_name,
        resource_group = %config.azure.resource_group,
        output = %config.output_path.display(),
        "Dashboard configured"
    );

    let health_registry = HealthRegistry::new();
    let dashboard = Arc::new(
        Dashboard::from_config(&config, health_registry)
            .context("failed to initialize dashboard collaborators")?,
    );
    dashboard.logger().log_startup(SERVER_VERSION, config.port);

    // Publish once up front so the page is available immediately
    match dashboard.refresh().await {
        Ok(report) => info!(
            pods = report.pods_count,
            resources = report.resources_count,
            "Initial dashboard generated"
        ),
        Err(e) => warn!(error = %e, "Initial dashboard generation failed"),
    }

    let app_state = Arc::new(api::AppState::new(dashboard.clone()));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    api::serve(config.port, app_state, shutdown).await?;

    dashboard.logger().log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
