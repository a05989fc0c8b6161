//! Generate the dashboard locally without a server

use anyhow::{Context, Result};
use colored::Colorize;
use dashboard_lib::{
    collector::DataOrigin, health::HealthRegistry, Dashboard, DashboardConfig, RefreshReport,
};
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{
    format_health, print_info, print_json, print_success, print_table, print_warning,
    OutputFormat,
};

/// Row for the namespace verdict table
#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pods")]
    pods: usize,
    #[tabled(rename = "Containers")]
    containers: String,
    #[tabled(rename = "Health")]
    health: String,
}

fn namespace_rows(report: &RefreshReport) -> Vec<NamespaceRow> {
    report
        .namespaces
        .iter()
        .map(|ns| NamespaceRow {
            namespace: ns.namespace.clone(),
            pods: ns.rollup.total_pods,
            containers: format!(
                "{}/{}",
                ns.rollup.healthy_containers, ns.rollup.total_containers
            ),
            health: format_health(ns.healthy),
        })
        .collect()
}

pub async fn generate_dashboard(
    output: Option<PathBuf>,
    config_file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = DashboardConfig::load(config_file.as_deref())
        .context("Failed to load dashboard configuration")?;
    if let Some(path) = output {
        config.output_path = path;
    }

    let dashboard = Dashboard::from_config(&config, HealthRegistry::new())
        .context("Failed to initialize dashboard")?;
    let report = dashboard
        .refresh()
        .await
        .context("Failed to generate dashboard")?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    print_success(&format!(
        "Dashboard written to {}",
        report.artifact.display().to_string().cyan()
    ));
    println!(
        "Cluster:    {}{}",
        report.cluster.name.bold(),
        if report.cluster_available {
            String::new()
        } else {
            " (details unavailable)".yellow().to_string()
        }
    );
    println!("Resources:  {}", report.resources_count);
    println!("Pods:       {}", report.pods_count);
    println!("Health:     {}", format_health(report.healthy()));
    println!();

    print_table(&namespace_rows(&report));

    if let DataOrigin::Fallback { reason } = &report.origin {
        print_warning(&format!("Using demonstration pod data: {}", reason));
    }
    for issue in report.issues.iter() {
        print_info(&format!("{}: {}", issue.step.as_str(), issue.message));
    }

    Ok(())
}
