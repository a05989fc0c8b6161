//! Show the state of the last published dashboard

use anyhow::Result;
use tabled::Tabled;

use crate::client::{ApiClient, StatusReport};
use crate::output::{
    color_status, format_health, format_timestamp, print_json, print_table, OutputFormat,
};

/// Row for the status table
#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Nodes")]
    nodes: u32,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Pods")]
    pods: usize,
    #[tabled(rename = "Resources")]
    resources: usize,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Data")]
    data: String,
    #[tabled(rename = "Last Updated")]
    last_updated: String,
}

impl From<&StatusReport> for StatusRow {
    fn from(report: &StatusReport) -> Self {
        Self {
            cluster: report.cluster.name.clone(),
            nodes: report.cluster.nodes,
            state: color_status(&report.cluster.status),
            pods: report.pods,
            resources: report.resources,
            health: format_health(report.healthy),
            data: report
                .data_origin
                .as_deref()
                .map(color_status)
                .unwrap_or_else(|| "-".to_string()),
            last_updated: format_timestamp(&report.last_updated),
        }
    }
}

pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report = client.status().await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_table(&[StatusRow::from(&report)]),
    }

    Ok(())
}
