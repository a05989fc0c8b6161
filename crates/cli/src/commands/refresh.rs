//! Trigger a refresh on a running server

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{format_timestamp, print_json, print_success, print_warning, OutputFormat};

pub async fn trigger_refresh(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.refresh().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&result.message);
            println!("Generated:  {}", format_timestamp(&result.timestamp));
            println!("Pods:       {}", result.pods_count.to_string().cyan());
            println!("Resources:  {}", result.resources_count.to_string().cyan());
            if result.data_origin == "fallback" {
                print_warning("Live pod data was unavailable; the dashboard shows demonstration data");
            }
        }
    }

    Ok(())
}
