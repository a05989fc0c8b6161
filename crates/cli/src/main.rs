//! AKS Dashboard CLI
//!
//! A command-line tool for refreshing and inspecting a running dashboard
//! server, or for generating the dashboard locally in one shot.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, refresh, status};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// AKS Dashboard CLI
#[derive(Parser)]
#[command(name = "aksdash")]
#[command(author, version, about = "CLI for the AKS Dashboard", long_about = None)]
pub struct Cli {
    /// Dashboard server URL (can also be set via AKSDASH_URL env var)
    #[arg(long, env = "AKSDASH_URL", default_value = "http://localhost:5055")]
    pub server_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Regenerate the dashboard on the server
    Refresh,

    /// Show the status of the last published dashboard
    Status,

    /// Generate the dashboard locally using the server configuration
    Generate {
        /// Output file path (defaults to the configured output path)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to azure-visualization-config.json if present)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Refresh => {
            let client = client::ApiClient::new(&cli.server_url)?;
            refresh::trigger_refresh(&client, cli.format).await?;
        }
        Commands::Status => {
            let client = client::ApiClient::new(&cli.server_url)?;
            status::show_status(&client, cli.format).await?;
        }
        Commands::Generate { output, config } => {
            generate::generate_dashboard(output, config, cli.format).await?;
        }
    }

    Ok(())
}
