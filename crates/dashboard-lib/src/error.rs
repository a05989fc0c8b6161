//! Error taxonomy for the refresh pipeline
//!
//! Collection errors are recoverable: the pipeline substitutes fallback data.
//! Persist and configuration errors are surfaced to the caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to collect live data from the cloud APIs or the cluster CLI
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request to {url} failed with status {status}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no kubeconfig available for cluster {0}")]
    NoKubeconfig(String),

    #[error("kubectl timed out after {0:?}")]
    CliTimeout(Duration),

    #[error("kubectl exited with {code:?}: {stderr}")]
    CliFailed { code: Option<i32>, stderr: String },

    #[error("failed to run kubectl: {0}")]
    CliSpawn(#[source] std::io::Error),

    #[error("failed to stage kubeconfig: {0}")]
    Staging(#[source] std::io::Error),
}

/// Failure to write the dashboard artifact
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write staged artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace artifact {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one refresh cycle
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("a refresh is already in progress")]
    InProgress,

    #[error("failed to render dashboard")]
    Render(#[from] std::fmt::Error),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Missing or invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("failed to build management API client: {0}")]
    Client(#[source] CollectError),
}
