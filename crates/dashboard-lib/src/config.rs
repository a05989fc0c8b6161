//! Dashboard configuration
//!
//! Settings come from an optional JSON file layered under `AKSDASH_*`
//! environment variables. Nested keys use `__`, so
//! `AKSDASH_AZURE__CLIENT_SECRET` sets `azure.client_secret`.

use crate::collector::{ArmCredentials, ArmEndpoints, ClusterTarget};
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "azure-visualization-config.json";
pub const ENV_PREFIX: &str = "AKSDASH";

/// Azure identity and the cluster to describe
#[derive(Clone, Deserialize)]
pub struct AzureSettings {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    #[serde(default = "default_resource_group")]
    pub resource_group: String,

    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            subscription_id: None,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            resource_group: default_resource_group(),
            cluster_name: default_cluster_name(),
        }
    }
}

impl std::fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSettings")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("resource_group", &self.resource_group)
            .field("cluster_name", &self.cluster_name)
            .finish()
    }
}

/// Full dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub azure: AzureSettings,

    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Where the rendered dashboard is published
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: PathBuf,

    #[serde(default = "default_kubectl_timeout")]
    pub kubectl_timeout_secs: u64,

    /// Identity platform base URL override
    pub authority_url: Option<String>,

    /// Management API base URL override
    pub management_url: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            azure: AzureSettings::default(),
            port: default_port(),
            output_path: default_output_path(),
            kubectl_path: default_kubectl_path(),
            kubectl_timeout_secs: default_kubectl_timeout(),
            authority_url: None,
            management_url: None,
        }
    }
}

fn default_resource_group() -> String {
    "rg-modular-demo".to_string()
}

fn default_cluster_name() -> String {
    "transact".to_string()
}

fn default_port() -> u16 {
    5055
}

fn default_output_path() -> PathBuf {
    PathBuf::from("aks-dashboard.html")
}

fn default_kubectl_path() -> PathBuf {
    PathBuf::from("kubectl")
}

fn default_kubectl_timeout() -> u64 {
    30
}

/// Environment source with the dashboard's prefix and separators
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl DashboardConfig {
    /// Load from `file` (required) or the default file (optional if absent),
    /// then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(file, environment())
    }

    /// Load from the given file and environment source
    pub fn load_with(file: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path)
                .format(config::FileFormat::Json)
                .required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE))
                .format(config::FileFormat::Json)
                .required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file_source)
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.kubectl_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "kubectl_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.azure.resource_group.trim().is_empty() {
            return Err(ConfigError::Missing("azure.resource_group"));
        }
        if self.azure.cluster_name.trim().is_empty() {
            return Err(ConfigError::Missing("azure.cluster_name"));
        }
        Ok(())
    }

    /// Subscription and service principal, all required
    pub fn credentials(&self) -> Result<(String, ArmCredentials), ConfigError> {
        let azure = &self.azure;
        let subscription_id = required(&azure.subscription_id, "azure.subscription_id")?;
        let credentials = ArmCredentials {
            tenant_id: required(&azure.tenant_id, "azure.tenant_id")?,
            client_id: required(&azure.client_id, "azure.client_id")?,
            client_secret: required(&azure.client_secret, "azure.client_secret")?,
        };
        Ok((subscription_id, credentials))
    }

    pub fn target(&self) -> ClusterTarget {
        ClusterTarget {
            resource_group: self.azure.resource_group.clone(),
            cluster_name: self.azure.cluster_name.clone(),
        }
    }

    pub fn endpoints(&self) -> Result<ArmEndpoints, ConfigError> {
        let mut endpoints = ArmEndpoints::default();
        if let Some(url) = &self.authority_url {
            endpoints.authority = base_url(url, "authority_url")?;
        }
        if let Some(url) = &self.management_url {
            endpoints.management = base_url(url, "management_url")?;
        }
        Ok(endpoints)
    }

    pub fn kubectl_timeout(&self) -> Duration {
        Duration::from_secs(self.kubectl_timeout_secs)
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(key))
}

/// Parse a base URL, ensuring a trailing slash so relative joins append
fn base_url(raw: &str, key: &'static str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.port, 5055);
        assert_eq!(config.output_path, PathBuf::from("aks-dashboard.html"));
        assert_eq!(config.azure.resource_group, "rg-modular-demo");
        assert_eq!(config.azure.cluster_name, "transact");
        assert_eq!(config.kubectl_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "azure": {
                    "subscription_id": "sub-1",
                    "tenant_id": "tenant-1",
                    "client_id": "client-1",
                    "client_secret": "s3cret",
                    "cluster_name": "payments"
                },
                "port": 8088
            }"#,
        );

        let config = DashboardConfig::load_with(Some(&path), env(&[])).unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.target().cluster_name, "payments");
        assert_eq!(config.target().resource_group, "rg-modular-demo");

        let (subscription, creds) = config.credentials().unwrap();
        assert_eq!(subscription, "sub-1");
        assert_eq!(creds.client_secret, "s3cret");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"azure": {"client_id": "from-file"}, "port": 8088}"#);

        let config = DashboardConfig::load_with(
            Some(&path),
            env(&[
                ("AKSDASH_PORT", "9000"),
                ("AKSDASH_AZURE__CLIENT_ID", "from-env"),
                ("AKSDASH_OUTPUT_PATH", "/tmp/out.html"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.azure.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.html"));
    }

    #[test]
    fn test_missing_credentials() {
        let config = DashboardConfig::default();
        let err = config.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("azure.subscription_id")));

        let mut config = DashboardConfig::default();
        config.azure.subscription_id = Some("sub".to_string());
        config.azure.tenant_id = Some("tenant".to_string());
        config.azure.client_id = Some("client".to_string());
        config.azure.client_secret = Some("  ".to_string());
        let err = config.credentials().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("azure.client_secret")));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let err =
            DashboardConfig::load_with(Some(&dir.path().join("nope.json")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"kubectl_timeout_secs": 0}"#);
        let err = DashboardConfig::load_with(Some(&path), env(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "kubectl_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = DashboardConfig {
            authority_url: Some("http://127.0.0.1:1234/login".to_string()),
            management_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = config.endpoints().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "management_url", .. }));

        let config = DashboardConfig {
            authority_url: Some("http://127.0.0.1:1234/login".to_string()),
            ..Default::default()
        };
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.authority.as_str(), "http://127.0.0.1:1234/login/");
        assert_eq!(endpoints.management.as_str(), "https://management.azure.com/");
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let mut config = DashboardConfig::default();
        config.azure.client_secret = Some("s3cret".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
