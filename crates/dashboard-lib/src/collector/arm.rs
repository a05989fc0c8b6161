//! Azure Resource Manager REST client
//!
//! Authenticates with the OAuth2 client-credentials flow and caches the
//! bearer token until shortly before it expires.

use super::{async_trait, CloudInventory};
use crate::error::CollectError;
use crate::models::{Cluster, Resource};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

const MANAGED_CLUSTERS_API_VERSION: &str = "2023-08-01";
const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Refresh the token this long before it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound on resource listing pages
const MAX_PAGES: usize = 100;

/// Service principal credentials
#[derive(Clone)]
pub struct ArmCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ArmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Base URLs for the identity platform and the management API
#[derive(Debug, Clone)]
pub struct ArmEndpoints {
    pub authority: Url,
    pub management: Url,
}

impl Default for ArmEndpoints {
    fn default() -> Self {
        Self {
            authority: Url::parse("https://login.microsoftonline.com/")
                .expect("static authority URL is valid"),
            management: Url::parse("https://management.azure.com/")
                .expect("static management URL is valid"),
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Client for the managed-cluster and resource-management APIs
pub struct ArmClient {
    http: Client,
    subscription_id: String,
    credentials: ArmCredentials,
    endpoints: ArmEndpoints,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedClusterJson {
    name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    properties: ManagedClusterProperties,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedClusterProperties {
    #[serde(default)]
    kubernetes_version: Option<String>,
    #[serde(default)]
    fqdn: Option<String>,
    #[serde(default)]
    power_state: Option<PowerState>,
    #[serde(default)]
    agent_pool_profiles: Vec<AgentPoolProfile>,
}

#[derive(Deserialize)]
struct PowerState {
    code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentPoolProfile {
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    vm_size: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourcePage {
    #[serde(default)]
    value: Vec<ResourceJson>,
    next_link: Option<String>,
}

#[derive(Deserialize)]
struct ResourceJson {
    name: String,
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
struct CredentialResults {
    #[serde(default)]
    kubeconfigs: Vec<CredentialResult>,
}

#[derive(Deserialize)]
struct CredentialResult {
    value: String,
}

impl ArmClient {
    pub fn new(
        subscription_id: impl Into<String>,
        credentials: ArmCredentials,
        endpoints: ArmEndpoints,
    ) -> Result<Self, CollectError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            subscription_id: subscription_id.into(),
            credentials,
            endpoints,
            token: Mutex::new(None),
        })
    }

    async fn bearer_token(&self) -> Result<String, CollectError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let url = self
            .endpoints
            .authority
            .join(&format!("{}/oauth2/v2.0/token", self.credentials.tenant_id))
            .map_err(|e| CollectError::Auth(format!("invalid authority URL: {}", e)))?;
        let scope = format!(
            "{}/.default",
            self.endpoints.management.as_str().trim_end_matches('/')
        );

        debug!(url = %url, "Requesting management API token");
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CollectError::Auth(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CollectError::Auth(format!("invalid token response: {}", e)))?;

        info!(expires_in = token.expires_in, "Acquired management API token");
        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(value)
    }

    fn cluster_url(&self, resource_group: &str, cluster_name: &str) -> Result<Url, CollectError> {
        self.management_url(&format!(
            "subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}",
            self.subscription_id, resource_group, cluster_name
        ))
    }

    fn management_url(&self, path: &str) -> Result<Url, CollectError> {
        self.endpoints
            .management
            .join(path)
            .map_err(|e| CollectError::Decode(format!("invalid management URL: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        api_version: Option<&str>,
    ) -> Result<T, CollectError> {
        let token = self.bearer_token().await?;
        let mut request = self.http.get(url.clone()).bearer_auth(token);
        if let Some(version) = api_version {
            request = request.query(&[("api-version", version)]);
        }
        decode(url, request.send().await?).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        api_version: &str,
    ) -> Result<T, CollectError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .post(url.clone())
            .bearer_auth(token)
            .query(&[("api-version", api_version)])
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        decode(url, response).await
    }
}

async fn decode<T: DeserializeOwned>(url: Url, response: Response) -> Result<T, CollectError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CollectError::Api {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| CollectError::Decode(format!("{}: {}", url, e)))
}

#[async_trait]
impl CloudInventory for ArmClient {
    async fn cluster(
        &self,
        resource_group: &str,
        cluster_name: &str,
    ) -> Result<Cluster, CollectError> {
        let url = self.cluster_url(resource_group, cluster_name)?;
        let json: ManagedClusterJson = self
            .get_json(url, Some(MANAGED_CLUSTERS_API_VERSION))
            .await?;

        let props = json.properties;
        let pool = props.agent_pool_profiles.first();

        Ok(Cluster {
            name: json.name,
            resource_group: resource_group.to_string(),
            location: json.location,
            kubernetes_version: props
                .kubernetes_version
                .unwrap_or_else(|| "Unknown".to_string()),
            node_count: pool.and_then(|p| p.count).unwrap_or(0),
            vm_size: pool
                .and_then(|p| p.vm_size.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            power_state: props
                .power_state
                .and_then(|p| p.code)
                .unwrap_or_else(|| "Unknown".to_string()),
            fqdn: props.fqdn,
        })
    }

    async fn resources(&self, resource_group: &str) -> Result<Vec<Resource>, CollectError> {
        let first = self.management_url(&format!(
            "subscriptions/{}/resourceGroups/{}/resources",
            self.subscription_id, resource_group
        ))?;

        let mut resources = Vec::new();
        let mut page: ResourcePage = self.get_json(first, Some(RESOURCES_API_VERSION)).await?;

        for _ in 0..MAX_PAGES {
            resources.extend(page.value.into_iter().map(|r| Resource {
                name: r.name,
                resource_type: r.resource_type,
                location: r.location,
                resource_group: resource_group.to_string(),
                tags: r.tags.unwrap_or_default(),
            }));

            let Some(next) = page.next_link else {
                break;
            };
            let next = Url::parse(&next)
                .map_err(|e| CollectError::Decode(format!("invalid nextLink: {}", e)))?;
            // nextLink already carries the api-version
            page = self.get_json(next, None).await?;
        }

        debug!(count = resources.len(), resource_group = %resource_group, "Listed resources");
        Ok(resources)
    }

    async fn admin_kubeconfig(
        &self,
        resource_group: &str,
        cluster_name: &str,
    ) -> Result<Option<String>, CollectError> {
        let mut url = self.cluster_url(resource_group, cluster_name)?;
        url.path_segments_mut()
            .map_err(|_| CollectError::Decode("management URL cannot be a base".to_string()))?
            .push("listClusterAdminCredential");

        let results: CredentialResults = self
            .post_json(url, MANAGED_CLUSTERS_API_VERSION)
            .await?;

        let Some(first) = results.kubeconfigs.into_iter().next() else {
            return Ok(None);
        };

        let bytes = STANDARD
            .decode(first.value.trim())
            .map_err(|e| CollectError::Decode(format!("kubeconfig is not base64: {}", e)))?;
        let kubeconfig = String::from_utf8(bytes)
            .map_err(|e| CollectError::Decode(format!("kubeconfig is not UTF-8: {}", e)))?;

        Ok(Some(kubeconfig))
    }
}
