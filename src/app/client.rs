//! reqwest-backed `AppPlatform`.
//!
//! Local app:  GET {local_app_url}/openapi.json
//! Cloud API:  GET {cloud_url}/v1/memberships
//!             GET {cloud_url}/v1/projects/{project}/lightningapps
//!             GET {cloud_url}/v1/projects/{project}/lightningapps/{id}/artifacts
//! Cloud calls carry the API key as a bearer token. Artifact URLs are
//! pre-signed and fetched without credentials.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{AppError, AppPlatform, Artifact, CloudApp};
use crate::config::{Settings, parse_base_url};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MembershipList {
    #[serde(default)]
    memberships: Vec<Membership>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Membership {
    project_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppList {
    #[serde(default)]
    lightningapps: Vec<CloudApp>,
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone)]
pub struct HttpPlatform {
    http: Client,
    local_url: Url,
    cloud_url: Url,
    api_key: Option<String>,
    project_id: Option<String>,
}

impl HttpPlatform {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            local_url: settings.local_app_url.clone(),
            cloud_url: settings.cloud_url.clone(),
            api_key: settings.api_key.clone(),
            project_id: settings.project_id.clone(),
        })
    }

    async fn cloud_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let key = self.api_key.as_deref().ok_or(AppError::MissingCredentials)?;
        let url = self
            .cloud_url
            .join(path)
            .with_context(|| format!("Invalid cloud API path: {path}"))?;

        debug!(%url, "cloud request");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(key)
            .send()
            .await
            .with_context(|| format!("Failed to reach the cloud API at {url}"))?;

        ensure_success(response)?
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }
}

fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::BadStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl AppPlatform for HttpPlatform {
    async fn local_openapi(&self) -> Result<Option<serde_json::Value>> {
        let url = self.local_url.join("openapi.json")?;
        debug!(%url, "fetching local app OpenAPI document");

        let response = match self.http.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) if e.is_connect() || e.is_timeout() => {
                debug!(error = %e, "local app is not reachable");
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to query {url}")),
        };

        let doc = ensure_success(response)?
            .json()
            .await
            .with_context(|| format!("Failed to parse OpenAPI document from {url}"))?;
        Ok(Some(doc))
    }

    async fn project_id(&self) -> Result<String> {
        if let Some(id) = &self.project_id {
            return Ok(id.clone());
        }

        let list: MembershipList = self.cloud_get("v1/memberships").await?;
        let mut memberships = list.memberships.into_iter();
        let first = memberships.next().ok_or(AppError::NoProject)?;
        if memberships.next().is_some() {
            warn!(
                project = %first.name,
                "several projects found; using the first one (set LIGHTNING_CLOUD_PROJECT_ID to pick another)"
            );
        }
        Ok(first.project_id)
    }

    async fn list_apps(&self, project_id: &str) -> Result<Vec<CloudApp>> {
        let list: AppList = self
            .cloud_get(&format!("v1/projects/{project_id}/lightningapps"))
            .await?;
        Ok(list.lightningapps)
    }

    async fn app_openapi(&self, app_url: &str) -> Result<serde_json::Value> {
        let url = parse_base_url(app_url)?.join("openapi.json")?;
        debug!(%url, "fetching cloud app OpenAPI document");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to reach the app at {url}"))?;

        ensure_success(response)?
            .json()
            .await
            .with_context(|| format!("Failed to parse OpenAPI document from {url}"))
    }

    async fn list_artifacts(&self, project_id: &str, app_id: &str) -> Result<Vec<Artifact>> {
        let list: ArtifactList = self
            .cloud_get(&format!(
                "v1/projects/{project_id}/lightningapps/{app_id}/artifacts"
            ))
            .await?;
        Ok(list.artifacts)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download {url}"))?;

        let bytes = ensure_success(response)?
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {url}"))?;
        Ok(bytes.to_vec())
    }
}
