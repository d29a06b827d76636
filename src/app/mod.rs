//! App targets and the remote platform seam.
//!
//! parse_target -> AppTarget { Local | Cloud(name_or_id) }
//! AppPlatform: everything `connect` needs from the outside world (local app
//! OpenAPI document, cloud project / apps / artifacts, raw downloads).
//! `client::HttpPlatform` is the reqwest-backed implementation.

pub mod client;
pub mod error;
pub mod manifest;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

pub use client::HttpPlatform;
pub use error::AppError;
pub use manifest::{CommandManifest, CommandMetadata};

/// Name under which a locally running app is addressed and recorded.
pub const LOCALHOST: &str = "localhost";

/// Where the user wants to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppTarget {
    /// The app served on this machine.
    Local,
    /// A cloud app, addressed by display name or id.
    Cloud(String),
}

impl AppTarget {
    /// Name used to match an existing connection marker.
    pub fn name(&self) -> &str {
        match self {
            AppTarget::Local => LOCALHOST,
            AppTarget::Cloud(name) => name,
        }
    }
}

impl fmt::Display for AppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppTarget::Local => write!(f, "local: {LOCALHOST}"),
            AppTarget::Cloud(name) => write!(f, "cloud: {name}"),
        }
    }
}

/// Parse the `connect` argument.
///
/// - "localhost" -> Local
/// - "localhost:8080", "localhost/x" -> rejected (only the default local app is supported)
/// - anything else -> Cloud name or id
pub fn parse_target(raw: &str) -> Result<AppTarget, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyTarget);
    }
    if trimmed == LOCALHOST {
        return Ok(AppTarget::Local);
    }
    if trimmed.starts_with(LOCALHOST) {
        return Err(AppError::LocalhostOnly);
    }
    Ok(AppTarget::Cloud(trimmed.to_string()))
}

/// A cloud app instance as listed by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudApp {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: AppStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppStatus {
    /// Public URL of the running app; empty while it is starting.
    #[serde(default)]
    pub url: String,
}

impl CloudApp {
    /// Display name, falling back to the internal name.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn url(&self) -> &str {
        &self.status.url
    }

    pub fn matches(&self, name_or_id: &str) -> bool {
        self.id == name_or_id || self.display_name() == name_or_id
    }
}

/// A file published by a cloud app (client scripts live under `commands/`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Artifact {
    pub filename: String,
    #[serde(default)]
    pub url: String,
}

/// Remote operations used by `connect`.
#[async_trait]
pub trait AppPlatform: Send + Sync {
    /// OpenAPI document of the local app, `None` when nothing is listening.
    async fn local_openapi(&self) -> Result<Option<serde_json::Value>>;

    /// Project whose apps are searched.
    async fn project_id(&self) -> Result<String>;

    async fn list_apps(&self, project_id: &str) -> Result<Vec<CloudApp>>;

    /// OpenAPI document served by a cloud app at `app_url`.
    async fn app_openapi(&self, app_url: &str) -> Result<serde_json::Value>;

    async fn list_artifacts(&self, project_id: &str, app_id: &str) -> Result<Vec<Artifact>>;

    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_localhost() {
        let target = parse_target("localhost").unwrap();
        assert_eq!(target, AppTarget::Local);
        assert_eq!(target.name(), "localhost");
    }

    #[test]
    fn parse_cloud_name() {
        let target = parse_target("  my-app ").unwrap();
        assert_eq!(target, AppTarget::Cloud("my-app".into()));
        assert_eq!(target.to_string(), "cloud: my-app");
    }

    #[test]
    fn localhost_variants_rejected() {
        let err = parse_target("localhost:7501").unwrap_err();
        assert!(matches!(err, AppError::LocalhostOnly));
        assert_eq!(
            err.to_string(),
            "You need to pass localhost to connect to the local Lightning App."
        );
    }

    #[test]
    fn empty_target_rejected() {
        assert!(matches!(parse_target("   "), Err(AppError::EmptyTarget)));
    }

    #[test]
    fn cloud_app_display_name_fallback() {
        let app: CloudApp = serde_json::from_value(serde_json::json!({
            "id": "1234",
            "name": "example-internal",
            "displayName": "",
            "status": {"url": "https://example.lightning.app"}
        }))
        .unwrap();
        assert_eq!(app.display_name(), "example-internal");
        assert!(app.matches("1234"));
        assert!(app.matches("example-internal"));
        assert_eq!(app.url(), "https://example.lightning.app");
    }

    #[test]
    fn cloud_app_missing_status_is_starting() {
        let app: CloudApp =
            serde_json::from_value(serde_json::json!({"id": "1", "displayName": "demo"})).unwrap();
        assert_eq!(app.display_name(), "demo");
        assert!(app.url().is_empty());
    }
}
