//! Runtime settings.
//!
//! Global flags are declared once (`GlobalOpts`, flattened into the top-level
//! CLI) and each one is backed by an environment variable. `Settings::resolve`
//! fills the remaining gaps from the user's home directory:
//!
//!   connection root   ~/.lightning/lightning_connection
//!   credentials       ~/.lightning/credentials.json  (api_key)
//!   ppid              parent of the current process

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::connection::process;

pub const DEFAULT_LOCAL_APP_URL: &str = "http://localhost:7501";
pub const DEFAULT_CLOUD_URL: &str = "https://lightning.ai";

/// Global options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Directory holding one connection folder per parent process
    #[arg(long, global = true, env = "LIGHTNING_CONNECTION_DIR", value_name = "DIR")]
    pub connection_dir: Option<PathBuf>,

    /// Process id keying the connection (defaults to the parent process)
    #[arg(long, global = true, env = "LIGHTNING_CONNECTION_PPID", hide = true)]
    pub ppid: Option<String>,

    /// Base URL of a locally running app
    #[arg(long, global = true, env = "LIGHTNING_LOCAL_APP_URL", value_name = "URL")]
    pub local_app_url: Option<String>,

    /// Base URL of the cloud platform API
    #[arg(long, global = true, env = "LIGHTNING_CLOUD_URL", value_name = "URL")]
    pub cloud_url: Option<String>,

    /// API token for the cloud platform (falls back to the credentials file)
    #[arg(long, global = true, env = "LIGHTNING_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Cloud project to search for apps (skips the membership lookup)
    #[arg(long, global = true, env = "LIGHTNING_CLOUD_PROJECT_ID", value_name = "ID")]
    pub project_id: Option<String>,
}

/// Fully resolved settings handed to the commands.
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection_root: PathBuf,
    pub ppid: String,
    pub local_app_url: Url,
    pub cloud_url: Url,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

/// Contents of `~/.lightning/credentials.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub api_key: Option<String>,
}

impl Credentials {
    /// Load credentials; a missing file yields empty credentials.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse credentials at {}", path.display()))
    }
}

impl Settings {
    pub fn resolve(opts: GlobalOpts) -> Result<Self> {
        let home = lightning_home();

        let connection_root = match opts.connection_dir {
            Some(dir) => dir,
            None => home
                .as_ref()
                .context("Unable to determine home directory")?
                .join("lightning_connection"),
        };

        let ppid = match opts.ppid.filter(|p| !p.trim().is_empty()) {
            Some(p) => p,
            None => process::parent_pid()?.to_string(),
        };

        let local_app_url =
            parse_base_url(opts.local_app_url.as_deref().unwrap_or(DEFAULT_LOCAL_APP_URL))?;
        let cloud_url = parse_base_url(opts.cloud_url.as_deref().unwrap_or(DEFAULT_CLOUD_URL))?;

        let api_key = match opts.api_key.filter(|k| !k.trim().is_empty()) {
            Some(k) => Some(k),
            None => match &home {
                Some(h) => Credentials::load(&h.join("credentials.json"))?.api_key,
                None => None,
            },
        };

        debug!(root = %connection_root.display(), %ppid, "resolved connection settings");

        Ok(Self {
            connection_root,
            ppid,
            local_app_url,
            cloud_url,
            api_key,
            project_id: opts.project_id.filter(|p| !p.trim().is_empty()),
        })
    }
}

/// `~/.lightning`, if a home directory can be determined.
pub fn lightning_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".lightning"))
}

/// Parse a base URL, guaranteeing a trailing slash so `Url::join` appends
/// instead of replacing the last path segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid URL: '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:7501").unwrap();
        assert_eq!(url.as_str(), "http://localhost:7501/");
        assert_eq!(
            url.join("openapi.json").unwrap().as_str(),
            "http://localhost:7501/openapi.json"
        );

        let nested = parse_base_url("https://example.org/app/").unwrap();
        assert_eq!(
            nested.join("openapi.json").unwrap().as_str(),
            "https://example.org/app/openapi.json"
        );
    }

    #[test]
    fn invalid_url_rejected() {
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn explicit_options_win() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(GlobalOpts {
            connection_dir: Some(dir.path().to_path_buf()),
            ppid: Some("4242".into()),
            local_app_url: Some("http://127.0.0.1:9000".into()),
            cloud_url: None,
            api_key: Some("secret".into()),
            project_id: Some("proj".into()),
        })
        .unwrap();

        assert_eq!(settings.connection_root, dir.path());
        assert_eq!(settings.ppid, "4242");
        assert_eq!(settings.local_app_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(settings.cloud_url.as_str(), "https://lightning.ai/");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.project_id.as_deref(), Some("proj"));
    }

    #[test]
    fn ppid_defaults_to_parent_process() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::resolve(GlobalOpts {
            connection_dir: Some(dir.path().to_path_buf()),
            api_key: Some("k".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(settings.ppid, process::parent_pid().unwrap().to_string());
    }

    #[test]
    fn credentials_file_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"user_id":"u-1","api_key":"abc","username":"me"}"#).unwrap();

        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn missing_credentials_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let creds = Credentials::load(&dir.path().join("nope.json")).unwrap();
        assert!(creds.api_key.is_none());
    }
}
