//! Configuration Management
//!
//! Provider settings come from three places, highest precedence first:
//! command line flags, environment (`AIVEN_TOKEN`, `AIVEN_WEB_URL`,
//! `AIVEN_PROJECT_NAME`, read by clap) and the JSON config file in the user
//! config directory.

use crate::api::client::DEFAULT_API_URL;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Settings as stored in the config file or given on the command line
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Aiven API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Aiven web or API URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Default project, used by `sweep`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Validated settings the client is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_token: String,
    pub api_url: String,
    pub project: Option<String>,
}

impl ProviderConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aiven-provider").join("config.json"))
    }

    /// Load configuration from the default location.
    ///
    /// A missing file is an empty configuration; a malformed one is logged
    /// and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("cannot write config file {}", path.display()))?;

        Ok(())
    }

    /// Fill unset fields from a lower-precedence source
    pub fn or(self, fallback: ProviderConfig) -> Self {
        Self {
            api_token: self.api_token.or(fallback.api_token),
            api_url: self.api_url.or(fallback.api_url),
            project: self.project.or(fallback.project),
        }
    }

    /// Validate and produce the final settings
    pub fn into_settings(self) -> Result<Settings> {
        let api_token = match self.api_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => token,
            None => bail!("no API token configured: set AIVEN_TOKEN or use --token"),
        };

        let api_url = match self.api_url.filter(|u| !u.is_empty()) {
            Some(raw) => normalize_api_url(&raw)?,
            None => DEFAULT_API_URL.to_string(),
        };

        Ok(Settings {
            api_token,
            api_url,
            project: self.project.filter(|p| !p.is_empty()),
        })
    }
}

/// Accept either the web URL (`https://api.aiven.io`) or the API URL
/// (`https://api.aiven.io/v1`)
fn normalize_api_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid API URL `{}`", raw))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("invalid API URL `{}`: expected http or https", raw);
    }

    let base = url.as_str().trim_end_matches('/');
    if url.path() == "/" {
        Ok(format!("{}/v1", base))
    } else {
        Ok(base.to_string())
    }
}
