//! Persisted state file

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

pub const STATE_VERSION: u32 = 1;

/// One managed instance as persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// The state file: every managed instance keyed by address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    /// Incremented on every save
    pub serial: u64,
    /// Identifies the history this state belongs to
    pub lineage: Uuid,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: BTreeMap<String, StateRecord>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            lineage: Uuid::new_v4(),
            updated_at: None,
            resources: BTreeMap::new(),
        }
    }

    /// Load the state file, or start a new one when it does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state at {:?}, starting empty", path);
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read state file {}", path.display()))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("cannot parse state file {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "state file {} has version {}, this build supports up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        tracing::debug!(
            "Loaded state serial={} with {} resources",
            state.serial,
            state.resources.len()
        );
        Ok(state)
    }

    /// Bump the serial and write the file atomically
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.serial += 1;
        self.updated_at = Some(Utc::now());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("cannot write state file {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("cannot replace state file {}", path.display()))?;

        tracing::info!("Saved state serial={} to {:?}", self.serial, path);
        Ok(())
    }
}
