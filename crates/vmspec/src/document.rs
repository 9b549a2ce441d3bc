//! The declarative VM document (`vms.yaml`).
//!
//! Every field is optional here; absence and explicit `null` are the same
//! thing and fall through to the next precedence level during resolution.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VmsDocument {
    pub defaults: Option<VmEntry>,
    pub vms: Option<Vec<VmEntry>>,
    pub monitoring: Option<MonitoringBlock>,
    pub claude_code: Option<SecretBlock>,
    pub remote_desktop: Option<RemoteDesktopBlock>,
    pub codex_cli: Option<SecretBlock>,
    pub github_cli: Option<SecretBlock>,
    pub git: Option<GitBlock>,
}

/// One VM entry, or the named defaults block.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VmEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub machine_type: Option<String>,
    pub disk_size_gb: Option<i64>,
    pub os_image: Option<String>,
    #[serde(alias = "source_branch")]
    pub posthog_branch: Option<String>,
    pub additional_repos: Option<Vec<RepoEntry>>,
    pub enable_minimal_mode: Option<bool>,
    pub labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepoEntry {
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub target_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringBlock {
    pub ops_agent_enabled: Option<bool>,
    pub netdata_enabled: Option<bool>,
    pub netdata_claim_url: Option<String>,
    pub netdata_claim_rooms: Option<String>,
    pub netdata_claim_token_secret_name: Option<String>,
}

/// A feature whose only credential is a single secret name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecretBlock {
    pub enabled: Option<bool>,
    pub secret_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteDesktopBlock {
    pub enabled: Option<bool>,
    pub password_secret_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitBlock {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl VmsDocument {
    /// Parse a YAML document. `source_name` only labels errors.
    ///
    /// An empty document is valid and equivalent to no document at all.
    pub fn from_yaml(content: &str, source_name: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: Option<Self> =
            serde_yaml_ng::from_str(content).map_err(|e| ConfigError::parse(source_name, e))?;
        Ok(doc.unwrap_or_default())
    }

    /// Entries of the `vms` list; empty when absent.
    pub fn vm_entries(&self) -> &[VmEntry] {
        self.vms.as_deref().unwrap_or_default()
    }
}

/// Parse a JSON array of VM entries (the `vms` parameter).
pub fn vm_entries_from_json(content: &str, source_name: &str) -> Result<Vec<VmEntry>> {
    serde_json::from_str(content).map_err(|e| ConfigError::parse(source_name, e))
}

/// Parse a JSON array of repositories (the `additionalRepos` parameter).
pub fn repo_entries_from_json(content: &str, source_name: &str) -> Result<Vec<RepoEntry>> {
    serde_json::from_str(content).map_err(|e| ConfigError::parse(source_name, e))
}
