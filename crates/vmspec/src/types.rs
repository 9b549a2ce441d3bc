use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ConfigError, Result};

/// A repository to materialize on the VM next to the primary checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSpec {
    url: String,
    branch: Option<String>,
    target_dir: String,
}

impl RepoSpec {
    /// An empty `branch` is treated as absent. A missing `target_dir` is derived
    /// from the last path segment of `url` with any `.git` suffix removed.
    pub fn new(url: &str, branch: Option<&str>, target_dir: Option<&str>) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidRepo("url is empty".into()));
        }
        let branch = branch.filter(|b| !b.is_empty()).map(String::from);
        let target_dir = match target_dir.filter(|d| !d.is_empty()) {
            Some(dir) => dir.to_string(),
            None => derive_target_dir(url)
                .ok_or_else(|| ConfigError::InvalidRepo(format!("cannot derive directory from {url}")))?,
        };
        if target_dir.starts_with('/')
            || target_dir
                .trim_end_matches('/')
                .split('/')
                .any(|c| c.is_empty() || c == "." || c == "..")
        {
            return Err(ConfigError::InvalidRepo(format!(
                "target_dir must stay inside the home directory: {target_dir}"
            )));
        }
        Ok(Self {
            url: url.to_string(),
            branch,
            target_dir,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `None` means the remote's default branch.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn target_dir(&self) -> &str {
        &self.target_dir
    }
}

/// "https://host/org/my-repo.git/" → "my-repo"
fn derive_target_dir(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// One fully resolved machine to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmSpec {
    pub name: String,
    pub description: String,
    pub machine_type: String,
    pub disk_size_gb: u32,
    pub os_image: String,
    /// Branch of the primary repository to check out.
    pub source_branch: String,
    pub additional_repos: Vec<RepoSpec>,
    /// Start services with the minimal invocation instead of the full stack.
    pub minimal_mode: bool,
    pub labels: BTreeMap<String, String>,
}

/// Name of a credential fetched at boot time. Never the credential itself.
///
/// An empty name means the feature has no credential available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }

    pub fn is_set(&self) -> bool {
        !self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringConfig {
    pub ops_agent_enabled: bool,
    pub netdata_enabled: bool,
    pub netdata_claim_url: String,
    pub netdata_claim_rooms: String,
    pub netdata_claim_token: SecretRef,
}

/// Settings shared by the AI assistant CLIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantConfig {
    pub enabled: bool,
    pub api_key: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteDesktopConfig {
    pub enabled: bool,
    pub password: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GithubCliConfig {
    pub enabled: bool,
    pub token: SecretRef,
}

/// Global git identity for the development user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitIdentity {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl GitIdentity {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none() && self.user_email.is_none()
    }
}

/// Optional capabilities, resolved once per run and shared by every VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    pub monitoring: MonitoringConfig,
    pub claude_code: AssistantConfig,
    pub codex_cli: AssistantConfig,
    pub remote_desktop: RemoteDesktopConfig,
    pub github_cli: GithubCliConfig,
    pub git: GitIdentity,
}

impl FeatureSet {
    /// Every optional capability switched off.
    pub fn all_disabled() -> Self {
        Self {
            monitoring: MonitoringConfig {
                ops_agent_enabled: false,
                netdata_enabled: false,
                netdata_claim_url: String::new(),
                netdata_claim_rooms: String::new(),
                netdata_claim_token: SecretRef::none(),
            },
            claude_code: AssistantConfig {
                enabled: false,
                api_key: SecretRef::none(),
            },
            codex_cli: AssistantConfig {
                enabled: false,
                api_key: SecretRef::none(),
            },
            remote_desktop: RemoteDesktopConfig {
                enabled: false,
                password: SecretRef::none(),
            },
            github_cli: GithubCliConfig {
                enabled: false,
                token: SecretRef::none(),
            },
            git: GitIdentity::default(),
        }
    }
}

/// Output of a resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub vms: Vec<VmSpec>,
    pub features: FeatureSet,
}

impl Resolution {
    pub fn vm(&self, name: &str) -> Option<&VmSpec> {
        self.vms.iter().find(|vm| vm.name == name)
    }
}
