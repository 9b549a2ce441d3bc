use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::document::{self, RepoEntry, VmEntry, VmsDocument};
use crate::error::{ConfigError, Result};
use crate::params::ParamStore;
use crate::types::{
    AssistantConfig, FeatureSet, GitIdentity, GithubCliConfig, MonitoringConfig,
    RemoteDesktopConfig, RepoSpec, Resolution, SecretRef, VmSpec,
};

pub const DEFAULT_MACHINE_TYPE: &str = "e2-standard-8";
pub const DEFAULT_DISK_SIZE_GB: u32 = 100;
pub const DEFAULT_OS_IMAGE: &str = "ubuntu-os-cloud/ubuntu-2204-lts";
pub const DEFAULT_SOURCE_BRANCH: &str = "master";
pub const DEFAULT_NETDATA_CLAIM_URL: &str = "https://app.netdata.cloud";
pub const LEGACY_VM_NAME: &str = "posthog-dev-1";
pub const LEGACY_VM_DESCRIPTION: &str = "PostHog development VM";

/// Directory of the primary checkout under the development user's home.
/// Additional repositories may not be cloned into or under it.
pub const PRIMARY_CHECKOUT_DIR: &str = "posthog";

/// Instance names are limited to 63 characters.
const VM_NAME_MAX: usize = 63;

/// Parameter holding the deployment project id.
pub const PROJECT_KEY: &str = "gcp:project";

const PROJECT_PLACEHOLDERS: [&str; 2] = ["${GCP_PROJECT}", "${PROJECT_ID}"];

/// `entry ?? defaults ?? fallback`, applied to a single field.
pub fn layered<T>(entry: Option<T>, defaults: Option<T>, fallback: T) -> T {
    entry.or(defaults).unwrap_or(fallback)
}

/// Substitute the project placeholders in `value`. A blank project leaves
/// the value untouched.
pub fn interpolate_project(value: &str, project: &str) -> String {
    if project.is_empty() {
        return value.to_string();
    }
    PROJECT_PLACEHOLDERS
        .iter()
        .fold(value.to_string(), |acc, token| acc.replace(token, project))
}

/// Resolve every VM and the shared feature set. All-or-nothing: the first
/// invalid entry fails the whole run.
pub fn resolve(document: Option<&VmsDocument>, params: &dyn ParamStore) -> Result<Resolution> {
    let vms = resolve_vms(document, params)?;
    let features = resolve_features(document, params);
    Ok(Resolution { vms, features })
}

/// Resolve the VM list.
///
/// Source order: the document's `vms` list, then the `vms` JSON parameter,
/// then a single VM built from flat parameters.
pub fn resolve_vms(document: Option<&VmsDocument>, params: &dyn ParamStore) -> Result<Vec<VmSpec>> {
    let project = param(params, PROJECT_KEY).unwrap_or_default();

    let vms = match document.filter(|doc| !doc.vm_entries().is_empty()) {
        Some(doc) => {
            let mut defaults = doc.defaults.clone().unwrap_or_default();
            if defaults.os_image.is_none() {
                defaults.os_image = param(params, "baseImage");
            }
            debug!(count = doc.vm_entries().len(), "resolving vms from document");
            resolve_entries(doc.vm_entries(), &defaults, &project)?
        }
        None => match param(params, "vms") {
            Some(json) => {
                let entries = document::vm_entries_from_json(&json, "parameter vms")?;
                if entries.is_empty() {
                    vec![legacy_vm(params, &project)?]
                } else {
                    debug!(count = entries.len(), "resolving vms from parameter");
                    resolve_entries(&entries, &VmEntry::default(), &project)?
                }
            }
            None => vec![legacy_vm(params, &project)?],
        },
    };

    for vm in &vms {
        info!(
            vm = %vm.name,
            machine_type = %vm.machine_type,
            disk_size_gb = vm.disk_size_gb,
            branch = %vm.source_branch,
            repos = vm.additional_repos.len(),
            minimal = vm.minimal_mode,
            "resolved vm"
        );
    }
    Ok(vms)
}

fn resolve_entries(entries: &[VmEntry], defaults: &VmEntry, project: &str) -> Result<Vec<VmSpec>> {
    let vms = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| resolve_entry(index, entry, defaults, project))
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_names(&vms)?;
    Ok(vms)
}

fn resolve_entry(index: usize, entry: &VmEntry, defaults: &VmEntry, project: &str) -> Result<VmSpec> {
    let name = entry
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ConfigError::MissingName { index })?
        .to_string();
    validate_name(&name)?;

    let disk_size_gb = match entry.disk_size_gb.or(defaults.disk_size_gb) {
        Some(value) => positive_disk_size(&name, value)?,
        None => DEFAULT_DISK_SIZE_GB,
    };

    let os_image = layered(
        entry.os_image.clone(),
        defaults.os_image.clone(),
        DEFAULT_OS_IMAGE.to_string(),
    );

    // The list is inherited as a whole: an entry's own list, even empty,
    // replaces the defaults' list.
    let no_repos = Vec::new();
    let repo_entries = layered(
        entry.additional_repos.as_ref(),
        defaults.additional_repos.as_ref(),
        &no_repos,
    );

    Ok(VmSpec {
        description: layered(
            entry.description.clone(),
            defaults.description.clone(),
            String::new(),
        ),
        machine_type: layered(
            entry.machine_type.clone(),
            defaults.machine_type.clone(),
            DEFAULT_MACHINE_TYPE.to_string(),
        ),
        disk_size_gb,
        os_image: interpolate_project(&os_image, project),
        source_branch: layered(
            entry.posthog_branch.clone(),
            defaults.posthog_branch.clone(),
            DEFAULT_SOURCE_BRANCH.to_string(),
        ),
        additional_repos: repo_specs(repo_entries)?,
        minimal_mode: layered(entry.enable_minimal_mode, defaults.enable_minimal_mode, false),
        labels: layered(entry.labels.clone(), defaults.labels.clone(), BTreeMap::new()),
        name,
    })
}

fn legacy_vm(params: &dyn ParamStore, project: &str) -> Result<VmSpec> {
    debug!("no vm list configured, using single-vm parameters");
    let name = param(params, "vmName")
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| LEGACY_VM_NAME.to_string());
    validate_name(&name)?;

    let disk_size_gb = match param(params, "diskSizeGb") {
        Some(raw) => {
            let value = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidParam {
                key: "diskSizeGb".into(),
                value: raw.clone(),
            })?;
            positive_disk_size(&name, value)?
        }
        None => DEFAULT_DISK_SIZE_GB,
    };

    let os_image = layered(
        param(params, "osImage"),
        param(params, "baseImage"),
        DEFAULT_OS_IMAGE.to_string(),
    );

    let repo_entries = match param(params, "additionalRepos") {
        Some(json) => document::repo_entries_from_json(&json, "parameter additionalRepos")?,
        None => Vec::new(),
    };

    Ok(VmSpec {
        name,
        description: param(params, "vmDescription")
            .unwrap_or_else(|| LEGACY_VM_DESCRIPTION.to_string()),
        machine_type: param(params, "machineType")
            .unwrap_or_else(|| DEFAULT_MACHINE_TYPE.to_string()),
        disk_size_gb,
        os_image: interpolate_project(&os_image, project),
        source_branch: param(params, "posthogBranch")
            .unwrap_or_else(|| DEFAULT_SOURCE_BRANCH.to_string()),
        additional_repos: repo_specs(&repo_entries)?,
        minimal_mode: params.get_bool("enableMinimalMode").unwrap_or(false),
        labels: BTreeMap::new(),
    })
}

fn positive_disk_size(vm: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::InvalidDiskSize {
            vm: vm.to_string(),
            value,
        })
}

/// `[a-z]([-a-z0-9]*[a-z0-9])?`, the cloud instance name syntax. Names also
/// become file names when scripts are rendered.
fn validate_name(name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    let valid = !bytes.is_empty()
        && bytes.len() <= VM_NAME_MAX
        && bytes.first().is_some_and(u8::is_ascii_lowercase)
        && bytes.last().is_some_and(|b| *b != b'-')
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_string()))
    }
}

/// Builds the repositories of one VM. Every repository needs its own
/// directory, outside the primary checkout.
fn repo_specs(entries: &[RepoEntry]) -> Result<Vec<RepoSpec>> {
    let repos = entries
        .iter()
        .map(|r| RepoSpec::new(&r.url, r.branch.as_deref(), r.target_dir.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::with_capacity(repos.len());
    for repo in &repos {
        let dir = repo.target_dir().trim_end_matches('/');
        if dir.split('/').next() == Some(PRIMARY_CHECKOUT_DIR) {
            return Err(ConfigError::InvalidRepo(format!(
                "{} would be cloned into the primary checkout directory {dir}",
                repo.url()
            )));
        }
        if !seen.insert(dir) {
            return Err(ConfigError::InvalidRepo(format!(
                "{} reuses target_dir {dir}",
                repo.url()
            )));
        }
    }
    Ok(repos)
}

fn ensure_unique_names(vms: &[VmSpec]) -> Result<()> {
    let mut seen = HashSet::with_capacity(vms.len());
    for vm in vms {
        if !seen.insert(vm.name.as_str()) {
            return Err(ConfigError::DuplicateName(vm.name.clone()));
        }
    }
    Ok(())
}

/// A parameter, with blank values treated as absent.
fn param(params: &dyn ParamStore, key: &str) -> Option<String> {
    params.get(key).filter(|v| !v.trim().is_empty())
}

fn secret(block: Option<String>, params: &dyn ParamStore, key: &str) -> SecretRef {
    SecretRef::new(layered(block, param(params, key), String::new()))
}

/// Resolve the shared feature blocks: document block, then parameter, then
/// fallback, independently per field.
pub fn resolve_features(document: Option<&VmsDocument>, params: &dyn ParamStore) -> FeatureSet {
    let monitoring = document.and_then(|d| d.monitoring.clone()).unwrap_or_default();
    let claude = document.and_then(|d| d.claude_code.clone()).unwrap_or_default();
    let remote = document.and_then(|d| d.remote_desktop.clone()).unwrap_or_default();
    let codex = document.and_then(|d| d.codex_cli.clone()).unwrap_or_default();
    let github = document.and_then(|d| d.github_cli.clone()).unwrap_or_default();
    let git = document.and_then(|d| d.git.clone()).unwrap_or_default();

    let features = FeatureSet {
        monitoring: MonitoringConfig {
            ops_agent_enabled: layered(
                monitoring.ops_agent_enabled,
                params.get_bool("opsAgentEnabled"),
                true,
            ),
            netdata_enabled: layered(
                monitoring.netdata_enabled,
                params.get_bool("netdataEnabled"),
                false,
            ),
            netdata_claim_url: layered(
                monitoring.netdata_claim_url,
                param(params, "netdataClaimUrl"),
                DEFAULT_NETDATA_CLAIM_URL.to_string(),
            ),
            netdata_claim_rooms: layered(
                monitoring.netdata_claim_rooms,
                param(params, "netdataClaimRooms"),
                String::new(),
            ),
            netdata_claim_token: secret(
                monitoring.netdata_claim_token_secret_name,
                params,
                "netdataClaimTokenSecretName",
            ),
        },
        claude_code: AssistantConfig {
            enabled: layered(claude.enabled, params.get_bool("claudeCodeEnabled"), true),
            api_key: secret(claude.secret_name, params, "anthropicSecretName"),
        },
        codex_cli: AssistantConfig {
            enabled: layered(codex.enabled, params.get_bool("codexCliEnabled"), true),
            api_key: secret(codex.secret_name, params, "openaiSecretName"),
        },
        remote_desktop: RemoteDesktopConfig {
            enabled: layered(remote.enabled, params.get_bool("remoteDesktopEnabled"), true),
            password: secret(remote.password_secret_name, params, "rdpPasswordSecretName"),
        },
        github_cli: GithubCliConfig {
            enabled: layered(github.enabled, params.get_bool("githubCliEnabled"), true),
            token: secret(github.secret_name, params, "githubTokenSecretName"),
        },
        git: GitIdentity {
            user_name: git
                .user_name
                .filter(|v| !v.trim().is_empty())
                .or_else(|| param(params, "gitUserName")),
            user_email: git
                .user_email
                .filter(|v| !v.trim().is_empty())
                .or_else(|| param(params, "gitUserEmail")),
        },
    };

    debug!(
        ops_agent = features.monitoring.ops_agent_enabled,
        netdata = features.monitoring.netdata_enabled,
        netdata_token = features.monitoring.netdata_claim_token.is_set(),
        claude_code = features.claude_code.enabled,
        claude_code_key = features.claude_code.api_key.is_set(),
        codex_cli = features.codex_cli.enabled,
        codex_cli_key = features.codex_cli.api_key.is_set(),
        remote_desktop = features.remote_desktop.enabled,
        remote_desktop_password = features.remote_desktop.password.is_set(),
        github_cli = features.github_cli.enabled,
        github_token = features.github_cli.token.is_set(),
        "resolved features"
    );
    features
}

impl Default for FeatureSet {
    /// Fallback values: every feature on except Netdata, no credentials.
    fn default() -> Self {
        resolve_features(None, &crate::params::StaticParams::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::StaticParams;

    fn doc(yaml: &str) -> VmsDocument {
        VmsDocument::from_yaml(yaml, "vms.yaml").unwrap()
    }

    #[test]
    fn layered_precedence() {
        assert_eq!(layered(Some(1), Some(2), 3), 1);
        assert_eq!(layered(None, Some(2), 3), 2);
        assert_eq!(layered(None, None, 3), 3);
    }

    #[test]
    fn one_spec_per_entry_fully_populated() {
        let d = doc("vms:\n  - name: a\n  - name: b\n  - name: c\n");
        let vms = resolve_vms(Some(&d), &StaticParams::new()).unwrap();
        assert_eq!(
            vms.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
        let a = &vms[0];
        assert_eq!(a.description, "");
        assert_eq!(a.machine_type, DEFAULT_MACHINE_TYPE);
        assert_eq!(a.disk_size_gb, DEFAULT_DISK_SIZE_GB);
        assert_eq!(a.os_image, DEFAULT_OS_IMAGE);
        assert_eq!(a.source_branch, DEFAULT_SOURCE_BRANCH);
        assert!(a.additional_repos.is_empty());
        assert!(!a.minimal_mode);
        assert!(a.labels.is_empty());
    }

    #[test]
    fn disk_size_inherits_from_defaults() {
        let d = doc("defaults:\n  disk_size_gb: 200\nvms:\n  - name: a\n  - name: b\n    disk_size_gb: 50\n");
        let vms = resolve_vms(Some(&d), &StaticParams::new()).unwrap();
        assert_eq!(vms[0].disk_size_gb, 200);
        assert_eq!(vms[1].disk_size_gb, 50);
    }

    #[test]
    fn precedence_is_per_field() {
        let d = doc(
            "defaults:\n  machine_type: n2-standard-4\n  disk_size_gb: 300\nvms:\n  - name: a\n    disk_size_gb: 20\n",
        );
        let vm = &resolve_vms(Some(&d), &StaticParams::new()).unwrap()[0];
        assert_eq!(vm.machine_type, "n2-standard-4");
        assert_eq!(vm.disk_size_gb, 20);
    }

    #[test]
    fn missing_name_fails_whole_run() {
        let d = doc("vms:\n  - name: a\n  - machine_type: e2-small\n");
        let err = resolve(Some(&d), &StaticParams::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingName { index: 1 }), "got: {err}");
    }

    #[test]
    fn blank_name_rejected() {
        let d = doc("vms:\n  - name: '  '\n");
        let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingName { index: 0 }), "got: {err}");
    }

    #[test]
    fn duplicate_names_rejected() {
        let d = doc("vms:\n  - name: a\n  - name: b\n  - name: a\n");
        let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(ref n) if n == "a"), "got: {err}");
    }

    #[test]
    fn non_positive_disk_rejected() {
        for size in ["0", "-5"] {
            let d = doc(&format!("vms:\n  - name: a\n    disk_size_gb: {size}\n"));
            let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidDiskSize { .. }), "got: {err}");
        }
    }

    #[test]
    fn invalid_default_disk_rejected() {
        let d = doc("defaults:\n  disk_size_gb: 0\nvms:\n  - name: a\n");
        assert!(resolve_vms(Some(&d), &StaticParams::new()).is_err());
    }

    #[test]
    fn project_placeholder_substituted() {
        let d = doc("defaults:\n  os_image: projects/${GCP_PROJECT}/global/images/dev\nvms:\n  - name: a\n  - name: b\n    os_image: projects/${PROJECT_ID}/global/images/b\n");
        let params = StaticParams::new().with(PROJECT_KEY, "acme-dev");
        let vms = resolve_vms(Some(&d), &params).unwrap();
        assert_eq!(vms[0].os_image, "projects/acme-dev/global/images/dev");
        assert_eq!(vms[1].os_image, "projects/acme-dev/global/images/b");
    }

    #[test]
    fn placeholder_kept_without_project() {
        assert_eq!(interpolate_project("p/${GCP_PROJECT}/i", ""), "p/${GCP_PROJECT}/i");
    }

    #[test]
    fn base_image_fills_defaults() {
        let d = doc("vms:\n  - name: a\n  - name: b\n    os_image: custom\n");
        let params = StaticParams::new().with("baseImage", "projects/x/global/images/base");
        let vms = resolve_vms(Some(&d), &params).unwrap();
        assert_eq!(vms[0].os_image, "projects/x/global/images/base");
        assert_eq!(vms[1].os_image, "custom");
    }

    #[test]
    fn repo_list_inherited_whole() {
        let d = doc(
            r#"
defaults:
  additional_repos:
    - url: https://github.com/posthog/posthog-js.git
    - url: https://github.com/posthog/charts.git
      branch: main
vms:
  - name: inherits
  - name: overrides
    additional_repos:
      - url: https://github.com/org/other.git
        target_dir: elsewhere
  - name: empty
    additional_repos: []
"#,
        );
        let vms = resolve_vms(Some(&d), &StaticParams::new()).unwrap();
        assert_eq!(vms[0].additional_repos.len(), 2);
        assert_eq!(vms[0].additional_repos[0].target_dir(), "posthog-js");
        assert_eq!(vms[0].additional_repos[1].branch(), Some("main"));
        assert_eq!(vms[1].additional_repos.len(), 1);
        assert_eq!(vms[1].additional_repos[0].target_dir(), "elsewhere");
        assert!(vms[2].additional_repos.is_empty());
    }

    #[test]
    fn repo_in_primary_checkout_rejected() {
        for repos in [
            "    - url: https://github.com/me/posthog.git\n",
            "    - url: https://github.com/org/tools.git\n      target_dir: posthog/vendor\n",
        ] {
            let d = doc(&format!("vms:\n  - name: a\n    additional_repos:\n{repos}"));
            let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRepo(_)), "got: {err}");
        }
    }

    #[test]
    fn repos_sharing_target_dir_rejected() {
        let d = doc(
            r#"
vms:
  - name: a
    additional_repos:
      - url: https://github.com/posthog/posthog-js.git
      - url: https://github.com/me/posthog-js.git
"#,
        );
        let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRepo(_)), "got: {err}");
    }

    #[test]
    fn same_target_dir_on_different_vms_allowed() {
        let d = doc(
            r#"
defaults:
  additional_repos:
    - url: https://github.com/posthog/posthog-js.git
vms:
  - name: a
  - name: b
"#,
        );
        let vms = resolve_vms(Some(&d), &StaticParams::new()).unwrap();
        assert_eq!(vms[1].additional_repos[0].target_dir(), "posthog-js");
    }

    #[test]
    fn names_must_be_instance_names() {
        let long = "a".repeat(64);
        for name in ["../escaped", "Dev", "dev_1", "1dev", "dev-", "a/b", long.as_str()] {
            let d = doc(&format!("vms:\n  - name: '{name}'\n"));
            let err = resolve_vms(Some(&d), &StaticParams::new()).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidName(_)), "{name}: {err}");
        }
        let d = doc("vms:\n  - name: dev-alice-2\n");
        assert_eq!(resolve_vms(Some(&d), &StaticParams::new()).unwrap()[0].name, "dev-alice-2");
    }

    #[test]
    fn legacy_name_trimmed_and_checked() {
        let vms = resolve_vms(None, &StaticParams::new().with("vmName", "  solo  ")).unwrap();
        assert_eq!(vms[0].name, "solo");
        let err = resolve_vms(None, &StaticParams::new().with("vmName", "../up")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName(_)), "got: {err}");
    }

    #[test]
    fn labels_from_defaults_or_entry() {
        let d = doc("defaults:\n  labels:\n    team: web\nvms:\n  - name: a\n  - name: b\n    labels:\n      owner: bob\n");
        let vms = resolve_vms(Some(&d), &StaticParams::new()).unwrap();
        assert_eq!(vms[0].labels.get("team").map(String::as_str), Some("web"));
        assert_eq!(vms[1].labels.get("owner").map(String::as_str), Some("bob"));
        assert!(!vms[1].labels.contains_key("team"));
    }

    #[test]
    fn legacy_mode_without_document() {
        let vms = resolve_vms(None, &StaticParams::new()).unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].name, LEGACY_VM_NAME);
        assert_eq!(vms[0].description, LEGACY_VM_DESCRIPTION);
        assert_eq!(vms[0].disk_size_gb, DEFAULT_DISK_SIZE_GB);
    }

    #[test]
    fn legacy_mode_with_empty_list() {
        let d = doc("defaults:\n  machine_type: ignored\nvms: []\n");
        let params = StaticParams::new()
            .with("vmName", "solo")
            .with("diskSizeGb", "250")
            .with("posthogBranch", "feat/x")
            .with("enableMinimalMode", "true")
            .with("osImage", "projects/${GCP_PROJECT}/img")
            .with(PROJECT_KEY, "p1")
            .with(
                "additionalRepos",
                r#"[{"url": "https://github.com/posthog/posthog.com.git", "branch": ""}]"#,
            );
        let vm = &resolve_vms(Some(&d), &params).unwrap()[0];
        assert_eq!(vm.name, "solo");
        assert_eq!(vm.machine_type, DEFAULT_MACHINE_TYPE);
        assert_eq!(vm.disk_size_gb, 250);
        assert_eq!(vm.source_branch, "feat/x");
        assert!(vm.minimal_mode);
        assert_eq!(vm.os_image, "projects/p1/img");
        assert_eq!(vm.additional_repos[0].target_dir(), "posthog.com");
        assert_eq!(vm.additional_repos[0].branch(), None);
    }

    #[test]
    fn legacy_mode_bad_disk_param() {
        let params = StaticParams::new().with("diskSizeGb", "lots");
        let err = resolve_vms(None, &params).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParam { .. }), "got: {err}");
        let params = StaticParams::new().with("diskSizeGb", "0");
        let err = resolve_vms(None, &params).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDiskSize { .. }), "got: {err}");
    }

    #[test]
    fn legacy_mode_malformed_repos() {
        let params = StaticParams::new().with("additionalRepos", "[{\"url\":");
        let err = resolve_vms(None, &params).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn vms_parameter_used_without_document() {
        let params = StaticParams::new().with(
            "vms",
            r#"[{"name": "j1", "machine_type": "e2-medium"}, {"name": "j2"}]"#,
        );
        let vms = resolve_vms(None, &params).unwrap();
        assert_eq!(vms.len(), 2);
        assert_eq!(vms[0].machine_type, "e2-medium");
        assert_eq!(vms[1].machine_type, DEFAULT_MACHINE_TYPE);
    }

    #[test]
    fn malformed_vms_parameter_is_fatal() {
        let params = StaticParams::new().with("vms", "not json");
        let err = resolve(None, &params).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn feature_fallbacks() {
        let features = resolve_features(None, &StaticParams::new());
        assert!(features.monitoring.ops_agent_enabled);
        assert!(!features.monitoring.netdata_enabled);
        assert_eq!(features.monitoring.netdata_claim_url, DEFAULT_NETDATA_CLAIM_URL);
        assert!(features.claude_code.enabled);
        assert!(!features.claude_code.api_key.is_set());
        assert!(features.codex_cli.enabled);
        assert!(features.remote_desktop.enabled);
        assert!(features.github_cli.enabled);
        assert!(features.git.is_empty());
        assert_eq!(features, FeatureSet::default());
    }

    #[test]
    fn feature_precedence_block_then_param() {
        let d = doc("claude_code:\n  secret_name: from-doc\ngithub_cli:\n  enabled: false\nmonitoring:\n  netdata_enabled: true\n");
        let params = StaticParams::new()
            .with("anthropicSecretName", "from-param")
            .with("openaiSecretName", "openai-key")
            .with("githubCliEnabled", "true")
            .with("netdataClaimRooms", "room-1")
            .with("netdataClaimTokenSecretName", "netdata-token")
            .with("gitUserEmail", "dev@example.com");
        let features = resolve_features(Some(&d), &params);
        assert_eq!(features.claude_code.api_key.name(), Some("from-doc"));
        assert_eq!(features.codex_cli.api_key.name(), Some("openai-key"));
        assert!(!features.github_cli.enabled);
        assert!(features.monitoring.netdata_enabled);
        assert_eq!(features.monitoring.netdata_claim_rooms, "room-1");
        assert_eq!(features.monitoring.netdata_claim_token.name(), Some("netdata-token"));
        assert_eq!(features.git.user_email.as_deref(), Some("dev@example.com"));
        assert_eq!(features.git.user_name, None);
    }

    #[test]
    fn blank_param_is_absent() {
        let params = StaticParams::new().with("vmName", "").with("anthropicSecretName", " ");
        let res = resolve(None, &params).unwrap();
        assert_eq!(res.vms[0].name, LEGACY_VM_NAME);
        assert!(!res.features.claude_code.api_key.is_set());
    }
}
