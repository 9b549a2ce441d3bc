//! Declarations handed to the resource layer: one network, the SSH firewall
//! rule, and one instance per resolved VM.

use std::collections::BTreeMap;

use bootscript::ComposedScript;
use serde::Serialize;
use vmspec::{ParamStore, VmSpec};

pub(crate) const NETWORK_NAME: &str = "posthog-dev-network";
pub(crate) const SSH_FIREWALL_NAME: &str = "posthog-dev-ssh";
/// Network tag carried by every instance and targeted by the firewall.
pub(crate) const INSTANCE_TAG: &str = "posthog-dev";
pub(crate) const DEFAULT_REGION: &str = "us-central1";
pub(crate) const BOOT_DISK_TYPE: &str = "pd-ssd";
pub(crate) const SERVICE_ACCOUNT_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
/// Cloud label values are limited to 63 characters.
const LABEL_VALUE_MAX: usize = 63;

#[derive(Debug, Serialize)]
pub struct Plan {
    pub project: Option<String>,
    pub zone: String,
    pub network: NetworkDecl,
    pub firewall: FirewallDecl,
    pub instances: Vec<InstanceDecl>,
}

#[derive(Debug, Serialize)]
pub struct NetworkDecl {
    pub name: String,
    pub auto_create_subnetworks: bool,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct FirewallDecl {
    pub name: String,
    pub network: String,
    pub description: String,
    pub protocol: String,
    pub ports: Vec<String>,
    pub source_ranges: Vec<String>,
    pub target_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InstanceDecl {
    pub name: String,
    pub zone: String,
    pub machine_type: String,
    pub description: String,
    pub tags: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub boot_disk: BootDiskDecl,
    pub network: String,
    pub metadata: BTreeMap<String, String>,
    pub service_account_scopes: Vec<String>,
    pub allow_stopping_for_update: bool,
    pub startup_script: String,
}

#[derive(Debug, Serialize)]
pub struct BootDiskDecl {
    pub image: String,
    pub size_gb: u32,
    #[serde(rename = "type")]
    pub disk_type: String,
    pub auto_delete: bool,
}

/// `gcp:zone`, else zone `b` of `gcp:region`, else zone `b` of the default region.
pub fn zone(params: &dyn ParamStore) -> String {
    let non_empty = |key| params.get(key).filter(|v: &String| !v.trim().is_empty());
    if let Some(zone) = non_empty("gcp:zone") {
        return zone;
    }
    let region = non_empty("gcp:region").unwrap_or_else(|| DEFAULT_REGION.to_string());
    format!("{region}-b")
}

/// Lowercase, `/` and `_` (and anything else a label value can't hold)
/// become `-`, truncated to the label length limit.
pub fn sanitize_label_value(value: &str) -> String {
    value
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .take(LABEL_VALUE_MAX)
        .collect()
}

/// User labels first; system labels overwrite them.
pub fn instance_labels(vm: &VmSpec) -> BTreeMap<String, String> {
    let mut labels = vm.labels.clone();
    labels.insert("purpose".into(), INSTANCE_TAG.into());
    labels.insert("managed-by".into(), "provisioner".into());
    labels.insert("branch".into(), sanitize_label_value(&vm.source_branch));
    labels
}

pub fn network() -> NetworkDecl {
    NetworkDecl {
        name: NETWORK_NAME.into(),
        auto_create_subnetworks: true,
        description: "Network for PostHog development VMs".into(),
    }
}

/// SSH stays open to all sources so OS Login works.
pub fn ssh_firewall() -> FirewallDecl {
    FirewallDecl {
        name: SSH_FIREWALL_NAME.into(),
        network: NETWORK_NAME.into(),
        description: "Allow SSH for OS Login".into(),
        protocol: "tcp".into(),
        ports: vec!["22".into()],
        source_ranges: vec!["0.0.0.0/0".into()],
        target_tags: vec![INSTANCE_TAG.into()],
    }
}

pub fn instance(vm: &VmSpec, zone: &str, script: &ComposedScript) -> InstanceDecl {
    let metadata = BTreeMap::from([
        ("enable-oslogin".to_string(), "TRUE".to_string()),
        ("startup-script-sha256".to_string(), script.digest().to_string()),
    ]);
    InstanceDecl {
        name: vm.name.clone(),
        zone: zone.to_string(),
        machine_type: vm.machine_type.clone(),
        description: vm.description.clone(),
        tags: vec![INSTANCE_TAG.into()],
        labels: instance_labels(vm),
        boot_disk: BootDiskDecl {
            image: vm.os_image.clone(),
            size_gb: vm.disk_size_gb,
            disk_type: BOOT_DISK_TYPE.into(),
            auto_delete: true,
        },
        network: NETWORK_NAME.into(),
        metadata,
        service_account_scopes: vec![SERVICE_ACCOUNT_SCOPE.into()],
        allow_stopping_for_update: true,
        startup_script: script.text().to_string(),
    }
}
