//! Layered configuration resolution for development VMs.
//!
//! Three sources are merged per field: an explicit VM entry, the named
//! `defaults` block of the VM document, and built-in fallback constants.
//! Deployment parameters supply the project id, secret-reference names and,
//! when no VM list is declared, a single VM.

mod document;
mod error;
mod params;
mod resolve;
mod types;

pub use document::{
    GitBlock, MonitoringBlock, RemoteDesktopBlock, RepoEntry, SecretBlock, VmEntry, VmsDocument,
};
pub use error::{ConfigError, Result};
pub use params::{ParamStore, StaticParams};
pub use resolve::{
    DEFAULT_DISK_SIZE_GB, DEFAULT_MACHINE_TYPE, DEFAULT_NETDATA_CLAIM_URL, DEFAULT_OS_IMAGE,
    DEFAULT_SOURCE_BRANCH, LEGACY_VM_DESCRIPTION, LEGACY_VM_NAME, PRIMARY_CHECKOUT_DIR, PROJECT_KEY,
    interpolate_project, layered, resolve, resolve_features, resolve_vms,
};
pub use types::{
    AssistantConfig, FeatureSet, GitIdentity, GithubCliConfig, MonitoringConfig,
    RemoteDesktopConfig, RepoSpec, Resolution, SecretRef, VmSpec,
};
