//! Boot script composition for development VMs.
//!
//! A [`ScriptComposer`] owns a fixed catalogue of [`ScriptSection`]s grouped
//! into twelve strictly ordered [`Phase`]s. Composing walks the catalogue
//! in order, renders every section whose predicate holds for the given
//! [`VmSpec`](vmspec::VmSpec) and [`FeatureSet`](vmspec::FeatureSet), and
//! returns the concatenated script with its digest.
//!
//! Credentials never appear in the output. Sections reference them by
//! secret name and the script fetches them at boot.

mod composer;
pub mod constants;
mod quote;
mod section;
mod sections;

pub use composer::{ComposedScript, ScriptComposer, SectionStatus};
pub use quote::sh_quote;
pub use section::{Include, Phase, Render, ScriptSection};

/// Command the detached session runs to start services.
pub fn start_command(minimal_mode: bool) -> String {
    sections::start_command(minimal_mode)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use vmspec::VmSpec;

    pub(crate) fn sample_vm() -> VmSpec {
        VmSpec {
            name: "posthog-dev-1".into(),
            description: "PostHog development VM".into(),
            machine_type: "e2-standard-8".into(),
            disk_size_gb: 100,
            os_image: "ubuntu-os-cloud/ubuntu-2204-lts".into(),
            source_branch: "master".into(),
            additional_repos: Vec::new(),
            minimal_mode: false,
            labels: BTreeMap::new(),
        }
    }
}
