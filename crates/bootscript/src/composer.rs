use sha2::{Digest, Sha256};
use tracing::{debug, info};
use vmspec::{FeatureSet, VmSpec};

use crate::section::{Phase, ScriptSection};
use crate::sections;

/// A rendered boot script and its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedScript {
    text: String,
    digest: String,
}

impl ComposedScript {
    fn new(text: String) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        Self { text, digest }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase hex SHA-256 of [`text`](Self::text).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Whether a catalogue section takes part in a given composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionStatus {
    pub phase: Phase,
    pub name: &'static str,
    pub included: bool,
}

/// Builds boot scripts from the fixed section catalogue.
#[derive(Debug, Clone)]
pub struct ScriptComposer {
    sections: Vec<ScriptSection>,
}

impl Default for ScriptComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptComposer {
    pub fn new() -> Self {
        Self {
            sections: sections::catalogue(),
        }
    }

    /// Catalogue in execution order.
    pub fn sections(&self) -> &[ScriptSection] {
        &self.sections
    }

    pub fn plan(&self, vm: &VmSpec, features: &FeatureSet) -> Vec<SectionStatus> {
        self.sections
            .iter()
            .map(|section| SectionStatus {
                phase: section.phase(),
                name: section.name(),
                included: section.is_included(vm, features),
            })
            .collect()
    }

    /// Renders the script for one VM.
    ///
    /// Output depends only on the inputs: composing twice yields identical
    /// bytes. Every phase marker is emitted even when none of its sections
    /// are included, and phases after the preamble are bracketed by timing
    /// calls.
    pub fn compose(&self, vm: &VmSpec, features: &FeatureSet) -> ComposedScript {
        let mut text = String::from("#!/bin/bash\n");

        for phase in Phase::ALL {
            text.push('\n');
            text.push_str(&phase.marker());
            text.push('\n');

            let timed = phase != Phase::Preamble;
            if timed {
                text.push_str(&format!("phase_start {}\n", phase.slug()));
            }

            for section in self.sections.iter().filter(|s| s.phase() == phase) {
                if !section.is_included(vm, features) {
                    debug!(vm = %vm.name, section = section.name(), "section skipped");
                    text.push_str(&format!("# skipped: {}\n", section.name()));
                    continue;
                }
                let body = section.render(vm, features);
                debug!(vm = %vm.name, section = section.name(), bytes = body.len(), "section rendered");
                text.push_str(&format!("\n# --- {} ---\n", section.name()));
                text.push_str(&body);
                if !body.ends_with('\n') {
                    text.push('\n');
                }
            }

            if timed {
                text.push_str(&format!("phase_end {}\n", phase.slug()));
            }
        }

        let script = ComposedScript::new(text);
        info!(
            vm = %vm.name,
            bytes = script.len(),
            digest = script.digest(),
            "boot script composed"
        );
        script
    }
}
