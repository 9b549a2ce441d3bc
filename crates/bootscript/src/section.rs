use std::fmt;

use vmspec::{FeatureSet, VmSpec};

/// Strictly ordered groups of sections. Later phases may depend on the
/// side effects of earlier ones (e.g. user-scoped configuration needs the
/// development user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Preamble,
    SystemUpdate,
    SystemPackages,
    ContainerRuntime,
    DevUser,
    UserConfig,
    DependencyManager,
    Repositories,
    Environment,
    Services,
    ShellTuning,
    Summary,
}

impl Phase {
    pub const ALL: [Phase; 12] = [
        Phase::Preamble,
        Phase::SystemUpdate,
        Phase::SystemPackages,
        Phase::ContainerRuntime,
        Phase::DevUser,
        Phase::UserConfig,
        Phase::DependencyManager,
        Phase::Repositories,
        Phase::Environment,
        Phase::Services,
        Phase::ShellTuning,
        Phase::Summary,
    ];

    /// 1-based position.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Phase::Preamble => "Preamble",
            Phase::SystemUpdate => "System Update",
            Phase::SystemPackages => "System Packages",
            Phase::ContainerRuntime => "Container Runtime",
            Phase::DevUser => "Development User",
            Phase::UserConfig => "User Configuration",
            Phase::DependencyManager => "Dependency Manager",
            Phase::Repositories => "Repositories",
            Phase::Environment => "Environment",
            Phase::Services => "Services",
            Phase::ShellTuning => "Shell and System Tuning",
            Phase::Summary => "Summary",
        }
    }

    /// Identifier used in the timing log, e.g. `05-development-user`.
    pub fn slug(self) -> String {
        let title = self.title().to_ascii_lowercase().replace(' ', "-");
        format!("{:02}-{title}", self.number())
    }

    /// Header comment opening the phase in the generated script.
    pub fn marker(self) -> String {
        format!(
            "# ==== [{:02}/{:02}] {} ====",
            self.number(),
            Phase::ALL.len(),
            self.title()
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Inclusion predicate.
pub type Include = fn(&VmSpec, &FeatureSet) -> bool;

/// Render function. Implementations pick the fields they need and pass only
/// those on to the template that produces the text.
pub type Render = fn(&VmSpec, &FeatureSet) -> String;

/// One named, conditionally included unit of the boot script.
#[derive(Clone, Copy)]
pub struct ScriptSection {
    name: &'static str,
    phase: Phase,
    include: Include,
    render: Render,
}

impl ScriptSection {
    pub fn new(phase: Phase, name: &'static str, include: Include, render: Render) -> Self {
        Self {
            name,
            phase,
            include,
            render,
        }
    }

    /// A section that is part of every script.
    pub fn always(phase: Phase, name: &'static str, render: Render) -> Self {
        Self::new(phase, name, |_, _| true, render)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_included(&self, vm: &VmSpec, features: &FeatureSet) -> bool {
        (self.include)(vm, features)
    }

    /// Shell text for this section; empty when the section is excluded.
    pub fn render(&self, vm: &VmSpec, features: &FeatureSet) -> String {
        if self.is_included(vm, features) {
            (self.render)(vm, features)
        } else {
            String::new()
        }
    }
}

impl fmt::Debug for ScriptSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptSection")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
