//! The section catalogue.
//!
//! Every render function passes only the fields it needs on to the template
//! that produces the text, so templates never see the whole configuration.

mod base;
mod environment;
mod monitoring;
mod remote_desktop;
mod repos;
mod services;
mod shell;
mod tools;

use vmspec::{FeatureSet, VmSpec};

use crate::section::{Phase, ScriptSection};

pub(crate) use services::start_command;

/// The credential file is only needed when at least one credential will be
/// written to it.
fn needs_secrets_file(_: &VmSpec, f: &FeatureSet) -> bool {
    (f.claude_code.enabled && f.claude_code.api_key.is_set())
        || (f.codex_cli.enabled && f.codex_cli.api_key.is_set())
        || (f.github_cli.enabled && f.github_cli.token.is_set())
}

/// Sections in execution order. Phase order is strict; order inside a phase
/// is the order listed here.
pub(crate) fn catalogue() -> Vec<ScriptSection> {
    use Phase::*;

    vec![
        ScriptSection::always(Preamble, "preamble", |_, _| shell::preamble()),
        ScriptSection::always(SystemUpdate, "system-update", |_, _| base::system_update()),
        ScriptSection::always(SystemUpdate, "base-packages", |_, _| base::base_packages()),
        ScriptSection::new(
            SystemPackages,
            "ops-agent",
            |_, f| f.monitoring.ops_agent_enabled,
            |_, _| monitoring::ops_agent(),
        ),
        ScriptSection::new(
            SystemPackages,
            "netdata",
            |_, f| f.monitoring.netdata_enabled,
            |_, f| {
                let m = &f.monitoring;
                monitoring::netdata(&m.netdata_claim_url, &m.netdata_claim_rooms, &m.netdata_claim_token)
            },
        ),
        ScriptSection::new(
            SystemPackages,
            "claude-code-install",
            |_, f| f.claude_code.enabled,
            |_, _| tools::claude_code_install(),
        ),
        ScriptSection::new(
            SystemPackages,
            "remote-desktop-install",
            |_, f| f.remote_desktop.enabled,
            |_, _| remote_desktop::install(),
        ),
        ScriptSection::new(
            SystemPackages,
            "github-cli-install",
            |_, f| f.github_cli.enabled,
            |_, _| tools::github_cli_install(),
        ),
        ScriptSection::always(ContainerRuntime, "docker-install", |_, _| base::docker_install()),
        ScriptSection::always(ContainerRuntime, "docker-config", |_, _| base::docker_config()),
        ScriptSection::always(DevUser, "dev-user", |_, _| base::dev_user()),
        ScriptSection::new(UserConfig, "secrets-file", needs_secrets_file, |_, _| {
            tools::secrets_file()
        }),
        ScriptSection::new(
            UserConfig,
            "claude-code-config",
            |_, f| f.claude_code.enabled,
            |_, f| tools::claude_code_config(&f.claude_code.api_key),
        ),
        ScriptSection::new(
            UserConfig,
            "remote-desktop-config",
            |_, f| f.remote_desktop.enabled,
            |_, f| remote_desktop::user_config(&f.remote_desktop.password),
        ),
        ScriptSection::new(
            UserConfig,
            "github-cli-config",
            |_, f| f.github_cli.enabled,
            |_, f| tools::github_cli_config(&f.github_cli.token),
        ),
        ScriptSection::new(
            UserConfig,
            "codex-cli-config",
            |_, f| f.codex_cli.enabled,
            |_, f| tools::codex_cli_config(&f.codex_cli.api_key),
        ),
        ScriptSection::new(
            UserConfig,
            "git-identity",
            |_, f| !f.git.is_empty(),
            |_, f| tools::git_identity(&f.git),
        ),
        ScriptSection::always(DependencyManager, "flox-install", |_, _| base::flox_install()),
        ScriptSection::always(DependencyManager, "flox-config", |_, _| base::flox_config()),
        ScriptSection::always(Repositories, "clone-repos", |vm, _| {
            repos::clone_repos(&vm.source_branch, &vm.additional_repos)
        }),
        ScriptSection::always(Environment, "env-file", |vm, _| {
            environment::env_file(vm.minimal_mode)
        }),
        ScriptSection::always(Environment, "hosts-file", |_, _| environment::hosts_file()),
        ScriptSection::always(Environment, "flox-activate", |_, _| environment::flox_activate()),
        ScriptSection::always(Environment, "geoip-download", |_, _| {
            environment::geoip_download()
        }),
        ScriptSection::new(
            Environment,
            "codex-cli-install",
            |_, f| f.codex_cli.enabled,
            |_, _| tools::codex_cli_install(),
        ),
        ScriptSection::always(Services, "docker-services", |_, _| services::docker_services()),
        ScriptSection::always(Services, "service-start", |vm, _| {
            services::service_start(vm.minimal_mode)
        }),
        ScriptSection::always(ShellTuning, "makefile", |_, _| shell::makefile()),
        ScriptSection::always(ShellTuning, "shell-profile", |_, _| shell::shell_profile()),
        ScriptSection::always(ShellTuning, "sysctl", |_, _| shell::sysctl()),
        ScriptSection::always(ShellTuning, "image-prefetch", |_, _| shell::image_prefetch()),
        ScriptSection::always(Summary, "summary", |_, _| shell::summary()),
    ]
}
