//! Shell profile, system tuning, image pre-fetch, and the framing sections
//! (preamble and completion summary).

use crate::constants::{DEV_HOME, DEV_USER, PRIMARY_REPO_DIR, SYSCTL_FILE, SYSCTL_SETTINGS};

const PREAMBLE: &str = include_str!("../../scripts/preamble.sh");
const BASHRC: &str = include_str!("../../scripts/bashrc.sh");
const PROFILE: &str = include_str!("../../scripts/profile.sh");
const MAKEFILE_DEV: &str = include_str!("../../scripts/Makefile.dev");
const SUMMARY: &str = include_str!("../../scripts/summary.sh");

/// First line of the managed `.bashrc` block; its presence marks the block
/// as already installed.
const BASHRC_MARKER: &str = "# PostHog Development Environment (Flox-based)";

pub(crate) fn preamble() -> String {
    PREAMBLE.to_string()
}

pub(crate) fn makefile() -> String {
    format!(
        r#"log "Writing Makefile.dev"
cat > {PRIMARY_REPO_DIR}/Makefile.dev << 'MAKEFILEEOF'
{MAKEFILE_DEV}MAKEFILEEOF
chown {DEV_USER}:{DEV_USER} {PRIMARY_REPO_DIR}/Makefile.dev
"#
    )
}

pub(crate) fn shell_profile() -> String {
    format!(
        r#"if grep -qF "{BASHRC_MARKER}" {DEV_HOME}/.bashrc 2> /dev/null; then
    log "Shell profile already configured"
else
    log "Configuring shell profile"
    cat >> {DEV_HOME}/.bashrc << 'BASHRCEOF'
{BASHRC}BASHRCEOF
    cat >> {DEV_HOME}/.profile << 'PROFILEEOF'
{PROFILE}PROFILEEOF
    chown {DEV_USER}:{DEV_USER} {DEV_HOME}/.bashrc {DEV_HOME}/.profile
fi
"#
    )
}

pub(crate) fn sysctl() -> String {
    let settings = SYSCTL_SETTINGS
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"log "Tuning kernel limits"
cat > {SYSCTL_FILE} << 'SYSCTLEOF'
# Docker/ClickHouse limits
{settings}
SYSCTLEOF
sysctl --system > /dev/null
"#
    )
}

pub(crate) fn image_prefetch() -> String {
    format!(
        r#"if [ "$SKIP_HEAVY" = "1" ]; then
    log "Skipping Docker image pre-pull (SKIP_HEAVY=1)"
else
    log "Pre-pulling Docker images (this may take a while)"
    su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && docker compose -f docker-compose.dev-minimal.yml pull" \
        || log "Warning: image pre-pull failed (non-fatal)"
fi
"#
    )
}

pub(crate) fn summary() -> String {
    SUMMARY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_sets_strict_mode_and_logging() {
        let text = preamble();
        assert!(text.contains("set -eo pipefail"));
        assert!(text.contains(r#"exec > >(tee -a "$LOG_FILE") 2>&1"#));
        assert!(text.contains("declare -F fetch_secret"));
        assert!(!text.contains("set -x"));
    }

    #[test]
    fn secrets_path_matches_preamble() {
        assert!(preamble().contains(&format!("SECRETS_FILE=\"{}\"", crate::constants::SECRETS_FILE)));
    }

    #[test]
    fn shell_profile_is_idempotent() {
        let text = shell_profile();
        assert!(text.starts_with(&format!("if grep -qF \"{BASHRC_MARKER}\"")));
        assert!(BASHRC.contains(BASHRC_MARKER));
    }

    #[test]
    fn makefile_keeps_tabs() {
        assert!(makefile().contains("start:\n\tFLOX_NO_DIRENV_SETUP=1"));
    }

    #[test]
    fn sysctl_lists_settings() {
        let text = sysctl();
        assert!(text.contains("vm.max_map_count=262144\nfs.file-max=65536\n"));
    }
}
