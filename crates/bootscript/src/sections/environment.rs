//! Checkout environment: `.env`, hosts entries, Flox activation.

use crate::constants::{DEV_USER, HOSTS_ENTRY, POSTHOG_ENV_DEFAULTS, PRIMARY_REPO_DIR};

pub(crate) fn env_file(minimal_mode: bool) -> String {
    let mut lines: Vec<String> = POSTHOG_ENV_DEFAULTS
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    if minimal_mode {
        lines.push("POSTHOG_MINIMAL_MODE=true".to_string());
    }
    let env = lines.join("\n");
    format!(
        r#"log "Writing {PRIMARY_REPO_DIR}/.env"
cat > {PRIMARY_REPO_DIR}/.env << 'ENVEOF'
{env}
ENVEOF
chown {DEV_USER}:{DEV_USER} {PRIMARY_REPO_DIR}/.env
"#
    )
}

/// Flox cannot sudo non-interactively, so the entries are added here.
pub(crate) fn hosts_file() -> String {
    format!(
        r#"if grep -qF "{HOSTS_ENTRY}" /etc/hosts; then
    log "/etc/hosts already contains service entries"
else
    echo "{HOSTS_ENTRY}" >> /etc/hosts
    log "/etc/hosts amended for Docker services"
fi
"#
    )
}

/// First activation installs every language dependency and may take a long
/// time or warn; failures are logged and the boot continues.
pub(crate) fn flox_activate() -> String {
    format!(
        r#"log "Activating Flox environment (first run installs all dependencies)"
su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && FLOX_NO_DIRENV_SETUP=1 flox activate -- echo 'Flox environment activated'" \
    || log "Warning: Flox activation reported errors (non-fatal)"
"#
    )
}

pub(crate) fn geoip_download() -> String {
    format!(
        r#"log "Downloading GeoLite2 database"
su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && FLOX_NO_DIRENV_SETUP=1 flox activate -- ./bin/download-mmdb" \
    || log "Warning: GeoLite2 download failed (non-fatal)"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_minimal_flag() {
        assert!(env_file(true).contains("POSTHOG_MINIMAL_MODE=true\nENVEOF"));
        assert!(!env_file(false).contains("POSTHOG_MINIMAL_MODE"));
        assert!(env_file(false).contains("CLICKHOUSE_HOST=localhost\nENVEOF"));
    }

    #[test]
    fn hosts_file_checks_before_append() {
        let text = hosts_file();
        let check = text.find("grep -qF").unwrap();
        let append = text.find(">> /etc/hosts").unwrap();
        assert!(check < append);
    }

    #[test]
    fn activation_is_best_effort() {
        assert!(flox_activate().contains("|| log \"Warning:"));
    }
}
