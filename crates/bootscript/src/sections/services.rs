//! Container services and the detached PostHog process.

use crate::constants::{DEV_HOME, DEV_USER, MPROCS_CONFIG, PRIMARY_REPO_DIR, SCREEN_SESSION};

/// Compose services and migrations. Both are best effort: the operator can
/// rerun them once connected.
pub(crate) fn docker_services() -> String {
    format!(
        r#"log "Starting Docker services"
su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && docker compose -f docker-compose.dev.yml up -d" \
    || log "Warning: some Docker services failed to start (non-fatal)"

log "Waiting for Docker services to be ready"
sleep 30

log "Running database migrations"
su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && FLOX_NO_DIRENV_SETUP=1 flox activate -- bin/migrate" \
    || log "Warning: migrations failed (non-fatal)"
"#
    )
}

/// The start command for the requested mode.
pub(crate) fn start_command(minimal_mode: bool) -> String {
    if minimal_mode {
        "hogli start --minimal".to_string()
    } else {
        format!("hogli start --custom {MPROCS_CONFIG}")
    }
}

/// Writes the start helper and launches it in a detached screen session so
/// boot completes independently of the services becoming ready.
pub(crate) fn service_start(minimal_mode: bool) -> String {
    let start = start_command(minimal_mode);
    format!(
        r#"log "Writing {DEV_HOME}/start-posthog.sh"
cat > {DEV_HOME}/start-posthog.sh << 'STARTSCRIPTEOF'
#!/bin/bash
cd {PRIMARY_REPO_DIR}
FLOX_NO_DIRENV_SETUP=1 exec flox activate -- {start}
STARTSCRIPTEOF
chmod +x {DEV_HOME}/start-posthog.sh
chown {DEV_USER}:{DEV_USER} {DEV_HOME}/start-posthog.sh

if su - {DEV_USER} -c "screen -list" 2> /dev/null | grep -q "\.{SCREEN_SESSION}[[:space:]]"; then
    log "PostHog already running in screen session '{SCREEN_SESSION}'"
else
    su - {DEV_USER} -c "screen -dmS {SCREEN_SESSION} {DEV_HOME}/start-posthog.sh" \
        && log "PostHog started in screen session '{SCREEN_SESSION}' (attach: screen -r {SCREEN_SESSION})" \
        || log "Warning: could not start PostHog automatically (non-fatal)"
fi
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_and_full_commands() {
        assert!(service_start(true).contains("flox activate -- hogli start --minimal\n"));
        assert!(
            service_start(false)
                .contains("flox activate -- hogli start --custom bin/mprocs-with-logging.yaml\n")
        );
    }

    #[test]
    fn service_runs_detached() {
        assert!(service_start(false).contains("screen -dmS posthog /home/ph/start-posthog.sh"));
    }

    #[test]
    fn migrations_are_best_effort() {
        assert!(docker_services().contains("bin/migrate\" \\\n    || log \"Warning: migrations failed"));
    }
}
