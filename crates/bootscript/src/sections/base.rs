//! Base system: package updates, container runtime, development user and
//! dependency manager.

use crate::constants::{
    DEV_HOME, DEV_USER, DOCKER_FALLBACK_INSTALLER, DOCKER_INSTALL_ATTEMPTS, DOCKER_PACKAGES,
    DOCKER_RETRY_DELAY_SECS, FLOX_VERSION, docker_daemon_config,
};

pub(crate) fn system_update() -> String {
    r#"log "Updating system packages"
apt-get update
DEBIAN_FRONTEND=noninteractive apt-get upgrade -y
"#
    .to_string()
}

pub(crate) fn base_packages() -> String {
    r#"log "Installing base packages"
DEBIAN_FRONTEND=noninteractive apt-get install -y \
    apt-transport-https \
    build-essential \
    ca-certificates \
    curl \
    git \
    gnupg \
    htop \
    jq \
    lsb-release \
    screen \
    software-properties-common \
    unzip \
    vim \
    wget
"#
    .to_string()
}

/// Apt repository install retried with a fixed delay, then the convenience
/// installer. Only the fallback failing aborts the run.
pub(crate) fn docker_install() -> String {
    let attempts = DOCKER_INSTALL_ATTEMPTS;
    let delay = DOCKER_RETRY_DELAY_SECS;
    format!(
        r#"if [ "$SKIP_HEAVY" = "1" ] && command -v docker > /dev/null 2>&1; then
    log "Docker already installed, skipping (SKIP_HEAVY=1)"
else
    log "Installing Docker"
    curl -fsSL https://download.docker.com/linux/ubuntu/gpg | gpg --dearmor --yes -o /usr/share/keyrings/docker-archive-keyring.gpg
    echo "deb [arch=$(dpkg --print-architecture) signed-by=/usr/share/keyrings/docker-archive-keyring.gpg] https://download.docker.com/linux/ubuntu $(lsb_release -cs) stable" > /etc/apt/sources.list.d/docker.list

    DOCKER_INSTALLED=0
    for attempt in $(seq 1 {attempts}); do
        if apt-get update && apt-get install -y {DOCKER_PACKAGES}; then
            DOCKER_INSTALLED=1
            break
        fi
        log "Docker install attempt $attempt/{attempts} failed"
        if [ "$attempt" -lt {attempts} ]; then
            sleep {delay}
        fi
    done

    if [ "$DOCKER_INSTALLED" != "1" ]; then
        log "Docker apt repository unavailable, falling back to {DOCKER_FALLBACK_INSTALLER}"
        curl -fsSL {DOCKER_FALLBACK_INSTALLER} | sh
    fi
fi
"#
    )
}

pub(crate) fn docker_config() -> String {
    let daemon_json = serde_json::to_string_pretty(&docker_daemon_config()).unwrap_or_default();
    format!(
        r#"log "Configuring Docker daemon"
mkdir -p /etc/docker
cat > /etc/docker/daemon.json << 'DOCKEREOF'
{daemon_json}
DOCKEREOF
systemctl enable docker
systemctl restart docker
"#
    )
}

/// Idempotent: an existing user is kept, group memberships are always applied.
pub(crate) fn dev_user() -> String {
    format!(
        r#"if id {DEV_USER} &> /dev/null; then
    log "User {DEV_USER} already exists"
else
    log "Creating user {DEV_USER}"
    useradd -m -s /bin/bash {DEV_USER}
fi
usermod -aG docker,sudo {DEV_USER}
"#
    )
}

pub(crate) fn flox_install() -> String {
    format!(
        r#"log "Installing Flox {FLOX_VERSION}"
wget -q "https://downloads.flox.dev/by-env/stable/deb/flox-{FLOX_VERSION}.x86_64-linux.deb" -O /tmp/flox.deb
dpkg -i /tmp/flox.deb
rm -f /tmp/flox.deb
flox --version
"#
    )
}

/// Disables direnv prompts so activation works non-interactively.
pub(crate) fn flox_config() -> String {
    format!(
        r#"log "Configuring Flox for headless operation"
mkdir -p {DEV_HOME}/.config/flox
cat > {DEV_HOME}/.config/flox/flox.toml << 'FLOXCONFIGEOF'
[features]
direnv = false
FLOXCONFIGEOF
chown -R {DEV_USER}:{DEV_USER} {DEV_HOME}/.config
"#
    )
}
