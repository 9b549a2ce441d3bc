//! Developer tooling: AI assistant CLIs, GitHub CLI, git identity, and the
//! per-user credential file they share.
//!
//! Binaries are installed whether or not a credential reference is
//! configured; only the credential wiring is skipped without one.

use vmspec::{GitIdentity, SecretRef};

use crate::constants::{DEV_HOME, DEV_USER, PRIMARY_REPO_DIR, SECRETS_FILE};
use crate::quote::sh_quote;

/// Recreates the credential file empty so reruns don't accumulate entries.
pub(crate) fn secrets_file() -> String {
    format!(
        r#"log "Preparing credential file"
install -d -m 700 -o {DEV_USER} -g {DEV_USER} {DEV_HOME}/.config/posthog
install -m 600 -o {DEV_USER} -g {DEV_USER} /dev/null {SECRETS_FILE}
"#
    )
}

fn write_secret(var: &str, secret: &SecretRef) -> Option<String> {
    secret
        .name()
        .map(|name| format!("write_secret {var} {}\n", sh_quote(name)))
}

pub(crate) fn claude_code_install() -> String {
    r#"log "Installing Claude Code"
curl -fsSL https://claude.ai/install.sh | bash
if [ -e /root/.local/bin/claude ]; then
    cp -L /root/.local/bin/claude /usr/local/bin/claude
    chmod 755 /usr/local/bin/claude
fi
"#
    .to_string()
}

pub(crate) fn claude_code_config(api_key: &SecretRef) -> String {
    let mut text = format!(
        r#"log "Configuring Claude Code for {DEV_USER}"
mkdir -p {DEV_HOME}/.claude
cat > {DEV_HOME}/.claude/settings.json << 'CLAUDEEOF'
{{
  "permissions": {{
    "allow": ["Bash", "Read", "Edit", "Write", "Glob", "Grep", "WebFetch"]
  }},
  "env": {{
    "DISABLE_AUTOUPDATER": "1"
  }}
}}
CLAUDEEOF
chown -R {DEV_USER}:{DEV_USER} {DEV_HOME}/.claude
"#
    );
    match write_secret("ANTHROPIC_API_KEY", api_key) {
        Some(line) => text.push_str(&line),
        None => text.push_str("log \"No Anthropic API key reference configured, skipping key setup\"\n"),
    }
    text
}

pub(crate) fn codex_cli_config(api_key: &SecretRef) -> String {
    match write_secret("OPENAI_API_KEY", api_key) {
        Some(line) => format!("log \"Configuring OpenAI Codex CLI credentials\"\n{line}"),
        None => "log \"No OpenAI API key reference configured, skipping Codex CLI credentials\"\n"
            .to_string(),
    }
}

/// npm comes from the Flox environment, so this runs after activation.
pub(crate) fn codex_cli_install() -> String {
    format!(
        r#"log "Installing OpenAI Codex CLI"
su - {DEV_USER} -c "cd {PRIMARY_REPO_DIR} && FLOX_NO_DIRENV_SETUP=1 flox activate -- npm install -g @openai/codex" \
    || log "Warning: Codex CLI install failed (non-fatal)"
"#
    )
}

pub(crate) fn github_cli_install() -> String {
    r#"log "Installing GitHub CLI"
curl -fsSL https://cli.github.com/packages/githubcli-archive-keyring.gpg -o /usr/share/keyrings/githubcli-archive-keyring.gpg
chmod go+r /usr/share/keyrings/githubcli-archive-keyring.gpg
echo "deb [arch=$(dpkg --print-architecture) signed-by=/usr/share/keyrings/githubcli-archive-keyring.gpg] https://cli.github.com/packages stable main" > /etc/apt/sources.list.d/github-cli.list
apt-get update
apt-get install -y gh
"#
    .to_string()
}

pub(crate) fn github_cli_config(token: &SecretRef) -> String {
    match write_secret("GH_TOKEN", token) {
        Some(line) => format!(
            r#"log "Configuring GitHub CLI for {DEV_USER}"
{line}su - {DEV_USER} -c "set -a; . {SECRETS_FILE}; set +a; gh auth setup-git" \
    || log "Warning: gh auth setup-git failed (non-fatal)"
"#
        ),
        None => "log \"No GitHub token reference configured, skipping gh authentication\"\n"
            .to_string(),
    }
}

pub(crate) fn git_identity(identity: &GitIdentity) -> String {
    let mut text = format!("log \"Configuring git identity for {DEV_USER}\"\n");
    let settings = [
        ("user.name", identity.user_name.as_deref()),
        ("user.email", identity.user_email.as_deref()),
    ];
    for (key, value) in settings {
        if let Some(value) = value {
            text.push_str(&format!(
                "git config --file {DEV_HOME}/.gitconfig {key} {}\n",
                sh_quote(value)
            ));
        }
    }
    text.push_str(&format!(
        "chown {DEV_USER}:{DEV_USER} {DEV_HOME}/.gitconfig\n"
    ));
    text
}
