use vmspec::SecretRef;

use crate::quote::sh_quote;

pub(crate) fn ops_agent() -> String {
    r#"if [ "$SKIP_HEAVY" = "1" ] && systemctl list-unit-files google-cloud-ops-agent.service > /dev/null 2>&1; then
    log "GCP Ops Agent already installed, skipping (SKIP_HEAVY=1)"
else
    log "Installing GCP Ops Agent"
    curl -sSfL https://dl.google.com/cloudagents/add-google-cloud-ops-agent-repo.sh -o /tmp/add-google-cloud-ops-agent-repo.sh
    bash /tmp/add-google-cloud-ops-agent-repo.sh --also-install
    rm -f /tmp/add-google-cloud-ops-agent-repo.sh
    systemctl enable google-cloud-ops-agent
fi
"#
    .to_string()
}

/// Without a claim token the agent is installed but not claimed.
pub(crate) fn netdata(claim_url: &str, claim_rooms: &str, claim_token: &SecretRef) -> String {
    let install = match claim_token.name() {
        Some(token) => format!(
            r#"    if NETDATA_CLAIM_TOKEN="$(fetch_secret {token})"; then
        sh /tmp/netdata-kickstart.sh --stable-channel --non-interactive \
            --claim-token "$NETDATA_CLAIM_TOKEN" \
            --claim-rooms {rooms} \
            --claim-url {url}
    else
        log "Warning: could not fetch Netdata claim token, installing unclaimed"
        sh /tmp/netdata-kickstart.sh --stable-channel --non-interactive
    fi
    unset NETDATA_CLAIM_TOKEN
"#,
            token = sh_quote(token),
            rooms = sh_quote(claim_rooms),
            url = sh_quote(claim_url),
        ),
        None => r#"    log "No Netdata claim token configured, installing unclaimed"
    sh /tmp/netdata-kickstart.sh --stable-channel --non-interactive
"#
        .to_string(),
    };
    format!(
        r#"if [ "$SKIP_HEAVY" = "1" ] && command -v netdata > /dev/null 2>&1; then
    log "Netdata already installed, skipping (SKIP_HEAVY=1)"
else
    log "Installing Netdata"
    wget -q -O /tmp/netdata-kickstart.sh https://get.netdata.cloud/kickstart.sh
{install}    rm -f /tmp/netdata-kickstart.sh
fi
"#
    )
}
