use vmspec::SecretRef;

use crate::constants::{DEV_HOME, DEV_USER};
use crate::quote::sh_quote;

/// System packages; creates the chrome-remote-desktop group the user joins later.
pub(crate) fn install() -> String {
    r#"log "Installing XFCE desktop environment"
DEBIAN_FRONTEND=noninteractive apt-get install -y xfce4 xfce4-goodies dbus-x11 xorg

log "Installing xrdp"
DEBIAN_FRONTEND=noninteractive apt-get install -y xrdp
usermod -aG ssl-cert xrdp

log "Installing Chrome"
curl -fsSL https://dl.google.com/linux/linux_signing_key.pub | gpg --dearmor --yes -o /usr/share/keyrings/google-chrome.gpg
echo "deb [arch=amd64 signed-by=/usr/share/keyrings/google-chrome.gpg] http://dl.google.com/linux/chrome/deb/ stable main" > /etc/apt/sources.list.d/google-chrome.list
apt-get update
apt-get install -y google-chrome-stable

log "Installing Chrome Remote Desktop"
wget -q https://dl.google.com/linux/direct/chrome-remote-desktop_current_amd64.deb -O /tmp/crd.deb
apt-get install -y /tmp/crd.deb || apt-get install -y -f
rm -f /tmp/crd.deb

systemctl enable xrdp
systemctl start xrdp
"#
    .to_string()
}

/// Without a password reference the desktop session is configured but the
/// user keeps no password, so only Chrome Remote Desktop can log in.
pub(crate) fn user_config(password: &SecretRef) -> String {
    let mut text = format!(
        r#"log "Configuring remote desktop for {DEV_USER}"
getent group chrome-remote-desktop > /dev/null 2>&1 || groupadd chrome-remote-desktop
usermod -aG chrome-remote-desktop {DEV_USER}

echo "exec /usr/bin/xfce4-session" > {DEV_HOME}/.chrome-remote-desktop-session
chmod +x {DEV_HOME}/.chrome-remote-desktop-session
echo "xfce4-session" > {DEV_HOME}/.xsession
chown {DEV_USER}:{DEV_USER} {DEV_HOME}/.chrome-remote-desktop-session {DEV_HOME}/.xsession
"#
    );
    match password.name() {
        Some(name) => text.push_str(&format!(
            r#"if RDP_PASSWORD="$(fetch_secret {name})"; then
    printf '%s:%s\n' {DEV_USER} "$RDP_PASSWORD" | chpasswd
    log "Password set for {DEV_USER}, RDP available on port 3389"
else
    log "Warning: could not fetch remote desktop password, RDP login disabled"
fi
unset RDP_PASSWORD
"#,
            name = sh_quote(name)
        )),
        None => text.push_str(
            "log \"No remote desktop password reference configured, skipping password setup\"\n",
        ),
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_fetched_at_boot() {
        let text = user_config(&SecretRef::new("rdp-password"));
        assert!(text.contains(r#"RDP_PASSWORD="$(fetch_secret rdp-password)""#));
        assert!(text.contains("chpasswd"));
        assert!(text.contains("unset RDP_PASSWORD"));
    }

    #[test]
    fn no_password_keeps_group_and_session() {
        let text = user_config(&SecretRef::none());
        assert!(text.contains("usermod -aG chrome-remote-desktop ph"));
        assert!(!text.contains("chpasswd"));
    }
}
