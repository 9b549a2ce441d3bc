use vmspec::RepoSpec;

use crate::constants::{DEV_HOME, DEV_USER, PRIMARY_REPO_DIR, PRIMARY_REPO_URL};
use crate::quote::sh_quote;

/// `clone_repo URL DEST [BRANCH]`
///
/// Without a branch the remote default is cloned. A branch that exists on
/// the remote is cloned directly; otherwise the default branch is cloned and
/// the branch created locally from it. Existing checkouts are left alone.
const CLONE_FUNCTION: &str = r#"clone_repo() {
    local url="$1" dest="$2" branch="${3:-}"
    if [ -d "$dest/.git" ]; then
        log "$dest already cloned, skipping"
    elif [ -z "$branch" ]; then
        log "Cloning $url (default branch) into $dest"
        git clone "$url" "$dest"
    elif git ls-remote --exit-code --heads "$url" "$branch" > /dev/null 2>&1; then
        log "Branch '$branch' exists, cloning $url directly"
        git clone --branch "$branch" "$url" "$dest"
    else
        log "Branch '$branch' does not exist on $url, creating it from the default branch"
        git clone "$url" "$dest"
        git -C "$dest" checkout -b "$branch"
    fi
"#;

/// Primary repository first, then every additional one in order.
pub(crate) fn clone_repos(source_branch: &str, additional: &[RepoSpec]) -> String {
    let mut text = String::from(CLONE_FUNCTION);
    text.push_str(&format!("    chown -R {DEV_USER}:{DEV_USER} \"$dest\"\n}}\n\n"));
    text.push_str(&clone_call(
        PRIMARY_REPO_URL,
        PRIMARY_REPO_DIR,
        Some(source_branch),
    ));
    for repo in additional {
        let dest = format!("{DEV_HOME}/{}", repo.target_dir());
        text.push_str(&clone_call(repo.url(), &dest, repo.branch()));
    }
    text
}

fn clone_call(url: &str, dest: &str, branch: Option<&str>) -> String {
    match branch {
        Some(branch) => format!(
            "clone_repo {} {} {}\n",
            sh_quote(url),
            sh_quote(dest),
            sh_quote(branch)
        ),
        None => format!("clone_repo {} {}\n", sh_quote(url), sh_quote(dest)),
    }
}
