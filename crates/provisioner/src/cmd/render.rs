use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use bootscript::ScriptComposer;
use clap::Args;
use tracing::info;

use super::InputArgs;
use crate::config::{self, Inputs};
use crate::error::{ProvisionError, ProvisionResult};

const SCRIPT_MODE: u32 = 0o755;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    inputs: InputArgs,
    /// Output directory; one `<vm-name>.sh` is written per VM.
    #[arg(long, default_value = "out")]
    out: PathBuf,
}

pub async fn run_render(args: RenderArgs) -> ProvisionResult<()> {
    let (resolution, _) = config::resolve(&Inputs::from(args.inputs)).await?;
    let written = render_all(&resolution, &args.out).await?;
    info!(count = written.len(), out = %args.out.display(), "boot scripts written");
    Ok(())
}

/// Compose and write every VM's script. Returns the written paths.
pub(crate) async fn render_all(
    resolution: &vmspec::Resolution,
    out: &Path,
) -> ProvisionResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out)
        .await
        .map_err(|e| ProvisionError::Io(format!("create {}: {e}", out.display())))?;

    let composer = ScriptComposer::new();
    let mut written = Vec::with_capacity(resolution.vms.len());
    for vm in &resolution.vms {
        let script = composer.compose(vm, &resolution.features);
        let path = out.join(format!("{}.sh", vm.name));
        tokio::fs::write(&path, script.text())
            .await
            .map_err(|e| ProvisionError::Io(format!("write {}: {e}", path.display())))?;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(SCRIPT_MODE))
            .await
            .map_err(|e| ProvisionError::Io(format!("chmod {}: {e}", path.display())))?;
        info!(vm = %vm.name, path = %path.display(), digest = script.digest(), "wrote boot script");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use vmspec::StaticParams;

    use super::*;

    #[tokio::test]
    async fn writes_executable_script_per_vm() {
        let dir = tempfile::tempdir().unwrap();
        let params = StaticParams::new().with("vmName", "solo");
        let resolution = vmspec::resolve(None, &params).unwrap();

        let out = dir.path().join("scripts");
        let written = render_all(&resolution, &out).await.unwrap();
        assert_eq!(written, vec![out.join("solo.sh")]);

        let meta = tokio::fs::metadata(out.join("solo.sh")).await.unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);
        let text = tokio::fs::read_to_string(out.join("solo.sh")).await.unwrap();
        assert!(text.starts_with("#!/bin/bash\n"));
    }

    #[tokio::test]
    async fn path_like_vm_name_never_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let vms_file = dir.path().join("vms.yaml");
        tokio::fs::write(&vms_file, "vms:\n  - name: ../escaped\n").await.unwrap();
        let inputs = Inputs {
            vms_file,
            ..Inputs::default()
        };

        let err = config::resolve(&inputs).await.unwrap_err();
        assert!(
            matches!(err, ProvisionError::Config(vmspec::ConfigError::InvalidName(_))),
            "got: {err}"
        );
        assert!(!tokio::fs::try_exists(dir.path().join("escaped.sh")).await.unwrap());
    }

    #[tokio::test]
    async fn rerender_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let resolution = vmspec::resolve(None, &StaticParams::new()).unwrap();
        render_all(&resolution, dir.path()).await.unwrap();
        let first = tokio::fs::read(dir.path().join("posthog-dev-1.sh")).await.unwrap();
        render_all(&resolution, dir.path()).await.unwrap();
        let second = tokio::fs::read(dir.path().join("posthog-dev-1.sh")).await.unwrap();
        assert_eq!(first, second);
    }
}
