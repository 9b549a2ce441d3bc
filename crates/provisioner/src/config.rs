//! Loading of the on-disk inputs: the VM document and the parameter layers.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vmspec::{PROJECT_KEY, Resolution, StaticParams, VmsDocument};

use crate::error::{ProvisionError, ProvisionResult};

/// Where the inputs of one run come from.
#[derive(Debug, Default, Clone)]
pub struct Inputs {
    pub vms_file: PathBuf,
    pub params_file: Option<PathBuf>,
    /// `key=value` overrides, applied in order on top of the parameter file.
    pub overrides: Vec<String>,
    pub project: Option<String>,
}

/// Read the VM document. A missing file means no document.
pub async fn load_document(path: &Path) -> ProvisionResult<Option<VmsDocument>> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| ProvisionError::Io(format!("check {}: {e}", path.display())))?;
    if !exists {
        info!(path = %path.display(), "no vm document, using parameters only");
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ProvisionError::Io(format!("read {}: {e}", path.display())))?;
    let document = VmsDocument::from_yaml(&content, &path.display().to_string())?;
    debug!(path = %path.display(), vms = document.vm_entries().len(), "loaded vm document");
    Ok(Some(document))
}

/// Parameter file, then `--set` overrides, then `--project`. Later layers win.
pub async fn load_params(inputs: &Inputs) -> ProvisionResult<StaticParams> {
    let mut params = match &inputs.params_file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ProvisionError::Io(format!("read {}: {e}", path.display())))?;
            StaticParams::from_yaml(&content, &path.display().to_string())?
        }
        None => StaticParams::new(),
    };
    for assignment in &inputs.overrides {
        params.apply_assignment(assignment)?;
    }
    if let Some(project) = inputs.project.as_deref().filter(|p| !p.is_empty()) {
        params.set(PROJECT_KEY, project);
    }
    debug!(count = params.len(), "loaded parameters");
    Ok(params)
}

/// Load every input and resolve it.
pub async fn resolve(inputs: &Inputs) -> ProvisionResult<(Resolution, StaticParams)> {
    let document = load_document(&inputs.vms_file).await?;
    let params = load_params(inputs).await?;
    let resolution = vmspec::resolve(document.as_ref(), &params)?;
    Ok((resolution, params))
}
