mod plan;
mod render;
mod resolve;
mod sections;

use std::path::PathBuf;

use clap::Args;

use crate::config::Inputs;

pub use plan::{PlanArgs, run_plan};
pub use render::{RenderArgs, run_render};
pub use resolve::{ResolveArgs, run_resolve};
pub use sections::{SectionsArgs, run_sections};

/// Input options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// VM document (YAML). A missing file falls back to flat parameters.
    #[arg(long, env = "VMS_FILE", default_value = "vms.yaml")]
    vms: PathBuf,
    /// Parameter file (YAML mapping, optionally under a `config:` key).
    #[arg(long)]
    params: Option<PathBuf>,
    /// Parameter override as key=value. Repeatable; later values win.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    /// Cloud project id, substituted for project placeholders.
    #[arg(long, env = "GCP_PROJECT")]
    project: Option<String>,
}

impl From<InputArgs> for Inputs {
    fn from(args: InputArgs) -> Self {
        Self {
            vms_file: args.vms,
            params_file: args.params,
            overrides: args.overrides,
            project: args.project,
        }
    }
}
