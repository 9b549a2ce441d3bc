use clap::Args;

use super::InputArgs;
use crate::config::{self, Inputs};
use crate::error::{ProvisionError, ProvisionResult};

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    inputs: InputArgs,
    /// Print JSON instead of YAML.
    #[arg(long)]
    json: bool,
}

pub async fn run_resolve(args: ResolveArgs) -> ProvisionResult<()> {
    let (resolution, _) = config::resolve(&Inputs::from(args.inputs)).await?;
    let out = if args.json {
        serde_json::to_string_pretty(&resolution)
            .map_err(|e| ProvisionError::Serialize(format!("resolution: {e}")))?
    } else {
        serde_yaml_ng::to_string(&resolution)
            .map_err(|e| ProvisionError::Serialize(format!("resolution: {e}")))?
    };
    println!("{out}");
    Ok(())
}
