use bootscript::ScriptComposer;
use clap::Args;
use tracing::info;
use vmspec::{PROJECT_KEY, ParamStore};

use super::InputArgs;
use crate::config::{self, Inputs};
use crate::error::{ProvisionError, ProvisionResult};
use crate::plan::{self, Plan};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    inputs: InputArgs,
    /// Print JSON instead of YAML.
    #[arg(long)]
    json: bool,
}

pub async fn run_plan(args: PlanArgs) -> ProvisionResult<()> {
    let (resolution, params) = config::resolve(&Inputs::from(args.inputs)).await?;
    let plan = build_plan(&resolution, &params);
    info!(zone = %plan.zone, instances = plan.instances.len(), "plan built");
    let out = if args.json {
        serde_json::to_string_pretty(&plan)
            .map_err(|e| ProvisionError::Serialize(format!("plan: {e}")))?
    } else {
        serde_yaml_ng::to_string(&plan).map_err(|e| ProvisionError::Serialize(format!("plan: {e}")))?
    };
    println!("{out}");
    Ok(())
}

pub(crate) fn build_plan(resolution: &vmspec::Resolution, params: &dyn ParamStore) -> Plan {
    let zone = plan::zone(params);
    let composer = ScriptComposer::new();
    let instances = resolution
        .vms
        .iter()
        .map(|vm| plan::instance(vm, &zone, &composer.compose(vm, &resolution.features)))
        .collect();
    Plan {
        project: params.get(PROJECT_KEY),
        zone,
        network: plan::network(),
        firewall: plan::ssh_firewall(),
        instances,
    }
}
