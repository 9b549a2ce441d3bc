use bootscript::ScriptComposer;
use clap::Args;

use super::InputArgs;
use crate::config::{self, Inputs};
use crate::error::{ProvisionError, ProvisionResult};

#[derive(Args)]
pub struct SectionsArgs {
    #[command(flatten)]
    inputs: InputArgs,
    /// VM to report on. Defaults to the first resolved VM.
    #[arg(long)]
    vm: Option<String>,
}

pub async fn run_sections(args: SectionsArgs) -> ProvisionResult<()> {
    let (resolution, _) = config::resolve(&Inputs::from(args.inputs)).await?;
    let vm = match &args.vm {
        Some(name) => resolution
            .vm(name)
            .ok_or_else(|| ProvisionError::UnknownVm(name.clone()))?,
        None => resolution
            .vms
            .first()
            .ok_or_else(|| ProvisionError::UnknownVm("(none resolved)".into()))?,
    };

    println!("{}", listing(&ScriptComposer::new(), vm, &resolution.features));
    Ok(())
}

fn listing(composer: &ScriptComposer, vm: &vmspec::VmSpec, features: &vmspec::FeatureSet) -> String {
    let mut out = format!("{} (start: {})\n", vm.name, bootscript::start_command(vm.minimal_mode));
    for status in composer.plan(vm, features) {
        let mark = if status.included { "+" } else { "-" };
        out.push_str(&format!(
            "  [{:02}] {mark} {:<24} {}\n",
            status.phase.number(),
            status.name,
            status.phase
        ));
    }
    out
}
