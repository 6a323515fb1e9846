use clap::Args;
use serde::Serialize;

use relink::orchestrator;

use super::CmdResult;

#[derive(Args)]
pub struct InitArgs {
    /// Template name describing the source library's ecosystem
    pub library: String,

    /// Identifier the dependents reference the library by
    pub identifier: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutput {
    command: String,
    template_name: String,
    identifier: String,
    package_directory: String,
}

pub fn run(args: InitArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<InitOutput> {
    let config = orchestrator::init(&args.library, &args.identifier)?;

    Ok((
        InitOutput {
            command: "init".to_string(),
            template_name: config.template_name,
            identifier: args.identifier,
            package_directory: config.package_directory,
        },
        0,
    ))
}
