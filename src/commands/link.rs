use clap::Args;
use serde::Serialize;

use relink::orchestrator;

use super::CmdResult;

#[derive(Args)]
pub struct LinkArgs {
    /// Identifier to look for inside manifest files
    pub identifier: String,

    /// Root of the dependent project tree to scan
    pub path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOutput {
    command: String,
    identifier: String,
    directories: Vec<String>,
}

pub fn run(args: LinkArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<LinkOutput> {
    relink::log_status!("link", "Scanning {} for manifests referencing {}", args.path, args.identifier);

    let reference = orchestrator::link(&args.identifier, &args.path)?;

    Ok((
        LinkOutput {
            command: "link".to_string(),
            identifier: reference.identifier,
            directories: reference.directories,
        },
        0,
    ))
}
