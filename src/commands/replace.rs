use clap::Args;
use serde::Serialize;

use relink::orchestrator::{self, ReplacedManifest};

use super::CmdResult;

#[derive(Args)]
pub struct ReplaceArgs {
    /// Identifier whose version should be replaced
    pub identifier: String,

    /// Version to apply (detected from the source manifest when omitted)
    #[arg(long, short = 'v')]
    pub version: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutput {
    command: String,
    identifier: String,
    version: String,
    changes: Vec<ReplacedManifest>,
}

pub fn run(args: ReplaceArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReplaceOutput> {
    let outcome = orchestrator::replace(&args.identifier, args.version.as_deref())?;

    Ok((
        ReplaceOutput {
            command: "replace".to_string(),
            identifier: outcome.identifier,
            version: outcome.version,
            changes: outcome.changes,
        },
        0,
    ))
}
