use clap::Args;
use serde::Serialize;

use relink::template;

use super::CmdResult;

#[derive(Args)]
pub struct TemplatesArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    name: String,
    description: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesOutput {
    command: String,
    templates: Vec<TemplateSummary>,
}

pub fn run(_args: TemplatesArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<TemplatesOutput> {
    let templates = template::list()?
        .into_iter()
        .map(|t| TemplateSummary {
            name: t.name,
            description: t.description,
        })
        .collect();

    Ok((
        TemplatesOutput {
            command: "templates".to_string(),
            templates,
        },
        0,
    ))
}
