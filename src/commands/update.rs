use clap::Args;
use serde::Serialize;

use relink::orchestrator;
use relink::pipeline::{Event, EventType};

use super::CmdResult;
use crate::tty;

#[derive(Args)]
pub struct UpdateArgs {
    /// Identifier to update (every linked reference when omitted)
    pub identifier: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub identifier: String,
    pub directory: String,
    pub tasks: usize,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    pipelines: Vec<PipelineReport>,
    succeeded: usize,
    failed: usize,
}

pub fn run(args: UpdateArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<UpdateOutput> {
    let run = orchestrator::update(args.identifier.as_deref())?;

    relink::log_status!("update", "Launched {} pipelines", run.launched.len());

    let mut reports: Vec<PipelineReport> = run
        .launched
        .iter()
        .map(|unit| PipelineReport {
            identifier: unit.identifier.clone(),
            directory: unit.directory.clone(),
            tasks: unit.tasks,
            status: "running".to_string(),
            error: None,
            error_code: None,
        })
        .collect();

    // Drain until every pipeline has reached a terminal state; the channel
    // closes only then.
    for event in run.events.iter() {
        render_event(&event);

        let Some(report) = reports
            .iter_mut()
            .find(|r| format!("[{}] {}", r.identifier, r.directory) == event.pipeline)
        else {
            continue;
        };

        match event.event_type {
            EventType::PipelineDone => report.status = "completed".to_string(),
            EventType::Error => {
                report.status = "failed".to_string();
                report.error = Some(event.message.clone());
                report.error_code = event.error.as_ref().map(|e| e.code.as_str().to_string());
            }
            _ => {}
        }
    }

    let succeeded = reports.iter().filter(|r| r.status == "completed").count();
    let failed = reports.iter().filter(|r| r.status == "failed").count();

    // Any Error event is fatal to the exit status, never to the stream.
    let exit_code = if failed > 0 { 20 } else { 0 };

    Ok((
        UpdateOutput {
            command: "update".to_string(),
            version: run.version,
            pipelines: reports,
            succeeded,
            failed,
        },
        exit_code,
    ))
}

fn render_event(event: &Event) {
    match event.event_type {
        EventType::TaskStart => tty::status(&format!("START: {}", event.task_name)),
        EventType::TaskProgress => tty::status(&format!("   {}", event.message)),
        EventType::TaskFinish => tty::status(&format!("DONE:  {}", event.task_name)),
        EventType::Error => {
            tty::status(&format!("ERROR in {}: {}", event.task_name, event.message))
        }
        EventType::PipelineDone => tty::status(&format!("Pipeline finished: {}", event.pipeline)),
    }
}
