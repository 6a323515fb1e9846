//! Top-level operations: init, link, replace, and the fan-out update.
//!
//! Update launches one pipeline per (reference, manifest directory) pair.
//! All pipelines share one event channel; the channel closes only after the
//! last pipeline reaches a terminal state. Failures never cross pipeline
//! boundaries.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::Serialize;

use crate::config::{self, ProjectConfig};
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::manifest;
use crate::pipeline::{Event, Pipeline};
use crate::reference::{self, Reference, ReferenceCollection};
use crate::task::{self, Task};
use crate::template::{self, StepType, Template};
use crate::utils::parser;
use crate::utils::template::ContextVars;

/// Initialize the current project: config, project-local template, and the
/// references store.
pub fn init(library: &str, identifier: &str) -> Result<ProjectConfig> {
    let cfg = config::generate(library, identifier)?;
    template::generate_project_template(library, identifier, Path::new(&cfg.package_directory))?;
    reference::ensure_store()?;
    Ok(cfg)
}

/// Scan `project_root` for manifests referencing `identifier` and merge the
/// result into the references store. Returns the merged reference.
pub fn link(identifier: &str, project_root: &str) -> Result<Reference> {
    let template = template::load_project_template()?;
    let manifest_name = template.manifest()?;

    let root = shellexpand::tilde(project_root).into_owned();
    let root = Path::new(&root);
    if !root.is_dir() {
        return Err(Error::validation_invalid_argument(
            "path",
            format!("Not a directory: {}", root.display()),
        ));
    }

    let directories = reference::scan_manifest_directories(root, manifest_name, identifier)?;

    let merged = reference::save(ReferenceCollection {
        references: vec![Reference {
            identifier: identifier.to_string(),
            directories,
        }],
    })?;

    merged
        .find(identifier)
        .cloned()
        .ok_or_else(|| Error::internal_unexpected("Merged reference disappeared"))
}

/// One launched pipeline of an update run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedPipeline {
    pub identifier: String,
    pub directory: String,
    pub tasks: usize,
}

/// A running update: the shared event stream plus what was launched.
#[derive(Debug)]
pub struct UpdateRun {
    pub events: Receiver<Event>,
    pub launched: Vec<LaunchedPipeline>,
    pub version: Option<String>,
}

/// Fan out one pipeline per (reference, directory) pair.
///
/// Configuration, template, reference, and version errors fail closed here,
/// before any pipeline starts. Once launched, pipelines are fully
/// independent.
pub fn update(filter: Option<&str>) -> Result<UpdateRun> {
    let cfg = config::load()?;
    let tmpl = template::load_project_template()?;
    let references = reference::resolve_set(filter)?;

    // A replaceVersion step anywhere means the version must resolve
    // unambiguously before anything runs.
    let needs_version = tmpl
        .steps
        .iter()
        .any(|s| s.step_type == StepType::ReplaceVersion);
    let version = if needs_version {
        Some(resolve_version(None, &cfg, &tmpl)?)
    } else {
        None
    };

    let mut units: Vec<(LaunchedPipeline, Vec<Task>)> = Vec::new();
    for reference in &references {
        for directory in &reference.directories {
            let mut context =
                ExecutionContext::new(reference, &cfg.package_directory, directory);
            if let Some(version) = &version {
                context.insert(ContextVars::VERSION, version.clone());
            }
            let context = context
                .with_defaults(&cfg.variables)
                .with_defaults(&tmpl.variables);

            let tasks = task::materialize(&tmpl, reference, &context)?;
            units.push((
                LaunchedPipeline {
                    identifier: reference.identifier.clone(),
                    directory: directory.clone(),
                    tasks: tasks.len(),
                },
                tasks,
            ));
        }
    }

    let (tx, rx) = mpsc::channel();
    let mut launched = Vec::with_capacity(units.len());

    for (unit, tasks) in units {
        let pipeline = Pipeline {
            label: format!("[{}] {}", unit.identifier, unit.directory),
            tasks,
            working_dir: unit.directory.clone(),
            sink: tx.clone(),
        };
        launched.push(unit);
        thread::spawn(move || pipeline.run());
    }

    // The channel closes when the last pipeline drops its sender; dropping
    // ours makes that the completion barrier for the consumer.
    drop(tx);

    Ok(UpdateRun {
        events: rx,
        launched,
        version,
    })
}

/// One manifest edit performed by replace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacedManifest {
    pub directory: String,
    pub previous: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    pub identifier: String,
    pub version: String,
    pub changes: Vec<ReplacedManifest>,
}

/// Splice the resolved version into every manifest directory of one
/// reference. Version ambiguity fails before any file is written.
pub fn replace(identifier: &str, explicit_version: Option<&str>) -> Result<ReplaceOutcome> {
    let cfg = config::load()?;
    let tmpl = template::load_project_template()?;
    let references = reference::resolve_set(Some(identifier))?;
    let reference = &references[0];

    let version = resolve_version(explicit_version, &cfg, &tmpl)?;
    let regex = manifest::version_regex(tmpl.version_pattern()?)?;
    let manifest_name = tmpl.manifest()?;

    let mut changes = Vec::with_capacity(reference.directories.len());
    for directory in &reference.directories {
        let path = Path::new(directory).join(manifest_name);
        let previous = manifest::replace_after(&path, identifier, &regex, &version)?;
        changes.push(ReplacedManifest {
            directory: directory.clone(),
            previous,
        });
    }

    Ok(ReplaceOutcome {
        identifier: identifier.to_string(),
        version,
        changes,
    })
}

/// Resolve the version to propagate.
///
/// An explicit version is validated against the version charset. Otherwise
/// every occurrence in the source manifest must agree; disagreement is a
/// `VersionMismatch` and nothing proceeds.
pub fn resolve_version(
    explicit: Option<&str>,
    cfg: &ProjectConfig,
    tmpl: &Template,
) -> Result<String> {
    let regex = manifest::version_regex(tmpl.version_pattern()?)?;

    if let Some(version) = explicit {
        let charset = regex::Regex::new(&format!("^{}$", manifest::VERSION_CHARSET))
            .expect("version charset regex");
        if !charset.is_match(version) {
            return Err(Error::validation_invalid_argument(
                "version",
                format!("'{}' is not a valid version string", version),
            ));
        }
        return Ok(version.to_string());
    }

    let source_manifest = Path::new(&cfg.package_directory).join(tmpl.manifest()?);
    let versions = manifest::versions_in(&source_manifest, &regex)?;

    if versions.is_empty() {
        return Err(Error::version_not_matched(
            source_manifest.display().to_string(),
            regex.as_str(),
        ));
    }

    parser::require_identical(&versions, &source_manifest.display().to_string())
}
