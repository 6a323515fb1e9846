//! Materialization of template steps into concrete, variable-resolved tasks.

use std::collections::HashMap;

use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::reference::Reference;
use crate::template::{Step, StepType, Template};
use crate::utils::template::{resolve, ContextVars};

/// What the pipeline actually executes for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Spawn `cmd` through the host shell.
    Shell { cmd: String },
    /// Splice `version` into the target manifest in place.
    ReplaceVersion {
        manifest: String,
        identifier: String,
        version_pattern: String,
        version: String,
    },
}

/// A concrete task. Created fresh per (reference, directory, step) triple
/// and never mutated after creation.
#[derive(Debug, Clone)]
pub struct Task {
    pub kind: TaskKind,
    pub name: String,
    pub workdir: String,
    pub outputs: HashMap<String, String>,
}

/// Turn a template's ordered step list into the ordered task sequence for
/// one (reference, target directory) pair.
///
/// Each step gets its own variable layer: the execution context overridden
/// by the step's `variables`, whose values are themselves resolved against
/// the context first (one level of derived variables).
pub fn materialize(
    template: &Template,
    reference: &Reference,
    context: &ExecutionContext,
) -> Result<Vec<Task>> {
    let mut tasks = Vec::with_capacity(template.steps.len());

    for (index, step) in template.steps.iter().enumerate() {
        tasks.push(materialize_step(template, reference, context, index, step)?);
    }

    Ok(tasks)
}

fn materialize_step(
    template: &Template,
    reference: &Reference,
    context: &ExecutionContext,
    index: usize,
    step: &Step,
) -> Result<Task> {
    if step.name.is_empty() {
        return Err(Error::invalid_step(index, vec!["name".to_string()]));
    }

    let layer = step_layer(context, &step.variables);

    let kind = match step.step_type {
        StepType::Command => {
            let cmd = step
                .cmd
                .as_deref()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| Error::invalid_step(index, vec!["cmd".to_string()]))?;
            TaskKind::Shell {
                cmd: resolve(cmd, &layer),
            }
        }
        StepType::Script => {
            if step.script.is_empty() {
                return Err(Error::invalid_step(index, vec!["script".to_string()]));
            }
            // Any failing line aborts the step.
            let cmd = step.script.join(" && ");
            TaskKind::Shell {
                cmd: resolve(&cmd, &layer),
            }
        }
        StepType::ReplaceVersion => {
            let version = context.get(ContextVars::VERSION).ok_or_else(|| {
                Error::validation_invalid_argument(
                    "version",
                    "No resolved version available for a replaceVersion step",
                )
            })?;
            TaskKind::ReplaceVersion {
                manifest: template.manifest()?.to_string(),
                identifier: reference.identifier.clone(),
                version_pattern: template.version_pattern()?.to_string(),
                version: version.to_string(),
            }
        }
    };

    let outputs = step
        .outputs
        .iter()
        .map(|(key, value)| (key.clone(), resolve(value, &layer)))
        .collect();

    Ok(Task {
        kind,
        // Identifier prefix disambiguates tasks across concurrent pipelines.
        name: format!("[{}] {}", reference.identifier, step.name),
        workdir: resolve(&step.workdir, &layer),
        outputs,
    })
}

fn step_layer(
    context: &ExecutionContext,
    step_vars: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut layer = context.vars().clone();

    for (key, value) in step_vars {
        let resolved = resolve(value, context.vars());
        layer.insert(key.clone(), resolved);
    }

    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;

    fn reference() -> Reference {
        Reference {
            identifier: "my-lib".to_string(),
            directories: vec!["/srv/app".to_string()],
        }
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new(&reference(), "/src/my-lib", "/srv/app")
    }

    fn template_with_steps(steps_json: &str) -> Template {
        let json = format!(
            r#"{{
                "name": "t",
                "detect": {{
                    "manifest": "pom.xml",
                    "searchPattern": "my-lib",
                    "versionPattern": "<version>{{{{version}}}}</version>"
                }},
                "steps": {}
            }}"#,
            steps_json
        );
        template::parse(&json, "test").unwrap()
    }

    #[test]
    fn command_step_resolves_cmd_and_workdir() {
        let template = template_with_steps(
            r#"[{"name": "build", "type": "command",
                 "cmd": "mvn install {{identifier}}", "workdir": "{{targetDir}}"}]"#,
        );

        let tasks = materialize(&template, &reference(), &context()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "[my-lib] build");
        assert_eq!(tasks[0].workdir, "/srv/app");
        assert_eq!(
            tasks[0].kind,
            TaskKind::Shell {
                cmd: "mvn install my-lib".to_string()
            }
        );
    }

    #[test]
    fn script_step_joins_lines_with_and() {
        let template = template_with_steps(
            r#"[{"name": "rebuild", "type": "script", "workdir": "",
                 "script": ["cd {{targetDir}}", "make clean", "make"]}]"#,
        );

        let tasks = materialize(&template, &reference(), &context()).unwrap();
        assert_eq!(
            tasks[0].kind,
            TaskKind::Shell {
                cmd: "cd /srv/app && make clean && make".to_string()
            }
        );
    }

    #[test]
    fn step_variables_override_context_after_one_resolution_pass() {
        let template = template_with_steps(
            r#"[{"name": "echo", "type": "command",
                 "cmd": "echo {{msg}}", "workdir": "",
                 "variables": {"msg": "building {{identifier}}"}}]"#,
        );

        let tasks = materialize(&template, &reference(), &context()).unwrap();
        assert_eq!(
            tasks[0].kind,
            TaskKind::Shell {
                cmd: "echo building my-lib".to_string()
            }
        );
    }

    #[test]
    fn order_is_preserved() {
        let template = template_with_steps(
            r#"[{"name": "one", "type": "command", "cmd": "a", "workdir": ""},
                {"name": "two", "type": "command", "cmd": "b", "workdir": ""},
                {"name": "three", "type": "command", "cmd": "c", "workdir": ""}]"#,
        );

        let tasks = materialize(&template, &reference(), &context()).unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["[my-lib] one", "[my-lib] two", "[my-lib] three"]
        );
    }

    #[test]
    fn command_step_without_cmd_is_invalid() {
        let template =
            template_with_steps(r#"[{"name": "broken", "type": "command", "workdir": ""}]"#);

        let err = materialize(&template, &reference(), &context()).unwrap_err();
        assert_eq!(err.code.as_str(), "template.invalid_step");
        assert_eq!(err.details["stepIndex"], 0);
    }

    #[test]
    fn replace_version_step_carries_detection_data() {
        let template = template_with_steps(
            r#"[{"name": "sync", "type": "replaceVersion", "workdir": "{{targetDir}}"}]"#,
        );

        let mut ctx = context();
        ctx.insert("version", "2.0.0");

        let tasks = materialize(&template, &reference(), &ctx).unwrap();
        assert_eq!(
            tasks[0].kind,
            TaskKind::ReplaceVersion {
                manifest: "pom.xml".to_string(),
                identifier: "my-lib".to_string(),
                version_pattern: "<version>{{version}}</version>".to_string(),
                version: "2.0.0".to_string(),
            }
        );
    }

    #[test]
    fn replace_version_step_requires_resolved_version() {
        let template =
            template_with_steps(r#"[{"name": "sync", "type": "replaceVersion", "workdir": ""}]"#);

        let err = materialize(&template, &reference(), &context()).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn outputs_are_resolved_against_the_step_layer() {
        let template = template_with_steps(
            r#"[{"name": "build", "type": "command", "cmd": "make", "workdir": "",
                 "outputs": {"artifact": "{{targetDir}}/out.jar"}}]"#,
        );

        let tasks = materialize(&template, &reference(), &context()).unwrap();
        assert_eq!(tasks[0].outputs["artifact"], "/srv/app/out.jar");
    }
}
