//! Sequential task execution with lifecycle events.
//!
//! One pipeline runs one materialized task sequence inside one working
//! directory, fail-fast: the first task failure emits a terminal `Error`
//! event and the remaining tasks are never attempted. `PipelineDone` is
//! emitted only when every task succeeded.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;

use crate::error::{Error, Result};
use crate::logs;
use crate::manifest;
use crate::task::{Task, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    TaskStart,
    TaskProgress,
    TaskFinish,
    Error,
    PipelineDone,
}

/// Lifecycle event on the shared stream. The `pipeline` label attributes
/// events to their producing unit once streams from concurrent pipelines
/// interleave.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub pipeline: String,
    pub task_name: String,
    pub message: String,
    pub percentage: Option<u32>,
    pub error: Option<Error>,
}

impl Event {
    fn new(event_type: EventType, pipeline: &str, task_name: &str, message: &str) -> Self {
        Self {
            event_type,
            pipeline: pipeline.to_string(),
            task_name: task_name.to_string(),
            message: message.to_string(),
            percentage: None,
            error: None,
        }
    }
}

pub struct Pipeline {
    pub label: String,
    pub tasks: Vec<Task>,
    pub working_dir: String,
    pub sink: Sender<Event>,
}

impl Pipeline {
    /// Run every task in order. Events are the only record of what happened;
    /// per-task output goes to the log files.
    pub fn run(&self) {
        let total = self.tasks.len();

        for (index, task) in self.tasks.iter().enumerate() {
            self.emit(Event::new(
                EventType::TaskStart,
                &self.label,
                &task.name,
                "starting",
            ));

            if let Err(err) = self.run_task(task) {
                let mut event = Event::new(
                    EventType::Error,
                    &self.label,
                    &task.name,
                    &err.message,
                );
                event.error = Some(err);
                self.emit(event);
                return;
            }

            self.emit(Event::new(
                EventType::TaskFinish,
                &self.label,
                &task.name,
                "completed",
            ));

            let mut progress = Event::new(
                EventType::TaskProgress,
                &self.label,
                &task.name,
                &format!("{}/{} tasks completed", index + 1, total),
            );
            progress.percentage = Some(((index + 1) * 100 / total.max(1)) as u32);
            self.emit(progress);
        }

        self.emit(Event::new(
            EventType::PipelineDone,
            &self.label,
            "",
            "pipeline completed",
        ));
    }

    fn run_task(&self, task: &Task) -> Result<()> {
        let workdir = self.effective_workdir(task)?;

        match &task.kind {
            TaskKind::Shell { cmd } => self.run_shell_task(task, cmd, &workdir),
            TaskKind::ReplaceVersion {
                manifest: manifest_name,
                identifier,
                version_pattern,
                version,
            } => self.run_replace_task(task, &workdir, manifest_name, identifier, version_pattern, version),
        }
    }

    /// The task's own workdir when set, else the pipeline default. A path
    /// that exists but is not a directory falls back to its parent.
    fn effective_workdir(&self, task: &Task) -> Result<PathBuf> {
        let raw = if task.workdir.is_empty() {
            &self.working_dir
        } else {
            &task.workdir
        };

        let path = Path::new(raw);
        if !path.exists() {
            return Err(Error::workdir_missing(raw));
        }

        if path.is_dir() {
            Ok(path.to_path_buf())
        } else {
            Ok(path.parent().unwrap_or(path).to_path_buf())
        }
    }

    fn run_shell_task(&self, task: &Task, cmd: &str, workdir: &Path) -> Result<()> {
        let (file, log_path) = logs::create_task_log(&task.name, workdir)?;

        let stdout = file.try_clone().map_err(|e| {
            Error::internal_io(e.to_string(), Some("clone log handle".to_string()))
        })?;

        let status = shell_command(cmd)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(file))
            .status()
            .map_err(|e| {
                Error::process_failed(&task.name, None, Some(log_path.display().to_string()))
                    .with_hint(format!("Spawn failed: {}", e))
            })?;

        if !status.success() {
            return Err(Error::process_failed(
                &task.name,
                status.code(),
                Some(log_path.display().to_string()),
            ));
        }

        Ok(())
    }

    fn run_replace_task(
        &self,
        task: &Task,
        workdir: &Path,
        manifest_name: &str,
        identifier: &str,
        version_pattern: &str,
        version: &str,
    ) -> Result<()> {
        use std::io::Write;

        let (mut file, _) = logs::create_task_log(&task.name, workdir)?;

        let regex = manifest::version_regex(version_pattern)?;
        let manifest_path = workdir.join(manifest_name);
        let previous = manifest::replace_after(&manifest_path, identifier, &regex, version)?;

        writeln!(
            file,
            "{}: {} -> {}",
            manifest_path.display(),
            previous,
            version
        )
        .map_err(|e| Error::internal_io(e.to_string(), Some("write task log".to_string())))?;

        Ok(())
    }

    fn emit(&self, event: Event) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.sink.send(event);
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::mpsc;

    fn shell_task(name: &str, cmd: &str) -> Task {
        Task {
            kind: TaskKind::Shell {
                cmd: cmd.to_string(),
            },
            name: name.to_string(),
            workdir: String::new(),
            outputs: HashMap::new(),
        }
    }

    fn run_pipeline(tasks: Vec<Task>, working_dir: &str) -> Vec<Event> {
        let (tx, rx) = mpsc::channel();
        let pipeline = Pipeline {
            label: "[test] pipeline".to_string(),
            tasks,
            working_dir: working_dir.to_string(),
            sink: tx,
        };
        pipeline.run();
        drop(pipeline);
        rx.iter().collect()
    }

    fn kinds(events: &[Event]) -> Vec<EventType> {
        events.iter().map(|e| e.event_type).collect()
    }

    #[test]
    fn all_tasks_succeeding_ends_with_pipeline_done() {
        let dir = tempfile::tempdir().unwrap();
        let events = run_pipeline(
            vec![shell_task("one", "true"), shell_task("two", "true")],
            &dir.path().display().to_string(),
        );

        assert_eq!(
            kinds(&events),
            vec![
                EventType::TaskStart,
                EventType::TaskFinish,
                EventType::TaskProgress,
                EventType::TaskStart,
                EventType::TaskFinish,
                EventType::TaskProgress,
                EventType::PipelineDone,
            ]
        );
        assert_eq!(events.last().unwrap().message, "pipeline completed");
    }

    #[test]
    fn failure_aborts_remaining_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let events = run_pipeline(
            vec![
                shell_task("ok", "true"),
                shell_task("fail", "false"),
                shell_task("never", "true"),
            ],
            &dir.path().display().to_string(),
        );

        assert_eq!(
            kinds(&events),
            vec![
                EventType::TaskStart,
                EventType::TaskFinish,
                EventType::TaskProgress,
                EventType::TaskStart,
                EventType::Error,
            ]
        );
        assert!(events.iter().all(|e| e.task_name != "never"));

        let error = events.last().unwrap().error.as_ref().unwrap();
        assert_eq!(error.code.as_str(), "pipeline.process_failed");
        assert_eq!(error.details["exitCode"], 1);
    }

    #[test]
    fn missing_workdir_fails_the_task() {
        let events = run_pipeline(vec![shell_task("task", "true")], "/nonexistent/workdir");

        let error = events.last().unwrap().error.as_ref().unwrap();
        assert_eq!(error.code.as_str(), "pipeline.workdir_missing");
    }

    #[test]
    fn task_output_is_redirected_to_its_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let events = run_pipeline(
            vec![shell_task("[lib] echo", "echo captured-line; echo err-line >&2")],
            &dir.path().display().to_string(),
        );

        assert_eq!(events.last().unwrap().event_type, EventType::PipelineDone);
        // No output line is replayed into the stream.
        assert!(events.iter().all(|e| !e.message.contains("captured-line")));

        let log = dir.path().join(".relink/logs/[lib] echo.log");
        let content = std::fs::read_to_string(log).unwrap();
        assert!(content.contains("captured-line"));
        assert!(content.contains("err-line"));
    }

    #[test]
    fn replace_version_task_edits_manifest_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pom.xml"),
            "<artifactId>my-lib</artifactId>\n<version>1.0.0</version>\n",
        )
        .unwrap();

        let task = Task {
            kind: TaskKind::ReplaceVersion {
                manifest: "pom.xml".to_string(),
                identifier: "my-lib".to_string(),
                version_pattern: "<version>{{version}}</version>".to_string(),
                version: "2.0.0".to_string(),
            },
            name: "[my-lib] sync".to_string(),
            workdir: String::new(),
            outputs: HashMap::new(),
        };

        let events = run_pipeline(vec![task], &dir.path().display().to_string());
        assert_eq!(events.last().unwrap().event_type, EventType::PipelineDone);

        let manifest = std::fs::read_to_string(dir.path().join("pom.xml")).unwrap();
        assert!(manifest.contains("<version>2.0.0</version>"));

        let log = std::fs::read_to_string(
            dir.path().join(".relink/logs/[my-lib] sync.log"),
        )
        .unwrap();
        assert!(log.contains("1.0.0 -> 2.0.0"));
    }

    #[test]
    fn task_workdir_overrides_pipeline_default() {
        let default_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();

        let mut task = shell_task("touch", "touch here.txt");
        task.workdir = other_dir.path().display().to_string();

        let events = run_pipeline(vec![task], &default_dir.path().display().to_string());
        assert_eq!(events.last().unwrap().event_type, EventType::PipelineDone);
        assert!(other_dir.path().join("here.txt").exists());
        assert!(!default_dir.path().join("here.txt").exists());
    }
}
