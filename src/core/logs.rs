//! Per-task log files: one file per task name per working directory.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths;

/// Create (truncating) the log file for a task under `workdir`.
///
/// Collisions on task name overwrite — task names already carry the
/// reference identifier, so concurrent pipelines never contend.
pub fn create_task_log(task_name: &str, workdir: &Path) -> Result<(File, PathBuf)> {
    let dir = paths::log_dir(workdir);
    std::fs::create_dir_all(&dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("create log dir".to_string())))?;

    let path = dir.join(format!("{}.log", task_name));
    let mut file = File::create(&path)
        .map_err(|e| Error::internal_io(e.to_string(), Some("create task log".to_string())))?;

    writeln!(
        file,
        "# {} — {}",
        task_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
    .map_err(|e| Error::internal_io(e.to_string(), Some("write log header".to_string())))?;

    Ok((file, path))
}
