use std::env;
use std::path::{Path, PathBuf};

/// Working directory name for all relink state inside a project.
pub const RELINK_DIR: &str = ".relink";

const DEFAULT_TEMPLATE_REPOSITORY_URL: &str =
    "https://raw.githubusercontent.com/Extra-Chill/relink/main/templates";

/// Project-relative relink state directory (override: RELINK_PATH).
pub fn relink_dir() -> PathBuf {
    env_or_default("RELINK_PATH", RELINK_DIR)
}

/// Local template definitions directory (override: RELINK_TEMPLATES_PATH).
pub fn templates_dir() -> PathBuf {
    env_or_default("RELINK_TEMPLATES_PATH", "templates")
}

/// Remote template repository base URL (override: RELINK_TEMPLATE_REPOSITORY_URL).
pub fn template_repository_url() -> String {
    env::var("RELINK_TEMPLATE_REPOSITORY_URL")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPLATE_REPOSITORY_URL.to_string())
}

/// references.json path inside the relink directory.
pub fn references_file() -> PathBuf {
    relink_dir().join("references.json")
}

/// config.json path inside the relink directory.
pub fn config_file() -> PathBuf {
    relink_dir().join("config.json")
}

/// Project-local template copy written by init.
pub fn project_template_file() -> PathBuf {
    relink_dir().join("template.json")
}

/// Template definition path for a named template.
pub fn template_file(name: &str) -> PathBuf {
    templates_dir().join(format!("{}.json", name))
}

/// Per-workdir task log directory.
pub fn log_dir(workdir: &Path) -> PathBuf {
    workdir.join(RELINK_DIR).join("logs")
}

fn env_or_default(key: &str, default: &str) -> PathBuf {
    match env::var(key) {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(default),
    }
}
