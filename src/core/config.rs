//! Project configuration written by init and read by every other command.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::paths;
use crate::template;
use crate::utils::io;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub template_name: String,
    pub variables: HashMap<String, String>,
    pub package_directory: String,
}

/// Generate and persist the project config for `library` / `identifier`.
///
/// The package directory is the source project root: the nearest ancestor of
/// the current directory containing the manifest file the template names.
pub fn generate(library: &str, identifier: &str) -> Result<ProjectConfig> {
    let template = template::get(library)?;
    let manifest = template.manifest()?;

    let cwd = std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("resolve cwd".to_string())))?;
    let package_directory = find_project_root(&cwd, manifest)?;

    let mut variables = HashMap::new();
    variables.insert("identifier".to_string(), identifier.to_string());

    let config = ProjectConfig {
        template_name: library.to_string(),
        variables,
        package_directory: package_directory.display().to_string(),
    };

    save(&config)?;
    Ok(config)
}

pub fn save(config: &ProjectConfig) -> Result<()> {
    let path = paths::config_file();
    if let Some(parent) = path.parent() {
        io::ensure_dir(parent, "create relink dir")?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize config".to_string())))?;
    io::write_file_atomic(&path, &content, "write config")
}

pub fn load() -> Result<ProjectConfig> {
    let path = paths::config_file();
    if !path.exists() {
        return Err(Error::validation_invalid_argument(
            "config",
            "No relink config found in this project",
        )
        .with_hint("Run 'relink init <library> <identifier>' first"));
    }

    let content = io::read_file(&path, "read config")?;
    serde_json::from_str(&content)
        .map_err(|e| Error::validation_invalid_json(e, Some(path.display().to_string())))
}

/// Walk up from `start` until a directory containing `manifest` is found.
pub fn find_project_root(start: &Path, manifest: &str) -> Result<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(manifest).exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Err(Error::validation_invalid_argument(
                "manifest",
                format!("No '{}' found in any ancestor of the current directory", manifest),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_project_root_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        let nested = dir.path().join("src/main/java");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_project_root(&nested, "pom.xml").unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn find_project_root_fails_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_project_root(dir.path(), "definitely-missing.xml");
        assert!(result.is_err());
    }
}
