//! Template definitions and the local-then-remote template store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

/// Declarative definition of how to detect a dependency inside a manifest
/// and which steps propagate a new version into it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    #[serde(default)]
    pub detect: HashMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepType {
    Command,
    Script,
    ReplaceVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<String>,
    #[serde(default)]
    pub workdir: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub outputs: HashMap<String, String>,
}

impl Template {
    /// Manifest filename this template scans, from `detect["manifest"]`.
    pub fn manifest(&self) -> Result<&str> {
        self.detect
            .get("manifest")
            .map(String::as_str)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "detect.manifest",
                    "Template does not name a manifest file",
                )
            })
    }

    /// Detection literal from `detect["searchPattern"]`.
    pub fn search_pattern(&self) -> Result<&str> {
        self.detect
            .get("searchPattern")
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "detect.searchPattern",
                    "Template does not declare a search pattern",
                )
            })
    }

    /// Version placeholder literal from `detect["versionPattern"]`.
    pub fn version_pattern(&self) -> Result<&str> {
        self.detect
            .get("versionPattern")
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "detect.versionPattern",
                    "Template does not declare a version pattern",
                )
            })
    }
}

pub fn parse(content: &str, context: &str) -> Result<Template> {
    serde_json::from_str(content)
        .map_err(|e| Error::validation_invalid_json(e, Some(context.to_string())))
}

fn cache() -> &'static Mutex<HashMap<String, Template>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Template>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Resolve a template by name: local templates directory first, then the
/// remote template repository. Resolved templates are cached for the
/// process lifetime.
pub fn get(name: &str) -> Result<Template> {
    if let Some(template) = cache().lock().unwrap().get(name) {
        return Ok(template.clone());
    }

    let template = load_uncached(name)?;
    cache()
        .lock()
        .unwrap()
        .insert(name.to_string(), template.clone());
    Ok(template)
}

fn load_uncached(name: &str) -> Result<Template> {
    let path = paths::template_file(name);
    if path.exists() {
        let content = io::read_file(&path, "read template")?;
        return parse(&content, &path.display().to_string());
    }

    fetch_remote(name)
}

fn fetch_remote(name: &str) -> Result<Template> {
    let url = format!("{}/{}.json", paths::template_repository_url(), name);

    let response = reqwest::blocking::get(&url)
        .map_err(|e| Error::template_fetch_failed(name, e.to_string()))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::template_not_found(name));
    }
    if !response.status().is_success() {
        return Err(Error::template_fetch_failed(
            name,
            format!("HTTP {}", response.status()),
        ));
    }

    let content = response
        .text()
        .map_err(|e| Error::template_fetch_failed(name, e.to_string()))?;
    parse(&content, &url)
}

/// List templates available in the local templates directory.
pub fn list() -> Result<Vec<Template>> {
    let dir = paths::templates_dir();
    let mut templates = Vec::new();

    let entries = std::fs::read_dir(&dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("list {}", dir.display()))))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| Error::internal_io(e.to_string(), Some("list templates".to_string())))?;
        let path = entry.path();
        if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let content = io::read_file(&path, "read template")?;
        templates.push(parse(&content, &path.display().to_string())?);
    }

    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

/// Materialize the project-local template copy for `identifier`.
///
/// Substitutes `{{identifier}}` into the detection pattern, verifies the
/// pattern actually occurs in the source manifest, and writes the resolved
/// template to `.relink/template.json`.
pub fn generate_project_template(
    library: &str,
    identifier: &str,
    package_dir: &Path,
) -> Result<Template> {
    let mut template = get(library)?;

    let manifest = template.manifest()?.to_string();
    let pattern = template
        .search_pattern()?
        .replace("{{identifier}}", identifier);

    let manifest_path = package_dir.join(&manifest);
    let content = io::read_file(&manifest_path, "read source manifest")?;
    if !content.contains(&pattern) {
        return Err(Error::manifest_detection_failed(
            manifest_path.display().to_string(),
            pattern,
        ));
    }

    template
        .detect
        .insert("searchPattern".to_string(), pattern);
    template.variables.insert(
        "projectPath".to_string(),
        package_dir.display().to_string(),
    );

    save_project_template(&template)?;
    Ok(template)
}

pub fn save_project_template(template: &Template) -> Result<()> {
    let path = paths::project_template_file();
    if let Some(parent) = path.parent() {
        io::ensure_dir(parent, "create relink dir")?;
    }

    let content = serde_json::to_string_pretty(template)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize template".to_string())))?;
    io::write_file_atomic(&path, &content, "write project template")
}

/// Load the project-local template written by init.
pub fn load_project_template() -> Result<Template> {
    let path = paths::project_template_file();
    if !path.exists() {
        return Err(
            Error::template_not_found("template.json")
                .with_hint("Run 'relink init <library> <identifier>' first"),
        );
    }

    let content = io::read_file(&path, "read project template")?;
    parse(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE_JSON: &str = r#"{
        "name": "maven",
        "description": "Maven projects",
        "variables": {"buildCmd": "mvn -q install"},
        "detect": {
            "manifest": "pom.xml",
            "searchPattern": "<artifactId>{{identifier}}</artifactId>",
            "versionPattern": "<version>{{version}}</version>"
        },
        "steps": [
            {"name": "build", "type": "command", "cmd": "{{buildCmd}}", "workdir": "{{sourceDir}}"},
            {"name": "sync", "type": "replaceVersion", "workdir": "{{targetDir}}"}
        ]
    }"#;

    #[test]
    fn parse_reads_steps_and_detect() {
        let template = parse(TEMPLATE_JSON, "test").unwrap();
        assert_eq!(template.name, "maven");
        assert_eq!(template.steps.len(), 2);
        assert_eq!(template.steps[0].step_type, StepType::Command);
        assert_eq!(template.steps[1].step_type, StepType::ReplaceVersion);
        assert_eq!(template.manifest().unwrap(), "pom.xml");
    }

    #[test]
    fn parse_rejects_malformed_json() {
        assert!(parse("{not json", "test").is_err());
    }

    #[test]
    fn missing_detect_keys_are_reported() {
        let template = parse(r#"{"name": "empty"}"#, "test").unwrap();
        assert!(template.manifest().is_err());
        assert!(template.search_pattern().is_err());
        assert!(template.version_pattern().is_err());
    }

    #[test]
    fn generate_verifies_search_pattern_in_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("maven-gen.json"), TEMPLATE_JSON.replace("\"maven\"", "\"maven-gen\"")).unwrap();

        let package = dir.path().join("lib");
        std::fs::create_dir_all(&package).unwrap();
        std::fs::write(package.join("pom.xml"), "<artifactId>other</artifactId>").unwrap();

        std::env::set_var("RELINK_TEMPLATES_PATH", templates.display().to_string());
        std::env::set_var(
            "RELINK_PATH",
            dir.path().join(".relink").display().to_string(),
        );

        let err = generate_project_template("maven-gen", "my-lib", &package).unwrap_err();
        assert_eq!(err.code.as_str(), "manifest.detection_failed");

        std::fs::write(
            package.join("pom.xml"),
            "<artifactId>my-lib</artifactId><version>1.0.0</version>",
        )
        .unwrap();
        let template = generate_project_template("maven-gen", "my-lib", &package).unwrap();
        assert_eq!(
            template.detect["searchPattern"],
            "<artifactId>my-lib</artifactId>"
        );

        std::env::remove_var("RELINK_TEMPLATES_PATH");
        std::env::remove_var("RELINK_PATH");
    }
}
