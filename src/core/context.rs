//! Execution context: the variable layer a pipeline is materialized against.

use std::collections::HashMap;

use crate::reference::Reference;
use crate::utils::template::ContextVars;

/// Read-only variable map built once per (reference, target directory) pair.
///
/// Always carries `identifier`, `sourceDir` and `targetDir`; the orchestrator
/// layers template- and config-level variables underneath.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    vars: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new(reference: &Reference, source_dir: &str, target_dir: &str) -> Self {
        let mut vars = HashMap::new();
        vars.insert(
            ContextVars::IDENTIFIER.to_string(),
            reference.identifier.clone(),
        );
        vars.insert(ContextVars::SOURCE_DIR.to_string(), source_dir.to_string());
        vars.insert(ContextVars::TARGET_DIR.to_string(), target_dir.to_string());
        Self { vars }
    }

    /// Construction helper for the legacy call shape that only knew the
    /// target directory.
    pub fn for_directory(reference: &Reference, target_dir: &str) -> Self {
        Self::new(reference, "", target_dir)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Layer `extra` underneath the context: existing keys win.
    pub fn with_defaults(mut self, extra: &HashMap<String, String>) -> Self {
        for (key, value) in extra {
            self.vars
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn identifier(&self) -> &str {
        self.get(ContextVars::IDENTIFIER).unwrap_or_default()
    }

    pub fn target_dir(&self) -> &str {
        self.get(ContextVars::TARGET_DIR).unwrap_or_default()
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }
}
