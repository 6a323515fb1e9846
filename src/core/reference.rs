//! Tracked references and the merge-on-write references store.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;
use crate::utils::io;

/// A tracked external project: its identifier plus every manifest directory
/// where the identifier appears.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub identifier: String,
    pub directories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCollection {
    pub references: Vec<Reference>,
}

impl ReferenceCollection {
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn find(&self, identifier: &str) -> Option<&Reference> {
        self.references
            .iter()
            .find(|r| r.identifier == identifier)
    }

    /// Merge another collection into this one.
    ///
    /// New identifiers are appended; for existing identifiers the directory
    /// lists are unioned, keeping first-appearance order and dropping
    /// duplicates. Directories are never removed.
    pub fn merge(&mut self, incoming: ReferenceCollection) {
        for reference in incoming.references {
            match self
                .references
                .iter_mut()
                .find(|r| r.identifier == reference.identifier)
            {
                Some(existing) => {
                    existing.directories =
                        merge_unique(&existing.directories, &reference.directories);
                }
                None => self.references.push(reference),
            }
        }
    }
}

fn merge_unique(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for dir in existing.iter().chain(incoming.iter()) {
        if seen.insert(dir.as_str()) {
            merged.push(dir.clone());
        }
    }

    merged
}

/// Load the references file. A missing file is an empty collection, not an error.
pub fn load() -> Result<ReferenceCollection> {
    let path = paths::references_file();
    if !path.exists() {
        return Ok(ReferenceCollection::default());
    }

    let content = io::read_file(&path, "read references")?;
    serde_json::from_str(&content)
        .map_err(|e| Error::validation_invalid_json(e, Some(path.display().to_string())))
}

/// Save with read-merge-write semantics: the stored collection is loaded,
/// `incoming` is merged into it, and the union is written back atomically.
pub fn save(incoming: ReferenceCollection) -> Result<ReferenceCollection> {
    let mut stored = load()?;
    stored.merge(incoming);
    write(&stored)?;
    Ok(stored)
}

/// Create an empty references file if none exists yet. Existing references
/// survive re-running init.
pub fn ensure_store() -> Result<()> {
    if paths::references_file().exists() {
        return Ok(());
    }
    write(&ReferenceCollection::default())
}

fn write(collection: &ReferenceCollection) -> Result<()> {
    let path = paths::references_file();
    if let Some(parent) = path.parent() {
        io::ensure_dir(parent, "create relink dir")?;
    }

    let content = serde_json::to_string_pretty(collection)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize references".to_string())))?;
    io::write_file_atomic(&path, &content, "write references")
}

/// Resolve the set of references an update operates on: one reference when an
/// identifier is given, otherwise every stored reference.
pub fn resolve_set(filter: Option<&str>) -> Result<Vec<Reference>> {
    let collection = load()?;

    match filter {
        Some(identifier) => {
            let reference = collection
                .find(identifier)
                .cloned()
                .ok_or_else(|| Error::reference_not_found(identifier))?;
            Ok(vec![reference])
        }
        None => {
            if collection.is_empty() {
                return Err(Error::no_references());
            }
            Ok(collection.references)
        }
    }
}

/// Walk `root` and collect the directories of every file named `manifest`
/// whose bytes contain `identifier`.
pub fn scan_manifest_directories(
    root: &Path,
    manifest: &str,
    identifier: &str,
) -> Result<Vec<String>> {
    let mut directories = Vec::new();
    walk(root, manifest, identifier, &mut directories)?;
    Ok(directories)
}

fn walk(dir: &Path, manifest: &str, identifier: &str, out: &mut Vec<String>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("scan {}", dir.display()))))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| Error::internal_io(e.to_string(), Some("scan directory".to_string())))?;
        let path = entry.path();

        if path.is_dir() {
            walk(&path, manifest, identifier, out)?;
        } else if path.file_name().is_some_and(|n| n == manifest) {
            let content = io::read_file(&path, "read manifest")?;
            if content.contains(identifier) {
                if let Some(parent) = path.parent() {
                    out.push(parent.display().to_string());
                }
            }
        }
    }

    Ok(())
}
