//! Version location and in-place replacement inside manifest files.
//!
//! Manifests are opaque text: the only structure assumed is a literal
//! identifier occurrence followed somewhere later by a version-shaped token.
//! Replacement splices the matched span only, leaving every other byte
//! untouched.

use regex::Regex;
use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;

/// Character class a version token may consist of.
pub const VERSION_CHARSET: &str = "[0-9A-Za-z._-]+";

const VERSION_TOKEN: &str = "{{version}}";

/// Derive the version regex from a template's version-placeholder pattern.
///
/// Literal portions are regex-escaped; the `{{version}}` token becomes a
/// capture group over the version charset. One regex serves both detection
/// and validation.
pub fn version_regex(version_pattern: &str) -> Result<Regex> {
    if !version_pattern.contains(VERSION_TOKEN) {
        return Err(Error::validation_invalid_argument(
            "detect.versionPattern",
            format!("Pattern must contain the {} token", VERSION_TOKEN),
        ));
    }

    let pattern = version_pattern
        .split(VERSION_TOKEN)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(&format!("({})", VERSION_CHARSET));

    Regex::new(&pattern).map_err(|e| {
        Error::validation_invalid_argument(
            "detect.versionPattern",
            format!("Derived regex is invalid: {}", e),
        )
    })
}

/// Find the version token occurring after the first literal `identifier`
/// occurrence in the file. Returns the matched text.
pub fn locate_after(path: &Path, identifier: &str, version_regex: &Regex) -> Result<String> {
    let content = io::read_file(path, "read manifest")?;
    let (_, _, matched) = locate_span(&content, path, identifier, version_regex)?;
    Ok(matched.to_string())
}

/// Replace the version token occurring after the first literal `identifier`
/// occurrence, splicing `replacement` over the matched span only. Returns
/// the text that was overwritten.
pub fn replace_after(
    path: &Path,
    identifier: &str,
    version_regex: &Regex,
    replacement: &str,
) -> Result<String> {
    let content = io::read_file(path, "read manifest")?;
    let (start, end, matched) = locate_span(&content, path, identifier, version_regex)?;
    let previous = matched.to_string();

    let mut updated = String::with_capacity(content.len() + replacement.len());
    updated.push_str(&content[..start]);
    updated.push_str(replacement);
    updated.push_str(&content[end..]);

    io::write_file_atomic(path, &updated, "write manifest")?;
    Ok(previous)
}

/// Collect every version token in the file, in order of appearance.
/// Used to resolve the source project's current version.
pub fn versions_in(path: &Path, version_regex: &Regex) -> Result<Vec<String>> {
    let content = io::read_file(path, "read manifest")?;

    Ok(version_regex
        .captures_iter(&content)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
        .collect())
}

fn locate_span<'a>(
    content: &'a str,
    path: &Path,
    identifier: &str,
    version_regex: &Regex,
) -> Result<(usize, usize, &'a str)> {
    let identifier_pos = content
        .find(identifier)
        .ok_or_else(|| Error::identifier_not_found(path.display().to_string(), identifier))?;

    let suffix_start = identifier_pos + identifier.len();
    let suffix = &content[suffix_start..];

    let captures = version_regex.captures(suffix).ok_or_else(|| {
        Error::version_not_matched(path.display().to_string(), version_regex.as_str())
    })?;

    // The capture group scopes the span to the version token itself when the
    // regex carries literal context around it.
    let m = captures
        .get(1)
        .or_else(|| captures.get(0))
        .expect("regex match has group 0");

    Ok((
        suffix_start + m.start(),
        suffix_start + m.end(),
        m.as_str(),
    ))
}
