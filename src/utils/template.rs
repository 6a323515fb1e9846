//! String template rendering: `{{key}}` substitution from a key-value context.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Well-known context keys populated by the orchestrator.
pub struct ContextVars;

impl ContextVars {
    pub const IDENTIFIER: &'static str = "identifier";
    pub const SOURCE_DIR: &'static str = "sourceDir";
    pub const TARGET_DIR: &'static str = "targetDir";
    pub const VERSION: &'static str = "version";
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_.-]+)\}\}").expect("token regex"))
}

/// Substitute `{{key}}` tokens with values from `context`.
///
/// Single pass over the input: tokens whose key is missing from the context
/// are left untouched, and substituted values are never re-expanded even if
/// they contain `{{...}}` themselves.
pub fn resolve(template: &str, context: &HashMap<String, String>) -> String {
    token_regex()
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match context.get(key) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Check whether a template mentions a given key.
pub fn is_present(template: &str, key: &str) -> bool {
    let placeholder = format!("{{{{{}}}}}", key);
    template.contains(&placeholder)
}
