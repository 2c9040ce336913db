//! Loading rule collections from a rules directory.
//!
//! Every `*.json` or `*.toml` file in the directory is one collection, named
//! after its file name and loaded in file name order. JSON files hold an
//! array of rules; TOML files hold `[[rule]]` tables. A file that fails to
//! load is reported without stopping the others.

use crate::sort::error::{Result, SortError};
use crate::sort::rule::{RuleDefinition, RuleSet};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RULE_EXTENSIONS: &[&str] = &["json", "toml"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlRuleFile {
    #[serde(default)]
    rule: Vec<RuleDefinition>,
}

/// Outcome of loading one rule file.
#[derive(Debug)]
pub enum CollectionLoad {
    Loaded { path: PathBuf, ruleset: RuleSet },
    Failed { path: PathBuf, name: String, error: SortError },
}

impl CollectionLoad {
    pub fn name(&self) -> &str {
        match self {
            CollectionLoad::Loaded { ruleset, .. } => ruleset.name(),
            CollectionLoad::Failed { name, .. } => name,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            CollectionLoad::Loaded { path, .. } | CollectionLoad::Failed { path, .. } => path,
        }
    }
}

/// Load every rule file in `dir`. Fails only if the directory itself cannot
/// be read.
pub fn load_rules_dir(dir: &Path) -> Result<Vec<CollectionLoad>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_rule_file(path))
        .collect();
    paths.sort();

    let mut loads = Vec::with_capacity(paths.len());
    for path in paths {
        let name = collection_name(&path);
        match load_rule_file(&path) {
            Ok(ruleset) => {
                debug!(
                    collection = %ruleset.name(),
                    rules = ruleset.rules().len(),
                    "Loaded rule collection"
                );
                loads.push(CollectionLoad::Loaded { path, ruleset });
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Failed to load rule collection");
                loads.push(CollectionLoad::Failed { path, name, error });
            }
        }
    }
    Ok(loads)
}

/// Load one rule file as a collection.
pub fn load_rule_file(path: &Path) -> Result<RuleSet> {
    let content = fs::read_to_string(path)?;
    let defs = parse_definitions(path, &content)?;
    RuleSet::from_definitions(collection_name(path), &defs)
}

fn parse_definitions(path: &Path, content: &str) -> Result<Vec<RuleDefinition>> {
    match extension(path).as_deref() {
        Some("json") => Ok(serde_json::from_str(content)?),
        Some("toml") => Ok(toml::from_str::<TomlRuleFile>(content)?.rule),
        _ => Err(SortError::Config(format!(
            "Unsupported rule file: {} (expected .json or .toml)",
            path.display()
        ))),
    }
}

fn is_rule_file(path: &Path) -> bool {
    extension(path).is_some_and(|ext| RULE_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn collection_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
