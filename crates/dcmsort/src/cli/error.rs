//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug, Serialize)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Scan root does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The directory to sort does not exist")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    /// Scan root is a file
    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("The run command sorts a directory tree, not a single file")
            .with_suggestions([
                format!("TRY: Inspect a single file: dcmsort inspect {}", path.display()),
                format!(
                    "TRY: Sort the parent directory: dcmsort run {} <OUTPUT>",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    /// Directory exists but cannot be listed
    pub fn directory_not_readable(path: &Path) -> Self {
        Self::new(format!("Cannot read directory: {}", path.display()))
            .with_context("The directory exists but could not be listed")
            .with_suggestion(format!("TRY: Check permissions: ls -ld {}", path.display()))
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    /// Rules directory missing or unreadable
    pub fn rules_dir_unavailable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read rules directory: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Pass a directory of *.json / *.toml rule files: --rules <DIR>".to_string(),
                "TRY: Set rules_dir in the config file (see: dcmsort config)".to_string(),
            ])
    }

    /// Config file could not be parsed
    pub fn invalid_config(path: &Path, reason: &str) -> Self {
        Self::new(format!("Invalid configuration file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Fix or remove the file: {}", path.display()),
                "TRY: Valid keys: rules_dir, studyinfo_file, parallel_extract, extract_threads"
                    .to_string(),
            ])
    }

    /// File is not below the given scan root
    pub fn outside_root(file: &Path, root: &Path) -> Self {
        Self::new(format!("{} is not inside {}", file.display(), root.display()))
            .with_context("fileinfo paths are computed relative to the scan root")
            .with_suggestion("TRY: Pass the directory you would sort with --root <DIR>")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout, for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({ "error": helpful }),
        None => serde_json::json!({
            "error": {
                "message": format!("{:#}", err),
                "context": null,
                "suggestions": [],
            }
        }),
    };
    println!("{}", payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While sorting")
            .with_suggestion("TRY: Again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While sorting"));
        assert!(display.contains("  TRY: Again"));
    }

    #[test]
    fn test_path_not_found() {
        let err = HelpfulError::path_not_found(&PathBuf::from("/no/such/study"));
        assert!(err.message.contains("/no/such/study"));
        assert!(!err.suggestions.is_empty());
    }

    #[test]
    fn test_not_a_directory_suggests_inspect() {
        let err = HelpfulError::not_a_directory(&PathBuf::from("/data/a.dcm"));
        assert!(err.suggestions.iter().any(|s| s.contains("dcmsort inspect")));
        assert!(err.suggestions.iter().any(|s| s.contains("dcmsort run /data")));
    }

    #[test]
    fn test_serializes_for_json_mode() {
        let err = HelpfulError::rules_dir_unavailable(&PathBuf::from("/rules"), "not found");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["context"], "not found");
        assert_eq!(value["suggestions"].as_array().unwrap().len(), 2);
    }
}
