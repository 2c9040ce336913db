//! Configuration for dcmsort
//!
//! Loaded from `<home>/config.toml` when present. Every field has a default,
//! so a partial file is valid.

use crate::sort::{Result, SortError, SortOptions, DEFAULT_STUDYINFO_FILE};
use dcmsort_logging::dcmsort_home;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SorterConfig {
    /// Directory holding rule collection files
    #[serde(default = "default_rules_dir")]
    pub rules_dir: PathBuf,

    /// Study info file name, looked up in the scan root
    #[serde(default = "default_studyinfo_file")]
    pub studyinfo_file: String,

    /// Read file headers on several threads
    #[serde(default = "default_parallel_extract")]
    pub parallel_extract: bool,

    /// Number of extraction threads when `parallel_extract` is set
    #[serde(default = "default_extract_threads")]
    pub extract_threads: usize,
}

fn default_rules_dir() -> PathBuf {
    dcmsort_home().join("rulesets")
}

fn default_studyinfo_file() -> String {
    DEFAULT_STUDYINFO_FILE.to_string()
}

fn default_parallel_extract() -> bool {
    true
}

fn default_extract_threads() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            rules_dir: default_rules_dir(),
            studyinfo_file: default_studyinfo_file(),
            parallel_extract: default_parallel_extract(),
            extract_threads: default_extract_threads(),
        }
    }
}

/// `<home>/config.toml`
pub fn config_path() -> PathBuf {
    dcmsort_home().join(CONFIG_FILE)
}

impl SorterConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SorterConfig =
            toml::from_str(&content).map_err(|e| SortError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SortError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn sort_options(&self, dry_run: bool) -> SortOptions {
        SortOptions {
            studyinfo_file: self.studyinfo_file.clone(),
            parallel_extract: self.parallel_extract,
            extract_threads: self.extract_threads,
            dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SorterConfig::default();
        assert!(config.rules_dir.ends_with("rulesets"));
        assert_eq!(config.studyinfo_file, "studyinfo.json");
        assert!(config.parallel_extract);
        assert!(config.extract_threads > 0);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "studyinfo_file = \"study.json\"\nparallel_extract = false\n").unwrap();

        let config = SorterConfig::load(&path).unwrap();
        assert_eq!(config.studyinfo_file, "study.json");
        assert!(!config.parallel_extract);
        assert!(config.rules_dir.ends_with("rulesets"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        let config = SorterConfig {
            rules_dir: temp.path().join("rules"),
            studyinfo_file: "info.json".to_string(),
            parallel_extract: true,
            extract_threads: 3,
        };

        config.save(&path).unwrap();
        assert_eq!(SorterConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "extract_threads = \"many\"\n").unwrap();
        assert!(matches!(SorterConfig::load(&path), Err(SortError::Config(_))));

        std::fs::write(&path, "unknown_key = 1\n").unwrap();
        assert!(matches!(SorterConfig::load(&path), Err(SortError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = SorterConfig::load_or_default(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.studyinfo_file, "studyinfo.json");
    }
}
