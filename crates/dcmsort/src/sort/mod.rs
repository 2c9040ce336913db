//! Sort engine - rule-driven sorting of scanned study files
//!
//! Scans a directory tree, extracts per-file metadata (file info, study info
//! and DICOM header), evaluates rule collections against the records and
//! applies filesystem actions for the collections whose requirements hold.

pub mod action;
pub mod compare;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod requirement;
pub mod rule;
pub mod scan_path;
pub mod scanner;
pub mod template;
pub mod types;
pub mod value_test;

// Re-exports for CLI usage
pub use action::ActionExecutor;
pub use engine::{ActionRecord, CollectionReport, CollectionStatus, RunReport, SortOptions, Sorter};
pub use error::{Result, SortError};
pub use extractor::{load_study_info, ExtractProgress, Extractor, DEFAULT_STUDYINFO_FILE};
pub use loader::{load_rule_file, load_rules_dir, CollectionLoad};
pub use requirement::Requirement;
pub use rule::{CollectionPass, RequirementOutcome, Rule, RuleDefinition, RuleSet};
pub use scan_path::{resolve_scan_root, ScanPathError};
pub use template::DestinationTemplate;
pub use types::{ActionKind, Lookup, MetadataRecord, Namespace, StudyInfo};
pub use value_test::ValueTest;
