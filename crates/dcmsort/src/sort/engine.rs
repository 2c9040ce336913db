//! Sort run orchestration.
//!
//! ```text
//! scan ──► extract ──► for each collection:
//!                         match records (first rule wins)
//!                         check requirements
//!                         all satisfied ──► apply actions in record order
//! ```
//!
//! Collections are independent. A collection that fails to load or misses a
//! requirement performs no actions; the others are unaffected.

use crate::sort::action::ActionExecutor;
use crate::sort::error::Result;
use crate::sort::extractor::{self, ExtractProgress, Extractor, DEFAULT_STUDYINFO_FILE};
use crate::sort::loader::CollectionLoad;
use crate::sort::rule::{CollectionPass, RequirementOutcome, RuleSet};
use crate::sort::scanner;
use crate::sort::types::{ActionKind, MetadataRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SortOptions {
    pub studyinfo_file: String,
    pub parallel_extract: bool,
    pub extract_threads: usize,
    /// Downgrade every action to `report`.
    pub dry_run: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            studyinfo_file: DEFAULT_STUDYINFO_FILE.to_string(),
            parallel_extract: false,
            extract_threads: 1,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Every requirement held and actions were applied.
    Committed,
    /// A requirement was not met; nothing was done.
    HeldBack,
    /// The rule file could not be loaded; nothing was done.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub rule: String,
    pub action: ActionKind,
    pub source: String,
    pub destination: String,
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub name: String,
    pub status: CollectionStatus,
    pub error: Option<String>,
    pub rules: Vec<RequirementOutcome>,
    pub matched: usize,
    pub unmatched: usize,
    pub actions: Vec<ActionRecord>,
}

impl CollectionReport {
    fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: CollectionStatus::Failed,
            error: Some(error),
            rules: Vec::new(),
            matched: 0,
            unmatched: 0,
            actions: Vec::new(),
        }
    }

    /// Rules whose requirement was not met.
    pub fn unmet(&self) -> impl Iterator<Item = &RequirementOutcome> {
        self.rules.iter().filter(|r| !r.satisfied)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub scan_root: String,
    pub output_root: String,
    pub isotime: String,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_recognized: usize,
    pub scan_issues: usize,
    pub collections: Vec<CollectionReport>,
}

impl RunReport {
    pub fn actions_applied(&self) -> usize {
        self.collections
            .iter()
            .flat_map(|c| &c.actions)
            .filter(|a| a.succeeded())
            .count()
    }

    pub fn actions_failed(&self) -> usize {
        self.collections
            .iter()
            .flat_map(|c| &c.actions)
            .filter(|a| !a.succeeded())
            .count()
    }
}

pub struct Sorter {
    options: SortOptions,
}

impl Sorter {
    pub fn new(options: SortOptions) -> Self {
        Self { options }
    }

    /// Scan `scan_root`, evaluate every collection and apply actions under
    /// `output_root`. Errors only if the scan root cannot be read.
    pub fn run(
        &self,
        scan_root: &Path,
        output_root: &Path,
        collections: &[CollectionLoad],
        progress_tx: Option<mpsc::Sender<ExtractProgress>>,
    ) -> Result<RunReport> {
        let scan = scanner::scan(scan_root)?;
        info!(
            root = %scan_root.display(),
            files = scan.files.len(),
            issues = scan.issues.len(),
            "Scanned input tree"
        );

        let study = extractor::load_study_info(scan_root, &self.options.studyinfo_file);
        let isotime = extractor::run_timestamp();
        let extractor = Extractor::new(scan_root, study, isotime.clone());
        let threads = if self.options.parallel_extract {
            self.options.extract_threads.max(1)
        } else {
            1
        };
        let records = extractor.extract_all(&scan.files, threads, progress_tx);
        let files_recognized = records.iter().filter(|r| r.recognized).count();

        let executor = ActionExecutor::new(output_root);
        let reports = collections
            .iter()
            .map(|load| match load {
                CollectionLoad::Loaded { ruleset, .. } => self.run_collection(ruleset, &records, &executor),
                CollectionLoad::Failed { name, error, .. } => {
                    warn!(collection = %name, error = %error, "Skipping collection that failed to load");
                    CollectionReport::failed(name, error.to_string())
                }
            })
            .collect();

        Ok(RunReport {
            scan_root: scan_root.display().to_string(),
            output_root: output_root.display().to_string(),
            isotime,
            dry_run: self.options.dry_run,
            files_scanned: records.len(),
            files_recognized,
            scan_issues: scan.issues.len(),
            collections: reports,
        })
    }

    /// Evaluate one collection and, if it passes, apply its actions.
    pub fn run_collection(
        &self,
        ruleset: &RuleSet,
        records: &[MetadataRecord],
        executor: &ActionExecutor,
    ) -> CollectionReport {
        let pass = ruleset.evaluate(records);
        let rules = pass.requirement_outcomes();
        let mut report = CollectionReport {
            name: ruleset.name().to_string(),
            status: CollectionStatus::HeldBack,
            error: None,
            rules,
            matched: pass.assignments().len(),
            unmatched: pass.unmatched(),
            actions: Vec::new(),
        };

        if !pass.passed() {
            for unmet in report.unmet() {
                info!(
                    collection = %report.name,
                    rule = %unmet.rule,
                    matches = unmet.matches,
                    requirement = unmet.requirement.as_deref().unwrap_or(""),
                    "Requirement not met, collection held back"
                );
            }
            return report;
        }

        report.actions = self.apply_actions(&pass, records, executor);
        report.status = CollectionStatus::Committed;
        info!(
            collection = %report.name,
            matched = report.matched,
            failed = report.actions.iter().filter(|a| !a.succeeded()).count(),
            "Collection committed"
        );
        report
    }

    fn apply_actions(
        &self,
        pass: &CollectionPass<'_>,
        records: &[MetadataRecord],
        executor: &ActionExecutor,
    ) -> Vec<ActionRecord> {
        let rules = pass.ruleset().rules();
        pass.assignments()
            .iter()
            .map(|assignment| {
                let rule = &rules[assignment.rule];
                let action = if self.options.dry_run {
                    ActionKind::Report
                } else {
                    rule.action()
                };
                let source = PathBuf::from(records[assignment.record].abspath());

                let (destination, error) = match executor.apply(action, &source, &assignment.destination) {
                    Ok(path) => (path.display().to_string(), None),
                    Err(err) => {
                        warn!(
                            action = %action,
                            source = %source.display(),
                            error = %err,
                            "Action failed"
                        );
                        (assignment.destination.clone(), Some(err.to_string()))
                    }
                };

                ActionRecord {
                    rule: rule.name().to_string(),
                    action,
                    source: source.display().to_string(),
                    destination,
                    error,
                }
            })
            .collect()
    }
}
