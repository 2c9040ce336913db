//! Core types for the sort engine

use dcmsort_header::{tag_for_keyword, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Study-wide values loaded from the study info file. Shared by every record
/// of a run.
pub type StudyInfo = BTreeMap<String, String>;

/// fileinfo keys always present on a record.
pub mod fileinfo {
    pub const FILENAME: &str = "filename";
    pub const ABSPATH: &str = "abspath";
    pub const RELPATH: &str = "relpath";
    pub const ISOTIME: &str = "isotime";
    pub const STEM: &str = "stem";
    pub const EXT: &str = "ext";

    /// `relpath0` is the innermost directory of `relpath`, `relpath1` its
    /// parent, and so on.
    pub fn relpath_component(index: usize) -> String {
        format!("{}{}", RELPATH, index)
    }
}

// ============================================================================
// Namespace
// ============================================================================

/// The three sources a value can be looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    StudyInfo,
    FileInfo,
    Header,
}

impl Namespace {
    /// Parse a descriptor source name. `dicom` is accepted for `header`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "studyinfo" => Some(Self::StudyInfo),
            "fileinfo" => Some(Self::FileInfo),
            "header" | "dicom" => Some(Self::Header),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudyInfo => "studyinfo",
            Self::FileInfo => "fileinfo",
            Self::Header => "header",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Actions
// ============================================================================

/// What happens to a matched file once its collection passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    #[default]
    #[serde(alias = "mv")]
    Move,
    #[serde(alias = "cp")]
    Copy,
    #[serde(alias = "ln", alias = "symlink")]
    Link,
    #[serde(alias = "rm")]
    Delete,
    #[serde(alias = "tst", alias = "test")]
    Report,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Link => "link",
            Self::Delete => "delete",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metadata record
// ============================================================================

/// Result of a template placeholder lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(Namespace, &'a str),
    NotFound,
}

/// Everything known about one scanned file.
///
/// `header` is empty when the file could not be read as DICOM; header lookups
/// then yield the empty string instead of failing.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    pub fileinfo: BTreeMap<String, String>,
    pub studyinfo: Arc<StudyInfo>,
    pub header: BTreeMap<Tag, String>,
    pub recognized: bool,
}

impl MetadataRecord {
    pub fn abspath(&self) -> &str {
        self.fileinfo_value(fileinfo::ABSPATH).unwrap_or_default()
    }

    pub fn relpath(&self) -> &str {
        self.fileinfo_value(fileinfo::RELPATH).unwrap_or_default()
    }

    pub fn fileinfo_value(&self, key: &str) -> Option<&str> {
        self.fileinfo.get(key).map(String::as_str)
    }

    pub fn studyinfo_value(&self, key: &str) -> Option<&str> {
        self.studyinfo.get(key).map(String::as_str)
    }

    /// Header value for `tag`, or `""` if the element is absent or the file
    /// is not DICOM.
    pub fn header_value(&self, tag: Tag) -> &str {
        self.header.get(&tag).map(String::as_str).unwrap_or("")
    }

    /// Resolve a template placeholder: studyinfo, then fileinfo, then header
    /// keyword.
    pub fn lookup(&self, key: &str) -> Lookup<'_> {
        if let Some(value) = self.studyinfo_value(key) {
            return Lookup::Found(Namespace::StudyInfo, value);
        }
        if let Some(value) = self.fileinfo_value(key) {
            return Lookup::Found(Namespace::FileInfo, value);
        }
        if let Some(value) = tag_for_keyword(key).and_then(|tag| self.header.get(&tag)) {
            return Lookup::Found(Namespace::Header, value.as_str());
        }
        Lookup::NotFound
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_namespace_parse() {
        assert_eq!(Namespace::parse("header"), Some(Namespace::Header));
        assert_eq!(Namespace::parse("dicom"), Some(Namespace::Header));
        assert_eq!(Namespace::parse("fileinfo"), Some(Namespace::FileInfo));
        assert_eq!(Namespace::parse("Header"), None);
    }

    #[test]
    fn test_action_aliases() {
        let parsed: Vec<ActionKind> =
            serde_json::from_str(r#"["mv", "cp", "ln", "rm", "tst", "report"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                ActionKind::Move,
                ActionKind::Copy,
                ActionKind::Link,
                ActionKind::Delete,
                ActionKind::Report,
                ActionKind::Report,
            ]
        );
        assert_eq!(ActionKind::default(), ActionKind::Move);
    }

    #[test]
    fn test_lookup_priority() {
        let rec = record(
            &[("filename", "a.dcm"), ("PatientID", "from-fileinfo")],
            &[("PatientID", "from-study")],
            &[("PatientID", "from-header"), ("Modality", "NM")],
        );

        assert_eq!(
            rec.lookup("PatientID"),
            Lookup::Found(Namespace::StudyInfo, "from-study")
        );
        assert_eq!(rec.lookup("filename"), Lookup::Found(Namespace::FileInfo, "a.dcm"));
        assert_eq!(rec.lookup("Modality"), Lookup::Found(Namespace::Header, "NM"));
        assert_eq!(rec.lookup("SeriesNumber"), Lookup::NotFound);
        assert_eq!(rec.lookup("nonsense"), Lookup::NotFound);
    }

    #[test]
    fn test_header_value_defaults_to_empty() {
        let rec = record(&[], &[], &[]);
        assert!(!rec.recognized);
        assert_eq!(rec.header_value(Tag::new(0x0020, 0x0011)), "");
    }
}
