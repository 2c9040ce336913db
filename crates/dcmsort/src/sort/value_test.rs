//! Value tests: predicates over one field of a metadata record.
//!
//! Descriptor syntax is `<source>(<field>):<kind>(<param>)`:
//!
//! ```text
//! header(0020,0011):numeric(>=2)
//! fileinfo(relpath1):pattern(NM_)
//! studyinfo(anonymize):boolean()
//! ```
//!
//! `header` fields are a `gggg,eeee` tag (hex, optional `0x`) or a dictionary
//! keyword. Header values of unrecognized files read as the empty string. A
//! fileinfo/studyinfo key the record does not carry (`relpath2` on a shallow
//! file, say) fails the test.

use crate::sort::compare::CompareOp;
use crate::sort::error::{Result, SortError};
use crate::sort::types::{MetadataRecord, Namespace};
use dcmsort_header::{tag_for_keyword, Tag};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static DESCRIPTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+)\(([\w,]+)\)\s*:\s*(\w+)\((.*)\)\s*$").unwrap());
static NUMERIC_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(<=|>=|==|<|>|=)\s*(-?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)\s*$").unwrap()
});

/// Values read as true by boolean tests, compared case-insensitively.
const TRUE_VALUES: &[&str] = &["true", "1", "yes"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Header(Tag),
    FileInfo(String),
    StudyInfo(String),
}

impl Field {
    pub fn namespace(&self) -> Namespace {
        match self {
            Field::Header(_) => Namespace::Header,
            Field::FileInfo(_) => Namespace::FileInfo,
            Field::StudyInfo(_) => Namespace::StudyInfo,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TestKind {
    Boolean,
    /// Anchored at the start of the value only.
    Pattern(Regex),
    Numeric { op: CompareOp, operand: f64 },
}

/// A compiled value test.
#[derive(Debug, Clone)]
pub struct ValueTest {
    descriptor: String,
    field: Field,
    kind: TestKind,
}

impl ValueTest {
    /// Compile a descriptor string.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let invalid = |reason: String| SortError::Descriptor {
            descriptor: descriptor.to_string(),
            reason,
        };

        let caps = DESCRIPTOR
            .captures(descriptor)
            .ok_or_else(|| invalid("expected <source>(<field>):<kind>(<param>)".to_string()))?;
        let (source, field_name, kind_name, param) = (&caps[1], &caps[2], &caps[3], &caps[4]);

        let namespace =
            Namespace::parse(source).ok_or_else(|| invalid(format!("unknown source '{}'", source)))?;
        let field = match namespace {
            Namespace::Header => Field::Header(
                Tag::parse(field_name)
                    .ok()
                    .or_else(|| tag_for_keyword(field_name))
                    .ok_or_else(|| invalid(format!("'{}' is neither a tag nor a known keyword", field_name)))?,
            ),
            Namespace::FileInfo => Field::FileInfo(field_name.to_string()),
            Namespace::StudyInfo => Field::StudyInfo(field_name.to_string()),
        };

        let kind = match kind_name {
            "boolean" | "bool" => TestKind::Boolean,
            "pattern" | "regex" => {
                let anchored = format!("^(?:{})", param);
                TestKind::Pattern(Regex::new(&anchored).map_err(|e| SortError::Pattern {
                    pattern: param.to_string(),
                    reason: e.to_string(),
                })?)
            }
            "numeric" | "math" => {
                let num = NUMERIC_PARAM
                    .captures(param)
                    .ok_or_else(|| invalid(format!("numeric parameter '{}' is not <op><number>", param)))?;
                let op = CompareOp::parse(&num[1])
                    .ok_or_else(|| invalid(format!("unknown operator '{}'", &num[1])))?;
                let operand = num[2]
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a number", &num[2])))?;
                TestKind::Numeric { op, operand }
            }
            other => return Err(invalid(format!("unknown test kind '{}'", other))),
        };

        Ok(Self {
            descriptor: descriptor.trim().to_string(),
            field,
            kind,
        })
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Evaluate against one record.
    pub fn evaluate(&self, record: &MetadataRecord) -> bool {
        let Some(value) = self.field_value(record) else {
            debug!(test = %self.descriptor, path = record.abspath(), "Field absent, test fails");
            return false;
        };
        match &self.kind {
            TestKind::Boolean => {
                let value = value.trim();
                TRUE_VALUES.iter().any(|t| value.eq_ignore_ascii_case(t))
            }
            TestKind::Pattern(regex) => regex.is_match(value),
            TestKind::Numeric { op, operand } => match first_value(value).trim().parse::<f64>() {
                Ok(number) => op.compare(number, *operand),
                Err(_) => false,
            },
        }
    }

    fn field_value<'a>(&self, record: &'a MetadataRecord) -> Option<&'a str> {
        match &self.field {
            Field::Header(tag) => Some(record.header_value(*tag)),
            Field::FileInfo(key) => record.fileinfo_value(key),
            Field::StudyInfo(key) => record.studyinfo_value(key),
        }
    }
}

/// First component of a backslash-separated multi-value.
fn first_value(value: &str) -> &str {
    value.split('\\').next().unwrap_or(value)
}

impl fmt::Display for ValueTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::types::test_support::record;

    fn eval(descriptor: &str, rec: &MetadataRecord) -> bool {
        ValueTest::parse(descriptor).unwrap().evaluate(rec)
    }

    #[test]
    fn test_parse_header_field_forms() {
        for descriptor in [
            "header(0020,0011):numeric(=1)",
            "header(0x0020,0x0011):numeric(=1)",
            "dicom(0020,0011):math(=1)",
            "header(SeriesNumber):numeric(=1)",
        ] {
            let test = ValueTest::parse(descriptor).unwrap();
            assert_eq!(test.field(), &Field::Header(Tag::new(0x0020, 0x0011)), "{}", descriptor);
        }
    }

    #[test]
    fn test_parse_errors() {
        for descriptor in [
            "header(0020,0011)",
            "pixels(0020,0011):numeric(=1)",
            "header(NotAKeyword):numeric(=1)",
            "header(0020,0011):fuzzy(abc)",
            "header(0020,0011):numeric(about 3)",
            "header(0020,0011):numeric(!=3)",
        ] {
            assert!(
                matches!(ValueTest::parse(descriptor), Err(SortError::Descriptor { .. })),
                "{} should fail",
                descriptor
            );
        }
        assert!(matches!(
            ValueTest::parse("fileinfo(filename):pattern(([)"),
            Err(SortError::Pattern { .. })
        ));
    }

    #[test]
    fn test_numeric() {
        let rec = record(&[], &[], &[("SeriesNumber", " 2 "), ("SliceThickness", "4.42")]);
        assert!(eval("header(0020,0011):numeric(=2)", &rec));
        assert!(eval("header(0020,0011):numeric(>1)", &rec));
        assert!(!eval("header(0020,0011):numeric(<2)", &rec));
        assert!(eval("header(0018,0050):numeric(>=4.4)", &rec));
        assert!(eval("header(0018,0050):numeric(<=4.5)", &rec));
        assert!(eval("header(0018,0050):numeric(>-1)", &rec));
    }

    #[test]
    fn test_numeric_non_number_is_false() {
        let rec = record(&[], &[], &[("SeriesDescription", "WB SPECT")]);
        assert!(!eval("header(0008,103E):numeric(>0)", &rec));
        // Absent element reads as "".
        assert!(!eval("header(0020,0011):numeric(>=0)", &rec));
    }

    #[test]
    fn test_numeric_uses_first_of_multi_value() {
        let rec = record(&[], &[], &[("PixelSpacing", "1.5\\2.5")]);
        assert!(eval("header(0028,0030):numeric(=1.5)", &rec));
        assert!(!eval("header(0028,0030):numeric(>2)", &rec));
    }

    #[test]
    fn test_unrecognized_file_reads_empty() {
        let rec = record(&[("filename", "notes.txt")], &[], &[]);
        assert!(!eval("header(0020,0011):numeric(=2)", &rec));
        assert!(eval("header(0008,0060):pattern()", &rec));
        assert!(!eval("header(0008,0060):pattern(NM)", &rec));
    }

    #[test]
    fn test_pattern_anchored_at_start_only() {
        let rec = record(&[("relpath1", "NM_WB_SPECT")], &[], &[]);
        assert!(eval("fileinfo(relpath1):pattern(NM_)", &rec));
        assert!(eval("fileinfo(relpath1):regex(NM_.*SPECT)", &rec));
        assert!(!eval("fileinfo(relpath1):pattern(WB)", &rec));
        assert!(eval("fileinfo(relpath1):pattern(CT|NM)", &rec));
    }

    #[test]
    fn test_boolean() {
        let rec = record(
            &[],
            &[("a", "True"), ("b", " yes "), ("c", "1"), ("d", "false"), ("e", "0"), ("f", "")],
            &[],
        );
        assert!(eval("studyinfo(a):boolean()", &rec));
        assert!(eval("studyinfo(b):bool()", &rec));
        assert!(eval("studyinfo(c):boolean()", &rec));
        assert!(!eval("studyinfo(d):boolean()", &rec));
        assert!(!eval("studyinfo(e):boolean()", &rec));
        assert!(!eval("studyinfo(f):boolean()", &rec));
    }

    #[test]
    fn test_absent_key_fails_test() {
        let rec = record(&[("filename", "a"), ("relpath", "")], &[], &[]);
        assert!(!eval("fileinfo(relpath0):pattern()", &rec));
        assert!(!eval("fileinfo(relpath3):pattern(.*)", &rec));
        assert!(!eval("studyinfo(site):pattern()", &rec));
        assert!(!eval("studyinfo(anonymize):boolean()", &rec));
        assert!(eval("fileinfo(relpath):pattern()", &rec));
    }
}
