//! Rules, rule collections and per-pass matching state.

use crate::sort::error::Result;
use crate::sort::requirement::Requirement;
use crate::sort::template::DestinationTemplate;
use crate::sort::types::{ActionKind, MetadataRecord};
use crate::sort::value_test::ValueTest;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RULE_NAME: &str = "default";
pub const DEFAULT_DESTINATION: &str = "{name}/{filename}{ext}";

fn default_name() -> String {
    DEFAULT_RULE_NAME.to_string()
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

/// A rule as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_destination")]
    pub destination: String,

    #[serde(default)]
    pub action: ActionKind,

    #[serde(default)]
    pub tests: Vec<String>,

    #[serde(default)]
    pub requirement: Option<String>,
}

impl Default for RuleDefinition {
    fn default() -> Self {
        Self {
            name: default_name(),
            destination: default_destination(),
            action: ActionKind::default(),
            tests: Vec::new(),
            requirement: None,
        }
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    destination: DestinationTemplate,
    action: ActionKind,
    tests: Vec<ValueTest>,
    requirement: Option<Requirement>,
}

impl Rule {
    /// Compile a definition. Fails on a malformed descriptor, pattern or
    /// requirement.
    pub fn from_definition(def: &RuleDefinition) -> Result<Self> {
        let tests = def
            .tests
            .iter()
            .map(|t| ValueTest::parse(t))
            .collect::<Result<Vec<_>>>()?;
        let requirement = match &def.requirement {
            Some(expr) => Requirement::parse(expr)?,
            None => None,
        };

        Ok(Self {
            name: def.name.clone(),
            destination: DestinationTemplate::parse(&def.destination),
            action: def.action,
            tests,
            requirement,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &DestinationTemplate {
        &self.destination
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn tests(&self) -> &[ValueTest] {
        &self.tests
    }

    pub fn requirement(&self) -> Option<&Requirement> {
        self.requirement.as_ref()
    }

    /// True if every test passes. Stops at the first failing test, so later
    /// tests are not evaluated. A rule without tests matches every record.
    pub fn matches(&self, record: &MetadataRecord) -> bool {
        self.tests.iter().all(|test| test.evaluate(record))
    }
}

/// An ordered collection of rules, loaded from one rule file.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    pub fn from_definitions(name: impl Into<String>, defs: &[RuleDefinition]) -> Result<Self> {
        let rules = defs
            .iter()
            .map(Rule::from_definition)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, rules))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run one matching pass over all records.
    pub fn evaluate(&self, records: &[MetadataRecord]) -> CollectionPass<'_> {
        let mut pass = CollectionPass::new(self);
        for (index, record) in records.iter().enumerate() {
            pass.test_record(index, record);
        }
        pass
    }
}

/// A record matched to a rule, with its resolved destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub record: usize,
    pub rule: usize,
    pub destination: String,
}

/// Requirement check for one rule after a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementOutcome {
    pub rule: String,
    pub matches: usize,
    pub requirement: Option<String>,
    pub satisfied: bool,
}

/// Mutable state of one pass of a rule set over a record list: match counts
/// and record assignments. Rules themselves stay immutable, so a rule set can
/// be evaluated any number of times.
#[derive(Debug)]
pub struct CollectionPass<'a> {
    ruleset: &'a RuleSet,
    match_counts: Vec<usize>,
    assignments: Vec<Assignment>,
    unmatched: usize,
}

impl<'a> CollectionPass<'a> {
    pub fn new(ruleset: &'a RuleSet) -> Self {
        Self {
            ruleset,
            match_counts: vec![0; ruleset.rules.len()],
            assignments: Vec::new(),
            unmatched: 0,
        }
    }

    /// Test one record against the rules in order. The first matching rule
    /// takes the record; later rules never see it. Returns the index of the
    /// matching rule.
    pub fn test_record(&mut self, index: usize, record: &MetadataRecord) -> Option<usize> {
        for (rule_index, rule) in self.ruleset.rules.iter().enumerate() {
            if rule.matches(record) {
                self.match_counts[rule_index] += 1;
                self.assignments.push(Assignment {
                    record: index,
                    rule: rule_index,
                    destination: rule.destination.resolve(record),
                });
                return Some(rule_index);
            }
        }
        self.unmatched += 1;
        None
    }

    pub fn ruleset(&self) -> &'a RuleSet {
        self.ruleset
    }

    pub fn match_count(&self, rule_index: usize) -> usize {
        self.match_counts.get(rule_index).copied().unwrap_or(0)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    pub fn requirement_outcomes(&self) -> Vec<RequirementOutcome> {
        self.ruleset
            .rules
            .iter()
            .zip(&self.match_counts)
            .map(|(rule, &matches)| RequirementOutcome {
                rule: rule.name.clone(),
                matches,
                requirement: rule.requirement.map(|r| r.to_string()),
                satisfied: rule.requirement.map_or(true, |r| r.is_satisfied(matches)),
            })
            .collect()
    }

    /// True when every rule's requirement holds.
    pub fn passed(&self) -> bool {
        self.ruleset
            .rules
            .iter()
            .zip(&self.match_counts)
            .all(|(rule, &matches)| rule.requirement.map_or(true, |r| r.is_satisfied(matches)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::error::SortError;
    use crate::sort::types::test_support::record;

    fn create_test_rule(name: &str, tests: &[&str], requirement: Option<&str>) -> RuleDefinition {
        RuleDefinition {
            name: name.to_string(),
            destination: "{name}/{SeriesNumber}/{filename}".to_string(),
            tests: tests.iter().map(|t| t.to_string()).collect(),
            requirement: requirement.map(String::from),
            ..Default::default()
        }
    }

    fn series(n: &str, file: &str) -> MetadataRecord {
        record(
            &[("filename", file), ("relpath", "")],
            &[("name", "PAT")],
            &[("SeriesNumber", n)],
        )
    }

    #[test]
    fn test_definition_defaults() {
        let def: RuleDefinition = serde_json::from_str("{}").unwrap();
        assert_eq!(def.name, "default");
        assert_eq!(def.destination, "{name}/{filename}{ext}");
        assert_eq!(def.action, ActionKind::Move);
        assert!(def.tests.is_empty());
        assert!(def.requirement.is_none());
    }

    #[test]
    fn test_definition_rejects_unknown_fields() {
        let result: std::result::Result<RuleDefinition, _> =
            serde_json::from_str(r#"{"name": "x", "destinaton": "typo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let ruleset = RuleSet::from_definitions(
            "series",
            &[
                create_test_rule("small", &["header(0020,0011):numeric(<5)"], None),
                create_test_rule("any", &["header(0020,0011):numeric(>=0)"], None),
            ],
        )
        .unwrap();

        let records = vec![series("1", "a"), series("7", "b"), series("3", "c")];
        let pass = ruleset.evaluate(&records);

        assert_eq!(pass.match_count(0), 2);
        assert_eq!(pass.match_count(1), 1);
        let rules: Vec<usize> = pass.assignments().iter().map(|a| a.rule).collect();
        assert_eq!(rules, vec![0, 1, 0]);
        assert_eq!(pass.assignments()[1].destination, "PAT/7/b");
    }

    #[test]
    fn test_requirement_gate() {
        let ruleset = RuleSet::from_definitions(
            "pair",
            &[create_test_rule("series", &["header(0020,0011):numeric(>0)"], Some("n=2"))],
        )
        .unwrap();

        let two = vec![series("1", "a"), series("2", "b")];
        let pass = ruleset.evaluate(&two);
        assert!(pass.passed());

        let one = vec![series("1", "a"), series("", "b")];
        let pass = ruleset.evaluate(&one);
        assert!(!pass.passed());
        assert_eq!(pass.unmatched(), 1);
        let outcomes = pass.requirement_outcomes();
        assert_eq!(
            outcomes,
            vec![RequirementOutcome {
                rule: "series".to_string(),
                matches: 1,
                requirement: Some("n=2".to_string()),
                satisfied: false,
            }]
        );
    }

    #[test]
    fn test_passes_are_independent() {
        let ruleset = RuleSet::from_definitions(
            "once",
            &[create_test_rule("one", &["header(0020,0011):numeric(=1)"], Some("n=1"))],
        )
        .unwrap();
        let records = vec![series("1", "a")];

        for _ in 0..3 {
            let pass = ruleset.evaluate(&records);
            assert_eq!(pass.match_count(0), 1);
            assert!(pass.passed());
        }
    }

    #[test]
    fn test_rule_without_tests_matches_everything() {
        let rule = Rule::from_definition(&RuleDefinition::default()).unwrap();
        assert!(rule.matches(&record(&[], &[], &[])));
    }

    #[test]
    fn test_absent_key_only_skips_record() {
        let ruleset = RuleSet::from_definitions(
            "folders",
            &[create_test_rule("nm", &["fileinfo(relpath0):pattern(NM_)"], Some("n=1"))],
        )
        .unwrap();
        let records = vec![
            record(&[("filename", "studyinfo.json"), ("relpath", "")], &[], &[]),
            record(&[("filename", "a"), ("relpath", "NM_WB"), ("relpath0", "NM_WB")], &[], &[]),
        ];

        let pass = ruleset.evaluate(&records);
        assert_eq!(pass.match_count(0), 1);
        assert_eq!(pass.unmatched(), 1);
        assert_eq!(pass.assignments()[0].record, 1);
        assert!(pass.passed());
    }

    #[test]
    fn test_compile_errors() {
        let bad_requirement = create_test_rule("r", &[], Some("two"));
        assert!(matches!(
            Rule::from_definition(&bad_requirement),
            Err(SortError::Requirement(_))
        ));

        let bad_test = create_test_rule("r", &["header(zz):numeric(=1)"], None);
        assert!(matches!(
            Rule::from_definition(&bad_test),
            Err(SortError::Descriptor { .. })
        ));
    }
}
