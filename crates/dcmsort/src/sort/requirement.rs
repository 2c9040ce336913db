//! Per-rule match-count requirements such as `n=2` or `n>=1`.

use crate::sort::compare::CompareOp;
use crate::sort::error::{Result, SortError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^n\s*(<=|>=|==|<|>|=)\s*(\d+)$").unwrap());

/// Constraint on how many records a rule must match in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    op: CompareOp,
    count: usize,
}

impl Requirement {
    pub fn new(op: CompareOp, count: usize) -> Self {
        Self { op, count }
    }

    /// Parse a requirement expression. An empty expression means the rule
    /// has no requirement.
    pub fn parse(expr: &str) -> Result<Option<Self>> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(None);
        }

        let caps = REQUIREMENT
            .captures(expr)
            .ok_or_else(|| SortError::Requirement(expr.to_string()))?;
        let op = CompareOp::parse(&caps[1]).ok_or_else(|| SortError::Requirement(expr.to_string()))?;
        let count = caps[2]
            .parse()
            .map_err(|_| SortError::Requirement(expr.to_string()))?;
        Ok(Some(Self { op, count }))
    }

    pub fn is_satisfied(&self, match_count: usize) -> bool {
        self.op.compare(match_count, self.count)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}{}", self.op, self.count)
    }
}
