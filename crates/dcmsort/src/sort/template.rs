//! Destination templates.
//!
//! A template is literal text with `{name}` or `{name:hint}` placeholders.
//! Placeholders resolve through [`MetadataRecord::lookup`]; names found in no
//! namespace render as `None`. The only hint with an effect is the integer
//! format `[0][width]d`, applied when the value parses as an integer.

use crate::sort::types::{Lookup, MetadataRecord};
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)(?::(\w+))?$").unwrap());
static INTEGER_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(0?)(\d*)d$").unwrap());

/// Rendered in place of a placeholder no namespace defines.
pub const MISSING_VALUE: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, hint: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl DestinationTemplate {
    /// Split a template into literals and placeholders. Braces that do not
    /// enclose a valid placeholder are kept as literal text.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let placeholder = after.find('}').and_then(|close| {
                PLACEHOLDER
                    .captures(&after[..close])
                    .map(|caps| (close, caps[1].to_string(), caps.get(2).map(|m| m.as_str().to_string())))
            });

            match placeholder {
                Some((close, name, hint)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder { name, hint });
                    rest = &after[close + 1..];
                }
                None => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template for one record.
    pub fn resolve(&self, record: &MetadataRecord) -> String {
        let mut out = String::with_capacity(self.raw.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, hint } => match record.lookup(name) {
                    Lookup::Found(_, value) => out.push_str(&apply_hint(value, hint.as_deref())),
                    Lookup::NotFound => out.push_str(MISSING_VALUE),
                },
            }
        }
        out
    }
}

fn apply_hint(value: &str, hint: Option<&str>) -> String {
    let Some(caps) = hint.and_then(|h| INTEGER_HINT.captures(h)) else {
        return value.to_string();
    };
    let Ok(number) = value.trim().parse::<i64>() else {
        return value.to_string();
    };

    let zero_pad = !caps[1].is_empty();
    let width: usize = caps[2].parse().unwrap_or(0);
    if zero_pad {
        format!("{:0width$}", number, width = width)
    } else {
        format!("{:>width$}", number, width = width)
    }
}
