//! Object name patterns shared by ignore rules and dependency queries.

use crate::error::{CoreError, CoreResult};
use regex::{Regex, RegexBuilder};

/// A literal or regular-expression name pattern.
///
/// A pattern is tested against both the qualified name (`public.orders`)
/// and the simple name (`orders`) of an object and matches if either does.
#[derive(Debug, Clone)]
pub enum NamePattern {
    /// `*`: every name
    Any,
    /// Exact name comparison
    Literal {
        text: String,
        case_insensitive: bool,
    },
    /// Anchored regular expression (full match)
    Regex(Regex),
}

impl NamePattern {
    /// Literal pattern; `*` alone matches everything.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == "*" {
            NamePattern::Any
        } else {
            NamePattern::Literal {
                text,
                case_insensitive: false,
            }
        }
    }

    /// Literal pattern compared without regard to ASCII case.
    pub fn literal_ci(text: impl Into<String>) -> Self {
        match Self::literal(text) {
            NamePattern::Literal { text, .. } => NamePattern::Literal {
                text,
                case_insensitive: true,
            },
            other => other,
        }
    }

    /// Compile a regular expression that must match the whole name.
    pub fn regex(source: &str, case_insensitive: bool) -> CoreResult<Self> {
        let malformed = |e: regex::Error| CoreError::MalformedRule {
            line: 0,
            rule: source.to_string(),
            reason: e.to_string(),
        };
        // Must compile on its own, or it could close the anchoring group
        Regex::new(source).map_err(malformed)?;
        RegexBuilder::new(&format!("^(?:{})$", source))
            .case_insensitive(case_insensitive)
            .build()
            .map(NamePattern::Regex)
            .map_err(malformed)
    }

    /// Test a qualified name (and its simple-name tail).
    pub fn matches(&self, qualified_name: &str) -> bool {
        let simple = simple_name(qualified_name);
        self.matches_one(qualified_name) || (simple != qualified_name && self.matches_one(simple))
    }

    fn matches_one(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Literal {
                text,
                case_insensitive: true,
            } => text.eq_ignore_ascii_case(name),
            NamePattern::Literal { text, .. } => text == name,
            NamePattern::Regex(re) => re.is_match(name),
        }
    }
}

/// Last dotted segment of a qualified name, ignoring dots inside a
/// function signature.
pub fn simple_name(qualified_name: &str) -> &str {
    let head_len = qualified_name
        .find('(')
        .unwrap_or(qualified_name.len());
    match qualified_name[..head_len].rfind('.') {
        Some(pos) => &qualified_name[pos + 1..],
        None => qualified_name,
    }
}


#[cfg(test)]
#[path = "pattern_test.rs"]
mod pattern_tests;
