//! Ignore rules: which objects take part in a diff.
//!
//! Rules are evaluated in list order and the first matching rule decides.
//! When nothing matches, the list's default polarity applies: a black list
//! (`SHOW ALL`) includes, a white list (`HIDE ALL`) excludes.
//!
//! Rule file syntax, one rule per line:
//!
//! ```text
//! # comment
//! HIDE ALL
//! SHOW REGEX tmp_.* TABLE,VIEW
//! SHOW CONTENT "public.audit log" TABLE
//! HIDE orders
//! ```

use crate::error::{CoreError, CoreResult};
use crate::kind::ObjectKind;
use crate::pattern::NamePattern;
use std::collections::BTreeSet;
use std::path::Path;

/// Outcome of classifying one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Include,
    Exclude,
    /// Visible, but changes inside the object are not diffed
    ExcludeContent,
}

/// One ordered rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: NamePattern,
    /// Kinds the rule applies to; empty means every kind
    pub kinds: BTreeSet<ObjectKind>,
    pub show: bool,
    pub ignore_content: bool,
}

impl IgnoreRule {
    pub fn show(pattern: NamePattern) -> Self {
        Self {
            pattern,
            kinds: BTreeSet::new(),
            show: true,
            ignore_content: false,
        }
    }

    pub fn hide(pattern: NamePattern) -> Self {
        Self {
            show: false,
            ..Self::show(pattern)
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ObjectKind>) -> Self {
        self.kinds.extend(kinds);
        self
    }

    pub fn content_only(mut self) -> Self {
        self.ignore_content = true;
        self
    }

    pub fn matches(&self, kind: ObjectKind, qualified_name: &str) -> bool {
        (self.kinds.is_empty() || self.kinds.contains(&kind)) && self.pattern.matches(qualified_name)
    }

    fn verdict(&self) -> Verdict {
        match (self.show, self.ignore_content) {
            (true, true) => Verdict::ExcludeContent,
            (true, false) => Verdict::Include,
            (false, _) => Verdict::Exclude,
        }
    }
}

/// Ordered rule list with a default polarity.
#[derive(Debug, Clone)]
pub struct IgnoreList {
    show_by_default: bool,
    rules: Vec<IgnoreRule>,
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::black()
    }
}

impl IgnoreList {
    pub fn new(show_by_default: bool) -> Self {
        Self {
            show_by_default,
            rules: Vec::new(),
        }
    }

    /// Everything is shown unless a rule hides it.
    pub fn black() -> Self {
        Self::new(true)
    }

    /// Everything is hidden unless a rule shows it.
    pub fn white() -> Self {
        Self::new(false)
    }

    pub fn is_show_by_default(&self) -> bool {
        self.show_by_default
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn push(&mut self, rule: IgnoreRule) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: IgnoreRule) -> Self {
        self.push(rule);
        self
    }

    /// First matching rule wins; otherwise the list default.
    pub fn classify(&self, kind: ObjectKind, qualified_name: &str) -> Verdict {
        self.rules
            .iter()
            .find(|rule| rule.matches(kind, qualified_name))
            .map(IgnoreRule::verdict)
            .unwrap_or(if self.show_by_default {
                Verdict::Include
            } else {
                Verdict::Exclude
            })
    }

    /// Parse the rule language. Literal and regex names are case-sensitive.
    pub fn parse(text: &str) -> CoreResult<Self> {
        Self::parse_with_case(text, false)
    }

    /// Parse the rule language, optionally matching names case-insensitively.
    pub fn parse_with_case(text: &str, case_insensitive: bool) -> CoreResult<Self> {
        let mut list = IgnoreList::black();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = |reason: String| CoreError::MalformedRule {
                line: line_no,
                rule: line.to_string(),
                reason,
            };

            let tokens = tokenize(line).map_err(malformed)?;
            let mut tokens = tokens.into_iter();
            let show = match tokens.next() {
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("SHOW") => true,
                Some(Token::Word(w)) if w.eq_ignore_ascii_case("HIDE") => false,
                _ => return Err(malformed("expected SHOW or HIDE".to_string())),
            };

            let mut regex = false;
            let mut content = false;
            let mut pattern_token = None;
            for token in tokens.by_ref() {
                match token {
                    Token::Word(w) if w.eq_ignore_ascii_case("REGEX") => regex = true,
                    Token::Word(w) if w.eq_ignore_ascii_case("CONTENT") => content = true,
                    other => {
                        pattern_token = Some(other);
                        break;
                    }
                }
            }
            let Some(pattern_token) = pattern_token else {
                return Err(malformed("missing name pattern".to_string()));
            };

            let kinds_text: Vec<String> = tokens.map(Token::into_text).collect();

            if let Token::Word(w) = &pattern_token {
                if w.eq_ignore_ascii_case("ALL") && !regex && !content && kinds_text.is_empty() {
                    if !list.rules.is_empty() {
                        return Err(malformed(
                            "SHOW ALL / HIDE ALL must precede every rule".to_string(),
                        ));
                    }
                    list.show_by_default = show;
                    continue;
                }
            }

            let source = pattern_token.into_text();
            let pattern = if regex {
                NamePattern::regex(&source, case_insensitive).map_err(|e| match e {
                    CoreError::MalformedRule { reason, .. } => malformed(reason),
                    other => other,
                })?
            } else if case_insensitive {
                NamePattern::literal_ci(source)
            } else {
                NamePattern::literal(source)
            };

            let mut kinds = BTreeSet::new();
            for part in kinds_text.iter().flat_map(|t| t.split(',')) {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let kind = part
                    .parse::<ObjectKind>()
                    .map_err(|_| malformed(format!("unknown object kind '{}'", part)))?;
                kinds.insert(kind);
            }

            list.push(IgnoreRule {
                pattern,
                kinds,
                show,
                ignore_content: content,
            });
        }
        log::debug!(
            "Parsed {} ignore rules (default: {})",
            list.rules.len(),
            if list.show_by_default { "show" } else { "hide" }
        );
        Ok(list)
    }

    /// Load and parse a rule file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }
}

#[derive(Debug)]
enum Token {
    Word(String),
    Quoted(String),
}

impl Token {
    fn into_text(self) -> String {
        match self {
            Token::Word(s) | Token::Quoted(s) => s,
        }
    }
}

/// Split on whitespace; `"..."` groups a token and `""` escapes a quote.
fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    Some('"') => break,
                    Some(ch) => text.push(ch),
                    None => return Err("unterminated quoted pattern".to_string()),
                }
            }
            tokens.push(Token::Quoted(text));
        } else {
            let mut text = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                text.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(text));
        }
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "ignore_test.rs"]
mod tests;
