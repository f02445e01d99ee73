//! Filesystem-safe rewriting of tag values.
//!
//! The transform runs in four ordered passes:
//! 1. literal replacement rules, in configuration order
//! 2. removal of any leftover character from [`INVALID_CHARS`]
//! 3. whitespace and dash run collapsing
//! 4. trimming of leading/trailing spaces, periods and dashes
//!
//! Rules are validated by [`Sanitizer::new`] so that the whole transform is
//! idempotent: `sanitize(sanitize(x)) == sanitize(x)`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters that are invalid in Windows/Android file names.
pub const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());
static SPACED_DASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-(?:\s*-)+\s*").unwrap());

/// A single literal substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// The built-in replacement table.
pub fn default_replacements() -> Vec<Replacement> {
    vec![
        Replacement::new(":", "-"),
        Replacement::new("|", "-"),
        Replacement::new("/", "-"),
        Replacement::new("?", ""),
        Replacement::new("\u{201C}", "'"),
        Replacement::new("\u{201D}", "'"),
        Replacement::new("\"", "'"),
        Replacement::new("<", "("),
        Replacement::new(">", ")"),
        Replacement::new("*", ""),
        Replacement::new("\\", "-"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeOutcome {
    pub text: String,
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    rules: Vec<Replacement>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            rules: default_replacements(),
        }
    }
}

impl Sanitizer {
    /// Build a sanitizer from an ordered rule table.
    ///
    /// Each rule must replace exactly one non-whitespace character. A rule's
    /// replacement text, after the rules that follow it have run over it,
    /// must contain no invalid character and no rule's source character.
    /// Chains such as `&` → `+` → `and` are therefore allowed.
    pub fn new(rules: Vec<Replacement>) -> Result<Self> {
        let sources: Vec<char> = rules
            .iter()
            .map(|rule| {
                let mut chars = rule.from.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() => Ok(c),
                    _ => Err(Error::Config(format!(
                        "Replacement source must be a single non-whitespace character, got {:?}",
                        rule.from
                    ))),
                }
            })
            .collect::<Result<_>>()?;

        for (i, rule) in rules.iter().enumerate() {
            let chained = apply_rules(&rule.to, &rules[i + 1..]);
            if let Some(bad) = chained.chars().find(|c| INVALID_CHARS.contains(c)) {
                return Err(Error::Config(format!(
                    "Replacement for {:?} contains invalid character {:?}",
                    rule.from, bad
                )));
            }
            if let Some(bad) = chained.chars().find(|c| sources.contains(c)) {
                return Err(Error::Config(format!(
                    "Replacement for {:?} reintroduces replaced character {:?}",
                    rule.from, bad
                )));
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Replacement] {
        &self.rules
    }

    pub fn sanitize(&self, text: &str) -> SanitizeOutcome {
        let mut result = apply_rules(text, &self.rules);
        result.retain(|c| !INVALID_CHARS.contains(&c));

        let result = WHITESPACE_RUN.replace_all(&result, " ");
        let result = DASH_RUN.replace_all(&result, "-");
        let result = SPACED_DASHES.replace_all(&result, " - ");
        let result = result.trim_matches([' ', '.', '-']).to_string();

        let changed = result != text;
        SanitizeOutcome {
            text: result,
            changed,
        }
    }
}

fn apply_rules(text: &str, rules: &[Replacement]) -> String {
    let mut result = text.to_string();
    for rule in rules {
        if result.contains(rule.from.as_str()) {
            result = result.replace(rule.from.as_str(), &rule.to);
        }
    }
    result
}
