use serde::{Deserialize, Serialize};

use crate::Record;

/// Ordered keyword rules. Tokens are trimmed and blanks are dropped on construction,
/// so every rule held here is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RuleSet {
    rules: Vec<String>,
}

impl RuleSet {
    /// Builds a rule set from newline-separated text, one rule per line.
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.lines())
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = tokens
            .into_iter()
            .map(|token| token.as_ref().trim().to_string())
            .filter(|token| !token.is_empty())
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for RuleSet {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<RuleSet> for Vec<String> {
    fn from(set: RuleSet) -> Self {
        set.rules
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchReason {
    /// The rule was found in the author's display name.
    Name,
    /// The rule was found only in the body text.
    Body,
}

impl MatchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchReason::Name => "name",
            MatchReason::Body => "body",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub rule: String,
    pub reason: MatchReason,
}

/// Returns the first rule (in rule-set order) contained in the record's display name or
/// body text, compared case-insensitively.
///
/// When the first matching rule appears on both sides the reason is [`MatchReason::Name`].
pub fn find_match(record: &Record, rules: &RuleSet) -> Option<MatchResult> {
    if rules.is_empty() {
        return None;
    }
    let name = record.display_name.to_lowercase();
    let body = record.body_text.to_lowercase();

    rules.iter().find_map(|rule| {
        let needle = rule.to_lowercase();
        let reason = if name.contains(&needle) {
            MatchReason::Name
        } else if body.contains(&needle) {
            MatchReason::Body
        } else {
            return None;
        };
        Some(MatchResult {
            rule: rule.to_string(),
            reason,
        })
    })
}
