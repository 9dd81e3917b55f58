//! Core ruleset types and config normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

/// Decision outcome for a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Proceed without prompting
    Allow,
    /// Refuse the action
    Deny,
    /// Defer to the human approver
    Ask,
}

impl Action {
    fn parse(s: &str) -> Option<Action> {
        match s {
            "allow" => Some(Action::Allow),
            "deny" => Some(Action::Deny),
            "ask" => Some(Action::Ask),
            _ => None,
        }
    }
}

/// A single value pattern → action rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub action: Action,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, action: Action) -> Self {
        Self {
            pattern: pattern.into(),
            action,
        }
    }
}

/// Rules for one permission key, with merge recency for tie-breaking
#[derive(Debug, Clone)]
pub(crate) struct PermissionEntry {
    pub key: String,
    /// Bumped every time a merge layer touches this key. Among permission
    /// keys of equal pattern length, the higher seq wins.
    pub seq: u64,
    pub rules: Vec<Rule>,
}

/// Canonical two-level mapping: permission key → pattern → action.
///
/// Insertion order of rules within a key is significant (later-declared
/// breaks specificity ties). Immutable once constructed; all layering goes
/// through [`Ruleset::merge`].
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    pub(crate) entries: Vec<PermissionEntry>,
    pub(crate) next_seq: u64,
}

impl Ruleset {
    /// Normalize the raw, denormalized configuration shape.
    ///
    /// The raw shape maps each permission key to either a bare action string
    /// (sugar for `{"*": action}`) or an object of pattern → action entries.
    /// This is the only entry point that consumes the raw shape. Never
    /// fails: malformed entries are inert (match nothing) rather than fatal.
    pub fn from_config(raw: &Value) -> Ruleset {
        let mut ruleset = Ruleset::default();
        let Some(map) = raw.as_object() else {
            return ruleset;
        };
        for (key, value) in map {
            let rules = match value {
                Value::String(action) => match Action::parse(action) {
                    Some(action) => vec![Rule::new("*", action)],
                    None => {
                        trace!(key, action, "skipping unknown action");
                        continue;
                    }
                },
                Value::Object(patterns) => patterns
                    .iter()
                    .filter_map(|(pattern, action)| {
                        action
                            .as_str()
                            .and_then(Action::parse)
                            .map(|action| Rule::new(pattern.clone(), action))
                    })
                    .collect(),
                _ => {
                    trace!(key, "skipping malformed permission entry");
                    continue;
                }
            };
            ruleset.push_entry(key.clone(), rules);
        }
        ruleset
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push_entry(&mut self, key: String, rules: Vec<Rule>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(PermissionEntry { key, seq, rules });
    }
}
