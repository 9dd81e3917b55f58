//! Specificity-based resolution of `(permission, value)` against a ruleset

use tracing::{debug, trace};

use super::types::{Action, PermissionEntry, Rule, Ruleset};
use crate::wildcard;

impl Ruleset {
    /// Permission entries whose key matches `permission`, most specific
    /// first: longest key wins, merge recency breaks ties.
    pub(crate) fn ranked_entries(&self, permission: &str) -> Vec<&PermissionEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| wildcard::matches(permission, &entry.key))
            .collect();
        entries.sort_by(|a, b| {
            b.key
                .len()
                .cmp(&a.key.len())
                .then(b.seq.cmp(&a.seq))
        });
        entries
    }

    /// Resolve `value` under `permission` to an [`Action`].
    ///
    /// Permission keys matching `permission` are consulted most-specific
    /// first (longest key, merge recency breaking ties). The first key with
    /// a matching value pattern decides; a key with no matching pattern
    /// falls through to the next. Nothing matching anywhere resolves to
    /// [`Action::Ask`].
    ///
    /// Pure and lock-free; safe to call from any number of concurrent
    /// tasks.
    pub fn evaluate(&self, permission: &str, value: &str) -> Action {
        let entries = self.ranked_entries(permission);
        if entries.is_empty() {
            trace!(permission, value, "no permission key matches, defaulting to ask");
            return Action::Ask;
        }

        for entry in entries {
            if let Some(action) = best_rule(value, &entry.rules) {
                debug!(permission, value, key = %entry.key, ?action, "resolved");
                return action;
            }
            trace!(permission, value, key = %entry.key, "no value pattern matched, falling through");
        }
        Action::Ask
    }
}

/// Pick the most specific matching rule: longest pattern wins,
/// later-declared breaks ties.
pub(crate) fn best_rule(value: &str, rules: &[Rule]) -> Option<Action> {
    let mut winner: Option<(usize, Action)> = None;
    for rule in rules {
        if !wildcard::matches(value, &rule.pattern) {
            continue;
        }
        match winner {
            Some((len, _)) if rule.pattern.len() < len => {}
            _ => winner = Some((rule.pattern.len(), rule.action)),
        }
    }
    winner.map(|(_, action)| action)
}
