//! Static pre-filter for unconditionally denied tools
//!
//! Callers use this ahead of invocation to omit capabilities that could
//! never be approved, instead of invoking them and denying every call.

use std::collections::HashSet;

use tracing::debug;

use crate::ruleset::{Action, Ruleset, best_rule};

/// Tools that govern under a shared permission key. The whole edit family
/// rides on the `edit` permission.
const ALIASES: &[(&str, &str)] = &[
    ("write", "edit"),
    ("patch", "edit"),
    ("multiedit", "edit"),
];

/// The permission key governing `tool`.
pub fn governing_permission(tool: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == tool)
        .map_or(tool, |(_, permission)| *permission)
}

/// The subset of `tools` that are unconditionally denied under `ruleset`.
///
/// A tool is disabled only when its governing permission resolves to `deny`
/// for the wildcard value and no rule under a matching permission key could
/// decide otherwise for some narrower value. A result of `ask`, or a deny
/// with a carve-out (`{"*": "deny", "echo *": "allow"}`), leaves the tool
/// enabled so the caller gets a per-invocation decision instead.
pub fn disabled_tools<'a, I>(tools: I, ruleset: &Ruleset) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    tools
        .into_iter()
        .filter(|tool| {
            let permission = governing_permission(tool);
            let blocked = unconditionally_denied(ruleset, permission);
            if blocked {
                debug!(tool, permission, "tool is unconditionally denied");
            }
            blocked
        })
        .map(str::to_string)
        .collect()
}

fn unconditionally_denied(ruleset: &Ruleset, permission: &str) -> bool {
    let entries = ruleset.ranked_entries(permission);
    for (i, entry) in entries.iter().enumerate() {
        let Some(action) = best_rule("*", &entry.rules) else {
            continue;
        };
        if action != Action::Deny {
            return false;
        }
        // deny decided at this key; a non-deny rule here or at a more
        // specific key could still carve out narrower values
        return !entries[..=i]
            .iter()
            .any(|e| e.rules.iter().any(|rule| rule.action != Action::Deny));
    }
    false
}
