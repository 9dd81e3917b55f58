//! Layering of rulesets with overwrite-and-append semantics

use tracing::trace;

use super::types::{PermissionEntry, Ruleset};
use crate::wildcard;

impl Ruleset {
    /// Layer rulesets left-to-right; later layers take precedence.
    ///
    /// A permission key absent from the accumulator is inserted verbatim.
    /// For a key that already exists, each incoming pattern is applied with
    /// overwrite-and-append: every accumulator pattern covered by the
    /// incoming pattern has its action updated, and the incoming pattern is
    /// also kept as its own entry. This keeps granular entries visible for
    /// later narrower overrides while guaranteeing last-writer-wins
    /// outcomes.
    pub fn merge<'a, I>(layers: I) -> Ruleset
    where
        I: IntoIterator<Item = &'a Ruleset>,
    {
        let mut merged = Ruleset::default();
        for layer in layers {
            merged.apply_layer(layer);
        }
        merged
    }

    fn apply_layer(&mut self, layer: &Ruleset) {
        for incoming in &layer.entries {
            let seq = self.next_seq;
            self.next_seq += 1;

            let Some(pos) = self.entries.iter().position(|e| e.key == incoming.key) else {
                trace!(key = %incoming.key, "inserting new permission key");
                self.entries.push(PermissionEntry {
                    key: incoming.key.clone(),
                    seq,
                    rules: incoming.rules.clone(),
                });
                continue;
            };

            let entry = &mut self.entries[pos];
            entry.seq = seq;
            for rule in &incoming.rules {
                for existing in entry.rules.iter_mut() {
                    if wildcard::matches(&existing.pattern, &rule.pattern) {
                        trace!(
                            key = %incoming.key,
                            pattern = %existing.pattern,
                            by = %rule.pattern,
                            "overwriting action of covered pattern"
                        );
                        existing.action = rule.action;
                    }
                }
                if !entry.rules.iter().any(|r| r.pattern == rule.pattern) {
                    entry.rules.push(rule.clone());
                }
            }
        }
    }
}
