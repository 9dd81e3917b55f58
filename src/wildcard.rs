//! Glob-style wildcard matching
//!
//! The primitive every other component is built on. Patterns use `*` as a
//! multi-character wildcard matched against the full candidate string; a
//! single `*` can span separators, so `src/*` matches `src/a/b/c.rs`.

use crate::ruleset::Action;

/// Check whether `value` matches `pattern`.
///
/// The pattern is split into literal runs separated by `*`. The value must
/// start with the first run (unless the pattern starts with `*`), end with
/// the last run (unless the pattern ends with `*`), and contain all interior
/// runs in order. An empty pattern matches only the empty value; `"*"`
/// matches everything.
pub fn matches(value: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return value == pattern;
    }

    let mut parts = pattern.split('*');
    // split always yields at least one element
    let first = parts.next().unwrap_or("");
    if !value.starts_with(first) {
        return false;
    }
    let mut rest = &value[first.len()..];

    let remaining: Vec<&str> = parts.collect();
    for (i, part) in remaining.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let anchored_end = i == remaining.len() - 1 && !pattern.ends_with('*');
        if anchored_end {
            return rest.ends_with(part);
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

/// Resolve `value` against a flat list of `(pattern, action)` candidates.
///
/// The winning entry is the matching pattern with the most literal
/// characters; equal lengths keep the later-declared entry. No match
/// resolves to [`Action::Ask`], the universal fail-safe.
pub fn best<'a, I>(value: &str, candidates: I) -> Action
where
    I: IntoIterator<Item = (&'a str, Action)>,
{
    let mut winner: Option<(usize, Action)> = None;
    for (pattern, action) in candidates {
        if !matches(value, pattern) {
            continue;
        }
        match winner {
            Some((len, _)) if pattern.len() < len => {}
            _ => winner = Some((pattern.len(), action)),
        }
    }
    winner.map_or(Action::Ask, |(_, action)| action)
}
