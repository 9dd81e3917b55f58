//! Permission rulesets
//!
//! Normalizes raw permission configuration into a canonical nested structure
//! (permission key → pattern → action) and resolves concrete values against
//! it.
//!
//! ## Resolution model
//!
//! A [`Ruleset`] maps permission keys to ordered pattern→action rules. Both
//! levels are glob patterns: the key `"mcp_*"` governs every MCP tool, and
//! the universal key `"*"` is the fallback for everything. Resolution is
//! specificity-based at both levels:
//!
//! 1. Permission keys matching the checked permission are ranked longest
//!    first; equal lengths prefer the key merged in later.
//! 2. Within the selected key, value patterns are ranked the same way
//!    (later-declared breaks ties).
//! 3. A key with no matching value pattern falls through to the next key.
//! 4. Nothing matching anywhere resolves to `ask` — an unconfigured
//!    capability is never silently granted.
//!
//! ## Example configuration
//!
//! ```json
//! {
//!     "edit": "allow",
//!     "bash": {
//!         "*": "allow",
//!         "rm *": "deny",
//!         "git push *": "ask"
//!     }
//! }
//! ```
//!
//! A bare action string is sugar for `{"*": action}`. Rulesets are immutable
//! once built; layering happens through [`Ruleset::merge`], which produces a
//! new ruleset.

mod evaluate;
mod merge;
mod types;

pub(crate) use evaluate::best_rule;
pub use types::{Action, Rule, Ruleset};
