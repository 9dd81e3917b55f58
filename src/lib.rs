//! Warden
//!
//! The authorization core of an AI coding agent. Before any side-effecting
//! action (shell command, file edit, network fetch, skill invocation)
//! executes, it is resolved to **allow**, **deny**, or **ask-the-human**
//! against a layered, pattern-based ruleset, with an asynchronous broker
//! for decisions deferred to a human.
//!
//! ## Resolution model
//!
//! ```text
//! raw config → Ruleset::from_config → Ruleset::merge (layers)
//!                                          ↓
//!                  evaluate(permission, value) → allow | deny | ask
//!                                          ↓
//!              RequestBroker::ask ⇄ respond / cleanup → Ok | RejectedError
//! ```
//!
//! Both permission keys and value patterns are glob strings with `*` as a
//! multi-character wildcard. Resolution is specificity-based at both
//! levels (longest pattern wins), and anything unconfigured resolves to
//! `ask` — the system never silently grants access.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use warden::{Action, Ruleset, disabled_tools};
//!
//! let defaults = Ruleset::from_config(&json!({ "*": "ask" }));
//! let project = Ruleset::from_config(&json!({
//!     "bash": { "*": "allow", "rm *": "deny" },
//!     "webfetch": "deny",
//! }));
//! let effective = Ruleset::merge([&defaults, &project]);
//!
//! assert_eq!(effective.evaluate("bash", "ls -la"), Action::Allow);
//! assert_eq!(effective.evaluate("bash", "rm -rf /"), Action::Deny);
//! assert_eq!(effective.evaluate("edit", "src/main.rs"), Action::Ask);
//!
//! // webfetch can never be approved, so callers omit it entirely
//! let disabled = disabled_tools(["bash", "edit", "webfetch"], &effective);
//! assert!(disabled.contains("webfetch"));
//! assert!(!disabled.contains("bash"));
//! ```
//!
//! Deferred decisions go through the [`RequestBroker`]; see the [`broker`]
//! module for the ask/respond handshake.

pub mod broker;
pub mod error;
pub mod gate;
pub mod ruleset;
pub mod wildcard;

pub use broker::{PermissionEvent, Reply, Request, RequestBroker};
pub use error::RejectedError;
pub use gate::{disabled_tools, governing_permission};
pub use ruleset::{Action, Rule, Ruleset};
