//! Request, reply and notification types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single deferred authorization decision.
///
/// Created by the tool layer before a side-effecting action; the
/// presentation layer receives it inside [`PermissionEvent::Asked`] and
/// renders title, description and metadata to the human.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Generated by the broker when absent
    #[serde(default)]
    pub id: Option<String>,
    pub session_id: String,
    /// Permission key being exercised, e.g. `"bash"` or `"edit"`
    pub permission: String,
    /// Concrete values to check, e.g. the command line or file path
    pub value_patterns: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Arbitrary context for the prompt UI
    #[serde(default)]
    pub metadata: Value,
    /// Patterns to remember on an `always` reply; falls back to
    /// `value_patterns` when empty. Lets a tool offer a broader grant than
    /// the concrete value checked ("always allow `git status *`").
    #[serde(default)]
    pub always_patterns: Vec<String>,
}

impl Request {
    pub fn new(
        session_id: impl Into<String>,
        permission: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            session_id: session_id.into(),
            permission: permission.into(),
            value_patterns: Vec::new(),
            title: title.into(),
            description: String::new(),
            metadata: Value::Null,
            always_patterns: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_value_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.value_patterns.push(pattern.into());
        self
    }

    pub fn with_value_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_always_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }
}

/// The external approver's answer to a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    /// Approve this request only
    Once,
    /// Approve and remember the patterns for the rest of the session
    Always,
    /// Deny the request
    Reject,
}

/// Notifications emitted by the broker for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PermissionEvent {
    /// A new pending request needs a human decision
    Asked(Request),
    /// A pending request was resolved
    Replied { id: String, reply: Reply },
}
