//! Error types for warden
//!
//! This core raises exactly one error. Matching, normalization, merging and
//! evaluation are total functions that degrade gracefully on malformed
//! input; only a denied action surfaces as an error, and the calling tool
//! layer is expected to relay its message verbatim.

use thiserror::Error;

pub(crate) const DEFAULT_REJECT_MESSAGE: &str =
    "The user rejected permission to use this specific tool call. You may try again with different parameters.";

/// The action was denied, either by a rule, by the human approver, or by
/// session teardown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .reason.as_deref().unwrap_or(DEFAULT_REJECT_MESSAGE))]
pub struct RejectedError {
    /// Human-readable reason, when one is known
    pub reason: Option<String>,
}

impl RejectedError {
    pub fn new() -> Self {
        Self { reason: None }
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl Default for RejectedError {
    fn default() -> Self {
        Self::new()
    }
}
