//! Request broker for deferred authorization decisions
//!
//! When evaluation yields `ask`, the tool layer cannot proceed until a human
//! answers. The [`RequestBroker`] owns that handshake: it registers the
//! pending request, notifies the presentation layer, suspends the asking
//! task, and wakes it when [`RequestBroker::respond`] or
//! [`RequestBroker::cleanup`] fires. Each pending request is resolved or
//! rejected exactly once; one pending prompt never blocks unrelated tool
//! invocations.
//!
//! The broker is an explicitly owned value, scoped to the process or
//! session that creates it. Tests get a fresh broker each; there is no
//! hidden global table.

mod pending;
mod types;

pub use pending::RequestBroker;
pub use types::{PermissionEvent, Reply, Request};
