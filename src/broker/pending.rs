//! The broker itself: pending table, session grants, notification channel

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use super::types::{PermissionEvent, Reply, Request};
use crate::error::RejectedError;
use crate::ruleset::{Action, Ruleset};
use crate::wildcard;

/// A registered request plus its continuation. Exactly one of resolve or
/// reject fires, exactly once: the oneshot sender is consumed on use.
struct PendingEntry {
    request: Request,
    tx: oneshot::Sender<Result<(), RejectedError>>,
}

#[derive(Default)]
struct BrokerState {
    pending: HashMap<String, PendingEntry>,
    /// session id → permission → patterns approved with "always"
    approved: HashMap<String, HashMap<String, HashSet<String>>>,
}

/// Brokers in-flight "ask" decisions between the tool layer and the human
/// approver.
///
/// All table mutation happens under one lock; evaluation and matching stay
/// outside the critical section, and the lock is never held across an
/// await. There are no timeouts: a deferred decision stays pending until
/// [`RequestBroker::respond`] or [`RequestBroker::cleanup`] settles it.
pub struct RequestBroker {
    state: Mutex<BrokerState>,
    events: broadcast::Sender<PermissionEvent>,
    next_id: AtomicU64,
}

impl RequestBroker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(BrokerState::default()),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to `asked` / `replied` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PermissionEvent> {
        self.events.subscribe()
    }

    /// Check every value pattern of `request` against `ruleset` and, when
    /// needed, wait for the human decision.
    ///
    /// Any `deny` rejects immediately, with nothing registered and no event
    /// emitted. If every pattern is allowed (by rule or by an earlier
    /// `always` grant for this session) the call returns without
    /// prompting. Otherwise the request is registered, an
    /// [`PermissionEvent::Asked`] notification goes out, and the calling
    /// task suspends until the request is settled.
    pub async fn ask(&self, request: Request, ruleset: &Ruleset) -> Result<(), RejectedError> {
        let granted = {
            let state = self.state.lock().unwrap();
            state
                .approved
                .get(&request.session_id)
                .and_then(|grants| grants.get(&request.permission))
                .cloned()
                .unwrap_or_default()
        };

        let mut needs_prompt = false;
        for pattern in &request.value_patterns {
            // a session grant may be broader than the concrete value
            if granted.iter().any(|g| wildcard::matches(pattern, g)) {
                continue;
            }
            match ruleset.evaluate(&request.permission, pattern) {
                Action::Allow => {}
                Action::Ask => needs_prompt = true,
                Action::Deny => {
                    debug!(
                        permission = %request.permission,
                        pattern = %pattern,
                        "denied by rule"
                    );
                    return Err(RejectedError::with_reason(format!(
                        "permission \"{}\" is denied for \"{}\"",
                        request.permission, pattern
                    )));
                }
            }
        }
        if !needs_prompt {
            return Ok(());
        }

        let mut request = request;
        let id = match &request.id {
            Some(id) => id.clone(),
            None => {
                let id = format!("perm_{:06}", self.next_id.fetch_add(1, Ordering::Relaxed));
                request.id = Some(id.clone());
                id
            }
        };

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            let replaced = state.pending.insert(
                id.clone(),
                PendingEntry {
                    request: request.clone(),
                    tx,
                },
            );
            if replaced.is_some() {
                // the displaced waiter sees its sender dropped and rejects
                warn!(id = %id, "replacing pending request with duplicate id");
            }
        }
        debug!(id = %id, permission = %request.permission, "awaiting decision");
        let _ = self.events.send(PermissionEvent::Asked(request));

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(RejectedError::new()),
        }
    }

    /// Settle the pending request `id` with the approver's reply.
    ///
    /// Unknown ids are a no-op, which makes duplicate replies harmless. An
    /// `always` reply records the request's grant patterns for its session
    /// before resolving, so later `ask` calls for the same
    /// permission/pattern combination short-circuit to allow.
    pub fn respond(&self, id: &str, reply: Reply) {
        let entry = {
            let mut state = self.state.lock().unwrap();
            let Some(entry) = state.pending.remove(id) else {
                debug!(id, "respond for unknown or already settled request");
                return;
            };
            if reply == Reply::Always {
                let patterns = if entry.request.always_patterns.is_empty() {
                    &entry.request.value_patterns
                } else {
                    &entry.request.always_patterns
                };
                let grants = state
                    .approved
                    .entry(entry.request.session_id.clone())
                    .or_default()
                    .entry(entry.request.permission.clone())
                    .or_default();
                grants.extend(patterns.iter().cloned());
            }
            entry
        };

        debug!(id, ?reply, "settling request");
        let result = match reply {
            Reply::Once | Reply::Always => Ok(()),
            Reply::Reject => Err(RejectedError::new()),
        };
        let _ = entry.tx.send(result);
        let _ = self.events.send(PermissionEvent::Replied {
            id: id.to_string(),
            reply,
        });
    }

    /// Reject and remove every pending entry for `session_id`, along with
    /// the session's `always` grants. Entries for other sessions are
    /// untouched. Called on session teardown so no waiter dangles.
    pub fn cleanup(&self, session_id: &str) {
        let removed: Vec<(String, PendingEntry)> = {
            let mut state = self.state.lock().unwrap();
            state.approved.remove(session_id);
            let ids: Vec<String> = state
                .pending
                .iter()
                .filter(|(_, entry)| entry.request.session_id == session_id)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| state.pending.remove(&id).map(|entry| (id, entry)))
                .collect()
        };

        debug!(session_id, count = removed.len(), "cleaning up session");
        for (id, entry) in removed {
            let _ = entry.tx.send(Err(RejectedError::with_reason(format!(
                "the session was aborted before the request \"{}\" was answered",
                entry.request.title
            ))));
            let _ = self.events.send(PermissionEvent::Replied {
                id,
                reply: Reply::Reject,
            });
        }
    }

    /// Snapshot of the currently pending requests, mainly for inspection
    /// and tests.
    pub fn pending(&self) -> Vec<Request> {
        let state = self.state.lock().unwrap();
        state
            .pending
            .values()
            .map(|entry| entry.request.clone())
            .collect()
    }
}

impl Default for RequestBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ask_everything() -> Ruleset {
        Ruleset::from_config(&json!({ "*": "ask" }))
    }

    #[tokio::test]
    async fn test_all_allow_resolves_without_prompt() {
        let broker = RequestBroker::new();
        let ruleset = Ruleset::from_config(&json!({ "bash": "allow" }));
        let request = Request::new("ses_1", "bash", "Run ls").with_value_pattern("ls -la");
        broker.ask(request, &ruleset).await.unwrap();
        assert!(broker.pending().is_empty());
    }

    #[tokio::test]
    async fn test_deny_rejects_synchronously_without_side_effects() {
        let broker = RequestBroker::new();
        let mut events = broker.subscribe();
        let ruleset = Ruleset::from_config(&json!({ "bash": { "*": "allow", "rm *": "deny" } }));
        let request = Request::new("ses_1", "bash", "Remove files").with_value_pattern("rm -rf /");

        let err = broker.ask(request, &ruleset).await.unwrap_err();
        assert!(err.to_string().contains("rm -rf /"));
        assert!(broker.pending().is_empty());
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_deny_wins_over_ask_across_patterns() {
        let broker = RequestBroker::new();
        let ruleset = Ruleset::from_config(&json!({ "edit": { "src/secret/*": "deny" } }));
        let request = Request::new("ses_1", "edit", "Edit files")
            .with_value_patterns(["src/main.rs", "src/secret/key.pem"]);
        assert!(broker.ask(request, &ruleset).await.is_err());
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_ask_suspends_until_respond() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let request = Request::new("ses_1", "bash", "Run command")
            .with_id("perm_fixed")
            .with_value_pattern("cargo fmt");

        let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
        tokio_test::assert_pending!(task.poll());
        assert_eq!(broker.pending().len(), 1);

        broker.respond("perm_fixed", Reply::Once);
        assert!(task.is_woken());
        let result = tokio_test::assert_ready!(task.poll());
        assert!(result.is_ok());
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_reject_reply_rejects_and_is_idempotent() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let request = Request::new("ses_1", "bash", "Run command")
            .with_id("perm_fixed")
            .with_value_pattern("cargo publish");

        let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
        tokio_test::assert_pending!(task.poll());

        broker.respond("perm_fixed", Reply::Reject);
        let result = tokio_test::assert_ready!(task.poll());
        assert_eq!(result.unwrap_err(), RejectedError::new());

        // second reply hits a removed entry and is a no-op
        broker.respond("perm_fixed", Reply::Once);
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let broker = RequestBroker::new();
        broker.respond("perm_nope", Reply::Once);
        assert!(broker.pending().is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let mut tasks = Vec::new();
        for i in 0..3 {
            let request = Request::new("ses_1", "bash", format!("Run {i}"))
                .with_value_pattern(format!("cmd {i}"));
            let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
            tokio_test::assert_pending!(task.poll());
            tasks.push(task);
        }
        assert_eq!(broker.pending().len(), 3);
        let mut ids: Vec<String> = broker
            .pending()
            .iter()
            .filter_map(|r| r.id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_always_grant_short_circuits_later_asks() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let request = Request::new("ses_1", "bash", "Git status")
            .with_id("perm_fixed")
            .with_value_pattern("git status");

        let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
        tokio_test::assert_pending!(task.poll());
        broker.respond("perm_fixed", Reply::Always);
        assert!(tokio_test::assert_ready!(task.poll()).is_ok());
        drop(task);

        // same permission/pattern now resolves without prompting
        let again = Request::new("ses_1", "bash", "Git status").with_value_pattern("git status");
        let mut task = tokio_test::task::spawn(broker.ask(again, &ruleset));
        assert!(tokio_test::assert_ready!(task.poll()).is_ok());
        assert!(broker.pending().is_empty());

        // a different session still prompts
        let other = Request::new("ses_2", "bash", "Git status").with_value_pattern("git status");
        let mut task = tokio_test::task::spawn(broker.ask(other, &ruleset));
        tokio_test::assert_pending!(task.poll());
    }

    #[test]
    fn test_always_records_always_patterns_over_values() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let request = Request::new("ses_1", "bash", "Git status")
            .with_id("perm_fixed")
            .with_value_pattern("git status --short")
            .with_always_patterns(["git status*"]);

        let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
        tokio_test::assert_pending!(task.poll());
        broker.respond("perm_fixed", Reply::Always);
        assert!(tokio_test::assert_ready!(task.poll()).is_ok());
        drop(task);

        // the broader always pattern covers other invocations too
        let again = Request::new("ses_1", "bash", "Git status")
            .with_value_pattern("git status --porcelain");
        let mut task = tokio_test::task::spawn(broker.ask(again, &ruleset));
        assert!(tokio_test::assert_ready!(task.poll()).is_ok());

        // but unrelated commands still prompt
        let other = Request::new("ses_1", "bash", "Git push").with_value_pattern("git push");
        let mut task = tokio_test::task::spawn(broker.ask(other, &ruleset));
        tokio_test::assert_pending!(task.poll());
    }

    #[test]
    fn test_cleanup_rejects_only_matching_session() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();

        let one = Request::new("ses_1", "bash", "One")
            .with_id("perm_one")
            .with_value_pattern("a");
        let two = Request::new("ses_2", "bash", "Two")
            .with_id("perm_two")
            .with_value_pattern("b");

        let mut task_one = tokio_test::task::spawn(broker.ask(one, &ruleset));
        let mut task_two = tokio_test::task::spawn(broker.ask(two, &ruleset));
        tokio_test::assert_pending!(task_one.poll());
        tokio_test::assert_pending!(task_two.poll());

        broker.cleanup("ses_1");

        let result = tokio_test::assert_ready!(task_one.poll());
        assert!(result.unwrap_err().to_string().contains("aborted"));

        // the other session is untouched and still resolvable
        tokio_test::assert_pending!(task_two.poll());
        broker.respond("perm_two", Reply::Once);
        assert!(tokio_test::assert_ready!(task_two.poll()).is_ok());
    }

    #[test]
    fn test_cleanup_drops_session_grants() {
        let broker = RequestBroker::new();
        let ruleset = ask_everything();
        let request = Request::new("ses_1", "bash", "Git status")
            .with_id("perm_fixed")
            .with_value_pattern("git status");

        let mut task = tokio_test::task::spawn(broker.ask(request, &ruleset));
        tokio_test::assert_pending!(task.poll());
        broker.respond("perm_fixed", Reply::Always);
        assert!(tokio_test::assert_ready!(task.poll()).is_ok());
        drop(task);

        broker.cleanup("ses_1");

        let again = Request::new("ses_1", "bash", "Git status").with_value_pattern("git status");
        let mut task = tokio_test::task::spawn(broker.ask(again, &ruleset));
        tokio_test::assert_pending!(task.poll());
    }
}
