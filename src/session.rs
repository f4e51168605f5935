//! Per-session conversation management
//!
//! Each session id owns one ordered conversation: a system message at
//! position 0, then alternating user/assistant turn pairs. The manager
//! seeds, appends, persists, and truncates those conversations on top of
//! the idle-expiring store, and handles the configured clear commands
//! before any mutation happens.

use crate::config::SessionConfig;
use crate::providers::Message;
use crate::store::ExpiringStore;
use std::sync::Mutex;

/// Outcome of building a query for a session
///
/// The clear-command variants are sentinels: no remote call should be made
/// and the caller replies with an acknowledgement instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Full conversation to submit, ending in the new user message
    Query(Vec<Message>),
    /// The input matched the clear-session command
    SessionCleared,
    /// The input matched the clear-all-sessions command
    AllSessionsCleared,
}

/// Owns every conversation, keyed by opaque session id
///
/// All access goes through an internal lock, so concurrent callers on the
/// same session id are serialized and neither append is lost. Handles are
/// shared by wrapping the manager in an `Arc`.
pub struct SessionManager {
    sessions: Mutex<ExpiringStore<Vec<Message>>>,
    max_tokens: usize,
    character_desc: String,
    clear_command: String,
    clear_all_command: String,
}

impl SessionManager {
    /// Create a manager from session configuration
    ///
    /// A zero max-token budget falls back to 1024.
    pub fn new(config: &SessionConfig) -> Self {
        let max_tokens = if config.max_tokens > 0 {
            config.max_tokens
        } else {
            1024
        };

        tracing::info!(
            "Session manager ready: ttl={}s, max_tokens={}",
            config.expires_in_seconds,
            max_tokens
        );

        Self {
            sessions: Mutex::new(ExpiringStore::new(config.expires_in_seconds)),
            max_tokens,
            character_desc: config.character_desc.clone(),
            clear_command: config.clear_command.clone(),
            clear_all_command: config.clear_all_command.clone(),
        }
    }

    /// Build the conversation to submit for a user utterance
    ///
    /// Clear-command checks run first and mutate nothing beyond the
    /// requested clears. Otherwise the session's conversation is fetched
    /// (or seeded with the system message), the user message is appended,
    /// the result is persisted back (refreshing the idle deadline), and
    /// the full conversation is returned.
    pub fn build_query(&self, session_id: &str, query: &str) -> QueryOutcome {
        if query == self.clear_command {
            self.clear_session(session_id);
            return QueryOutcome::SessionCleared;
        }
        if query == self.clear_all_command {
            self.clear_all_sessions();
            return QueryOutcome::AllSessionsCleared;
        }

        let mut sessions = self.sessions.lock().unwrap();
        let mut conversation = sessions.get(session_id).unwrap_or_default();
        if conversation.is_empty() {
            conversation.push(Message::system(&self.character_desc));
        }
        conversation.push(Message::user(query));
        sessions.set(session_id.to_string(), conversation.clone());

        QueryOutcome::Query(conversation)
    }

    /// Persist the assistant's reply and truncate to the token budget
    ///
    /// A no-op if the session has expired or been cleared since the query
    /// was built. A cleared session holds an empty conversation; appending
    /// to it would put an assistant message at position 0, so the reply is
    /// dropped in that case too.
    pub fn save(&self, session_id: &str, reply: &str, total_tokens: usize) {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(mut conversation) = sessions.get(session_id).filter(|c| !c.is_empty()) else {
            tracing::debug!("Session {} gone before save, dropping reply", session_id);
            return;
        };

        conversation.push(Message::assistant(reply));
        self.discard_over_budget(&mut conversation, total_tokens);
        sessions.set(session_id.to_string(), conversation);
    }

    /// Drop oldest turn pairs until the running estimate fits the budget
    ///
    /// Removes the message at index 1 twice per round: the oldest user
    /// message and the assistant reply that followed it. The system
    /// message at index 0 is never touched, and a pair is always removed
    /// whole, so alternation survives. At least one pair is kept.
    ///
    /// The running estimate is decremented by the budget itself after each
    /// removal rather than by the tokens actually freed. That coarse proxy
    /// is the documented truncation behavior; it is kept in place of exact
    /// per-message accounting.
    fn discard_over_budget(&self, conversation: &mut Vec<Message>, total_tokens: usize) {
        let mut remaining = total_tokens;
        tracing::debug!(
            "Truncation check: estimate={}, budget={}",
            remaining,
            self.max_tokens
        );

        while remaining > self.max_tokens {
            if conversation.len() > 3 {
                conversation.remove(1);
                conversation.remove(1);
            } else {
                break;
            }
            remaining = remaining.saturating_sub(self.max_tokens);
        }
    }

    /// Reset one session's conversation to empty
    ///
    /// The next `build_query` reseeds the system message.
    pub fn clear_session(&self, session_id: &str) {
        tracing::info!("Clearing session {}", session_id);
        self.sessions
            .lock()
            .unwrap()
            .set(session_id.to_string(), Vec::new());
    }

    /// Drop every session
    pub fn clear_all_sessions(&self) {
        tracing::info!("Clearing all sessions");
        self.sessions.lock().unwrap().clear();
    }

    /// Snapshot of a session's current conversation, if it exists
    ///
    /// Reading refreshes the session's idle deadline, like any access.
    pub fn conversation(&self, session_id: &str) -> Option<Vec<Message>> {
        self.sessions.lock().unwrap().get(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(&SessionConfig {
            max_tokens: 100,
            ..SessionConfig::default()
        })
    }

    #[test]
    fn test_first_query_seeds_system_message() {
        let mgr = manager();
        let outcome = mgr.build_query("s1", "hello");

        let QueryOutcome::Query(conversation) = outcome else {
            panic!("Expected a query outcome");
        };
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, "system");
        assert_eq!(conversation[0].content, "You are a helpful assistant.");
        assert_eq!(conversation[1].role, "user");
        assert_eq!(conversation[1].content, "hello");
    }

    #[test]
    fn test_query_appends_to_existing_history() {
        let mgr = manager();
        mgr.build_query("s1", "first");
        mgr.save("s1", "reply one", 10);

        let QueryOutcome::Query(conversation) = mgr.build_query("s1", "second") else {
            panic!("Expected a query outcome");
        };
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation[2].role, "assistant");
        assert_eq!(conversation[3].content, "second");
    }

    #[test]
    fn test_clear_command_returns_sentinel() {
        let mgr = manager();
        mgr.build_query("s1", "hello");

        assert_eq!(mgr.build_query("s1", "#clear"), QueryOutcome::SessionCleared);
        // Next query reseeds: one system message, then the user message
        let QueryOutcome::Query(conversation) = mgr.build_query("s1", "again") else {
            panic!("Expected a query outcome");
        };
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, "system");
    }

    #[test]
    fn test_clear_all_command_empties_every_session() {
        let mgr = manager();
        mgr.build_query("s1", "hello");
        mgr.build_query("s2", "hi");

        assert_eq!(
            mgr.build_query("s1", "#clear_all"),
            QueryOutcome::AllSessionsCleared
        );
        assert!(mgr.conversation("s1").is_none());
        assert!(mgr.conversation("s2").is_none());
    }

    #[test]
    fn test_save_skips_vanished_session() {
        let mgr = manager();
        mgr.save("ghost", "reply", 10);
        assert!(mgr.conversation("ghost").is_none());
    }

    #[test]
    fn test_save_skips_cleared_session() {
        let mgr = manager();
        mgr.build_query("s1", "hello");
        // Session cleared while the completion is in flight
        mgr.clear_session("s1");
        mgr.save("s1", "reply", 10);

        // The reply is dropped, never appended at position 0
        assert!(mgr.conversation("s1").unwrap().is_empty());

        // The next query reseeds the system message as usual
        let QueryOutcome::Query(conversation) = mgr.build_query("s1", "again") else {
            panic!("Expected a query outcome");
        };
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0].role, "system");
        assert_eq!(conversation[1].content, "again");
    }

    #[test]
    fn test_save_within_budget_removes_nothing() {
        let mgr = manager();
        mgr.build_query("s1", "q1");
        mgr.save("s1", "a1", 80); // 80 <= 100

        assert_eq!(mgr.conversation("s1").unwrap().len(), 3);
    }

    #[test]
    fn test_truncation_removes_exact_pair_count() {
        // system + 3 pairs = 7 messages, budget 100, reported total 250:
        // 250 -> remove pair -> 150 -> remove pair -> 50, leaving 3 messages
        let mgr = manager();
        mgr.build_query("s1", "q1");
        mgr.save("s1", "a1", 10);
        mgr.build_query("s1", "q2");
        mgr.save("s1", "a2", 10);
        mgr.build_query("s1", "q3");
        mgr.save("s1", "a3", 250);

        let conversation = mgr.conversation("s1").unwrap();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[0].role, "system");
        assert_eq!(conversation[1].content, "q3");
        assert_eq!(conversation[2].content, "a3");
    }

    #[test]
    fn test_truncation_never_drops_system_or_last_pair() {
        let mgr = manager();
        mgr.build_query("s1", "q1");
        mgr.save("s1", "a1", 1_000_000);

        // Only one pair exists: nothing can be removed
        let conversation = mgr.conversation("s1").unwrap();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation[0].role, "system");
        assert_eq!(conversation[1].role, "user");
        assert_eq!(conversation[2].role, "assistant");
    }

    #[test]
    fn test_truncation_preserves_alternation() {
        let mgr = manager();
        for i in 0..5 {
            mgr.build_query("s1", &format!("q{}", i));
            mgr.save("s1", &format!("a{}", i), if i == 4 { 350 } else { 10 });
        }

        let conversation = mgr.conversation("s1").unwrap();
        // Pairs removed whole: odd length, system first, then user/assistant
        assert!(conversation.len() % 2 == 1);
        assert_eq!(conversation[0].role, "system");
        for pair in conversation[1..].chunks(2) {
            assert_eq!(pair[0].role, "user");
            assert_eq!(pair[1].role, "assistant");
        }
    }

    #[test]
    fn test_zero_budget_falls_back() {
        let mgr = SessionManager::new(&SessionConfig {
            max_tokens: 0,
            ..SessionConfig::default()
        });
        assert_eq!(mgr.max_tokens, 1024);
    }

    #[test]
    fn test_concurrent_same_session_appends_both_survive() {
        use std::sync::Arc;

        let mgr = Arc::new(manager());
        let mut handles = Vec::new();
        for i in 0..8 {
            let mgr = Arc::clone(&mgr);
            handles.push(std::thread::spawn(move || {
                mgr.build_query("shared", &format!("msg-{}", i));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let conversation = mgr.conversation("shared").unwrap();
        // One system message plus every user message, none lost
        assert_eq!(conversation.len(), 9);
        for i in 0..8 {
            let expected = format!("msg-{}", i);
            assert!(conversation.iter().any(|m| m.content == expected));
        }
    }
}
