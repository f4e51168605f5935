//! Top-level reply flow
//!
//! `ChatBot` ties the pieces together: clear-command handling and query
//! building in the session layer, the gated/retried remote call, and the
//! persistence decision driven by the completion-token marker.

use crate::client::CompletionClient;
use crate::config::Config;
use crate::error::Result;
use crate::providers::{OpenAiProvider, Provider};
use crate::session::{QueryOutcome, SessionManager};
use std::sync::Arc;

/// Acknowledgement returned when one session's history is cleared
pub const SESSION_CLEARED_REPLY: &str = "Session cleared.";

/// Acknowledgement returned when every session's history is cleared
pub const ALL_SESSIONS_CLEARED_REPLY: &str = "All session history cleared.";

/// Kind of inbound request
///
/// Only text is handled by this layer; other kinds pass through as
/// empty replies for the caller to deal with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextKind {
    /// Plain text utterance
    #[default]
    Text,
    /// Anything else (out of scope here)
    Other,
}

/// Per-request context accompanying a user utterance
#[derive(Debug, Clone)]
pub struct ReplyContext {
    /// Kind of the request; absent means text
    pub kind: Option<ContextKind>,
    /// Opaque session identifier
    pub session_id: String,
    /// Streaming flag, accepted and currently ignored
    pub stream: bool,
}

impl ReplyContext {
    /// Shorthand for a plain text request on a session
    pub fn text(session_id: impl Into<String>) -> Self {
        Self {
            kind: Some(ContextKind::Text),
            session_id: session_id.into(),
            stream: false,
        }
    }
}

/// The conversational gateway itself
///
/// One instance serves every session; handles are shared across
/// concurrent callers by cloning the inner `Arc`s.
pub struct ChatBot {
    sessions: Arc<SessionManager>,
    client: CompletionClient,
}

impl ChatBot {
    /// Create a bot backed by the configured OpenAI-compatible endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP provider cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let provider = Arc::new(OpenAiProvider::new(&config.api)?);
        Ok(Self::with_provider(provider, config))
    }

    /// Create a bot with an injected provider (used by tests)
    pub fn with_provider(provider: Arc<dyn Provider>, config: &Config) -> Self {
        let sessions = Arc::new(SessionManager::new(&config.session));
        let client = CompletionClient::new(provider, Arc::clone(&sessions), config);
        Self { sessions, client }
    }

    /// Produce a reply for a user utterance
    ///
    /// The returned string is always displayable: a model reply, a
    /// clear-command acknowledgement, or a canned recovery message. The
    /// turn is persisted into the session history only when the
    /// completion reports a positive completion-token count.
    pub async fn reply(&self, query: &str, context: &ReplyContext) -> String {
        if matches!(context.kind, Some(ContextKind::Other)) {
            tracing::debug!("Ignoring non-text request for {}", context.session_id);
            return String::new();
        }

        tracing::info!("Query for session {}: {}", context.session_id, query);

        let conversation = match self.sessions.build_query(&context.session_id, query) {
            QueryOutcome::SessionCleared => return SESSION_CLEARED_REPLY.to_string(),
            QueryOutcome::AllSessionsCleared => return ALL_SESSIONS_CLEARED_REPLY.to_string(),
            QueryOutcome::Query(conversation) => conversation,
        };

        let completion = self.client.complete(&conversation, &context.session_id).await;
        if completion.completion_tokens > 0 {
            self.sessions
                .save(&context.session_id, &completion.content, completion.total_tokens);
        }

        completion.content
    }

    /// Handle to the session manager (status displays, tests)
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}
