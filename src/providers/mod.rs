//! Provider abstraction and common types for chatgate
//!
//! This module defines the message and completion types shared between the
//! session layer and the remote API, the closed classification of remote
//! failures, and the `Provider` trait the completion client calls through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiProvider;

/// A single role-tagged message in a conversation
///
/// Immutable once appended to a session's history. The role is one of
/// `system`, `user`, or `assistant`; the serialized form matches the
/// chat-completions wire format directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatgate::providers::Message;
    ///
    /// let msg = Message::system("You are a helpful assistant.");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatgate::providers::Message;
    ///
    /// let msg = Message::user("Hello!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Result of a completion attempt, successful or recovered
///
/// `completion_tokens == 0` marks a locally generated fallback reply that
/// must not be persisted into the session history; anything greater means
/// the content came from the remote model and should be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Reply text to hand back to the user
    pub content: String,
    /// Tokens the model spent on the reply; 0 for canned fallbacks
    pub completion_tokens: usize,
    /// Total tokens reported for the call; drives truncation
    pub total_tokens: usize,
}

impl Completion {
    /// Wrap a locally generated fallback reply
    ///
    /// # Examples
    ///
    /// ```
    /// use chatgate::providers::Completion;
    ///
    /// let c = Completion::fallback("try again later");
    /// assert_eq!(c.completion_tokens, 0);
    /// ```
    pub fn fallback(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            completion_tokens: 0,
            total_tokens: 0,
        }
    }
}

/// Classified remote-call failure
///
/// A closed set of kinds so callers switch on variants instead of matching
/// on exception identity. Each variant maps to one recovery policy in
/// [`crate::client::CompletionClient`]: one bounded retry for
/// `RateLimited`, plain canned replies for `Connectivity` and `Timeout`,
/// and a defensive session reset for `Other`.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The remote service rejected the call with its own rate limit
    #[error("Remote rate limit: {0}")]
    RateLimited(String),

    /// The remote endpoint could not be reached
    #[error("Connection failed: {0}")]
    Connectivity(String),

    /// The call exceeded the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Anything else: unexpected status, malformed body, transport oddity
    #[error("Completion failed: {0}")]
    Other(String),
}

/// Provider trait for remote completion backends
///
/// The completion client drives every remote call through this seam, which
/// keeps the retry/classification logic testable against scripted
/// implementations.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Submit the full conversation and return the model's reply with usage
    ///
    /// # Errors
    ///
    /// Returns a [`CompletionError`] classifying why the call failed.
    async fn chat(&self, messages: &[Message]) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_system() {
        let msg = Message::system("Stay in character");
        assert_eq!(msg.role, "system");
        assert_eq!(msg.content, "Stay in character");
    }

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_message_assistant() {
        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Test");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Test"}"#);
    }

    #[test]
    fn test_completion_fallback_has_zero_tokens() {
        let c = Completion::fallback("canned");
        assert_eq!(c.completion_tokens, 0);
        assert_eq!(c.total_tokens, 0);
        assert_eq!(c.content, "canned");
    }

    #[test]
    fn test_completion_error_display() {
        let e = CompletionError::RateLimited("429".to_string());
        assert_eq!(e.to_string(), "Remote rate limit: 429");
        let e = CompletionError::Connectivity("refused".to_string());
        assert_eq!(e.to_string(), "Connection failed: refused");
        let e = CompletionError::Timeout("deadline".to_string());
        assert_eq!(e.to_string(), "Request timed out: deadline");
        let e = CompletionError::Other("500".to_string());
        assert_eq!(e.to_string(), "Completion failed: 500");
    }

    #[test]
    fn test_completion_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompletionError>();
    }
}
