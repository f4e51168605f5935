//! Completion client: rate limiting, retry, and local recovery
//!
//! Wraps the provider call with the outbound token-bucket gate and the
//! per-kind failure policy. Every path out of [`CompletionClient::complete`]
//! is a displayable reply; failures are recovered locally and marked with
//! `completion_tokens == 0` so the caller knows not to persist the turn.

use crate::config::Config;
use crate::providers::{Completion, CompletionError, Message, Provider};
use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Reply when the local bucket is exhausted or the remote limit persists
pub const THROTTLED_REPLY: &str =
    "You're asking too quickly. Take a short break and ask me again.";

/// Reply when the remote endpoint cannot be reached
pub const CONNECTIVITY_REPLY: &str =
    "I can't reach the network right now. Please check the connection and try again.";

/// Reply when the remote call times out
pub const TIMEOUT_REPLY: &str = "I didn't get your message in time. Please ask me again.";

/// Reply for unclassified failures, after the defensive session reset
pub const RETRY_REPLY: &str = "Something went wrong on my side. Please ask me that again.";

/// Number of retries granted to a remotely rate-limited call
const MAX_RETRIES: u32 = 1;

/// Issues remote completion calls with bounded retry and local fallback
///
/// Holds the process-wide rate limiter (when enabled) and a handle to the
/// session manager so an unclassified failure can reset the presumed
/// corrupted session. The retry sleep happens outside any lock.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    sessions: Arc<SessionManager>,
    limiter: Option<Mutex<RateLimiter>>,
    retry_backoff: Duration,
}

impl CompletionClient {
    /// Create a client from configuration
    ///
    /// Rate limiting is enabled only when `rate_limit.requests_per_minute`
    /// is positive.
    pub fn new(provider: Arc<dyn Provider>, sessions: Arc<SessionManager>, config: &Config) -> Self {
        let limiter = if config.rate_limit.requests_per_minute > 0 {
            tracing::info!(
                "Outbound rate limit enabled: {} requests/minute",
                config.rate_limit.requests_per_minute
            );
            Some(Mutex::new(RateLimiter::per_minute(
                config.rate_limit.requests_per_minute,
            )))
        } else {
            None
        };

        Self {
            provider,
            sessions,
            limiter,
            retry_backoff: Duration::from_secs(config.api.retry_backoff_seconds),
        }
    }

    /// Run one completion round-trip for a session
    ///
    /// Never fails: every outcome is a [`Completion`], either the remote
    /// reply with its usage counts or a canned fallback with
    /// `completion_tokens == 0`.
    ///
    /// Failure policy, by classified kind:
    /// - remote rate limit: one retry after the configured backoff, then
    ///   the throttling reply
    /// - connectivity: no retry, connectivity reply
    /// - timeout: no retry, timeout reply
    /// - anything else: no retry, the session's conversation is cleared
    ///   before the generic reply is returned
    pub async fn complete(&self, conversation: &[Message], session_id: &str) -> Completion {
        if let Some(limiter) = &self.limiter {
            if !limiter.lock().unwrap().try_acquire() {
                tracing::warn!("Local rate limit hit for session {}", session_id);
                return Completion::fallback(THROTTLED_REPLY);
            }
        }

        let mut retries = 0;
        loop {
            match self.provider.chat(conversation).await {
                Ok(completion) => return completion,
                Err(CompletionError::RateLimited(msg)) => {
                    tracing::warn!("Remote rate limit: {}", msg);
                    if retries < MAX_RETRIES {
                        retries += 1;
                        tracing::warn!("Retry {} after {:?}", retries, self.retry_backoff);
                        tokio::time::sleep(self.retry_backoff).await;
                        continue;
                    }
                    return Completion::fallback(THROTTLED_REPLY);
                }
                Err(CompletionError::Connectivity(msg)) => {
                    tracing::warn!("Connection failed: {}", msg);
                    return Completion::fallback(CONNECTIVITY_REPLY);
                }
                Err(CompletionError::Timeout(msg)) => {
                    tracing::warn!("Completion timed out: {}", msg);
                    return Completion::fallback(TIMEOUT_REPLY);
                }
                Err(CompletionError::Other(msg)) => {
                    // Conversation state is presumed corrupted: full reset
                    // rather than partial repair.
                    tracing::error!("Unclassified completion failure: {}", msg);
                    self.sessions.clear_session(session_id);
                    return Completion::fallback(RETRY_REPLY);
                }
            }
        }
    }
}
