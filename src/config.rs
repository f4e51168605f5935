//! Configuration management for chatgate
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file, with per-field defaults so a partial file is enough.

use crate::error::{ChatgateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for chatgate
///
/// Holds everything the gateway needs: remote API settings, session and
/// truncation behavior, and the outbound rate limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote completion API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session store and truncation settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Outbound request rate limit settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Remote completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the chat-completions endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API credential; may also come from the CHATGATE_API_KEY environment variable
    #[serde(default)]
    pub api_key: String,

    /// Model to request completions from
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Backoff before the single retry after a remote rate limit (seconds)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_seconds: u64,

    /// Fixed sampling parameters passed through on every request
    #[serde(default)]
    pub sampling: SamplingConfig,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retry_backoff() -> u64 {
    5
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_model(),
            timeout_seconds: default_timeout(),
            retry_backoff_seconds: default_retry_backoff(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// Fixed sampling parameters for the completion call
///
/// These are pass-through constants, not part of the session contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Sampling temperature, in [0, 2]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Frequency penalty, in [-2, 2]
    #[serde(default)]
    pub frequency_penalty: f32,

    /// Presence penalty, in [-2, 2]
    #[serde(default)]
    pub presence_penalty: f32,
}

fn default_temperature() -> f32 {
    0.6
}

fn default_top_p() -> f32 {
    1.0
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Session store and truncation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle seconds before a session expires; 0 or negative disables expiry
    #[serde(default = "default_expires_in")]
    pub expires_in_seconds: i64,

    /// Token budget a conversation is truncated down to; 0 falls back to 1024
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// System prompt seeded at position 0 of every new conversation
    #[serde(default = "default_character_desc")]
    pub character_desc: String,

    /// Exact user input that clears the current session
    #[serde(default = "default_clear_command")]
    pub clear_command: String,

    /// Exact user input that clears every session
    #[serde(default = "default_clear_all_command")]
    pub clear_all_command: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_max_tokens() -> usize {
    1000
}

fn default_character_desc() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_clear_command() -> String {
    "#clear".to_string()
}

fn default_clear_all_command() -> String {
    "#clear_all".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in_seconds: default_expires_in(),
            max_tokens: default_max_tokens(),
            character_desc: default_character_desc(),
            clear_command: default_clear_command(),
            clear_all_command: default_clear_all_command(),
        }
    }
}

/// Outbound rate limit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per minute; 0 disables rate limiting entirely
    #[serde(default)]
    pub requests_per_minute: u32,
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// A missing file yields the built-in defaults with a warning, so the
    /// binary can run with nothing but environment variables. The
    /// `CHATGATE_API_KEY` environment variable overrides `api.api_key`
    /// whenever it is set.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                ChatgateError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            serde_yaml::from_str::<Config>(&contents).map_err(|e| {
                ChatgateError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Config::default()
        };

        if let Ok(key) = std::env::var("CHATGATE_API_KEY") {
            if !key.is_empty() {
                config.api.api_key = key;
            }
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ChatgateError::Config` if a required field is missing or a
    /// numeric field is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.is_empty() {
            return Err(ChatgateError::Config(
                "api.api_key is required (or set CHATGATE_API_KEY)".to_string(),
            )
            .into());
        }

        if self.api.model.is_empty() {
            return Err(ChatgateError::Config("api.model must not be empty".to_string()).into());
        }

        if !(0.0..=2.0).contains(&self.api.sampling.temperature) {
            return Err(ChatgateError::Config(format!(
                "api.sampling.temperature must be in [0, 2], got {}",
                self.api.sampling.temperature
            ))
            .into());
        }

        if self.session.clear_command == self.session.clear_all_command {
            return Err(ChatgateError::Config(
                "session.clear_command and session.clear_all_command must differ".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
