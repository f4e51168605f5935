//! chatgate - session-aware conversational gateway library
//!
//! This library provides a conversational front-end over a remote
//! chat-completion API: bounded per-session history with idle expiry,
//! token-budget truncation, outbound rate limiting, and classified
//! recovery of remote failures.
//!
//! # Architecture
//!
//! - `store`: key/value map with idle-TTL expiry backing the sessions
//! - `session`: per-session conversation state and the truncation algorithm
//! - `rate_limit`: token-bucket gate on outbound requests
//! - `providers`: message types and the remote completion seam
//! - `client`: retry/fallback policy around the remote call
//! - `bot`: the reply flow tying it together
//! - `config`, `cli`, `error`, `repl`: wiring for the binary
//!
//! # Example
//!
//! ```no_run
//! use chatgate::{ChatBot, Config, ReplyContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let bot = ChatBot::new(&config)?;
//!     let reply = bot.reply("Hello!", &ReplyContext::text("demo")).await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod rate_limit;
pub mod repl;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use bot::{ChatBot, ContextKind, ReplyContext};
pub use client::CompletionClient;
pub use config::Config;
pub use error::{ChatgateError, Result};
pub use providers::{Completion, CompletionError, Message, Provider};
pub use session::{QueryOutcome, SessionManager};
