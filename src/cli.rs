//! Command-line interface definition for chatgate
//!
//! This module defines the CLI structure using clap's derive API,
//! providing an interactive chat command and a one-shot reply command.

use clap::{Parser, Subcommand};

/// chatgate - session-aware conversational gateway
///
/// Talk to a remote chat-completion API with bounded per-session history,
/// outbound rate limiting, and classified failure recovery.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chatgate
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Session identifier; defaults to "local"
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the reply
    Reply {
        /// Session identifier; defaults to "local"
        #[arg(short, long)]
        session: Option<String>,

        /// The message to send
        message: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
