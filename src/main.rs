//! chatgate - session-aware conversational gateway CLI
//!
//! Main entry point: tracing setup, configuration loading, and command
//! dispatch.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatgate::cli::{Cli, Commands};
use chatgate::config::Config;
use chatgate::repl;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Commands::Chat { session } => {
            tracing::info!("Starting interactive chat");
            repl::run_chat(config, session).await?;
        }
        Commands::Reply { session, message } => {
            repl::run_reply(config, session, message).await?;
        }
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "chatgate=debug"
    } else {
        "chatgate=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
