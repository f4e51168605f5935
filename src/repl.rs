//! Interactive chat loop
//!
//! Readline-based front-end that submits each line to the bot under a
//! single session id. The configured clear commands work here like
//! anywhere else; `exit` and `quit` leave the loop.

use crate::bot::{ChatBot, ReplyContext};
use crate::config::Config;
use crate::error::Result;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Run the interactive chat loop until EOF, interrupt, or `exit`
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `session` - Session id for the whole run; defaults to "local"
pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
    let bot = ChatBot::new(&config)?;
    let context = ReplyContext::text(session.unwrap_or_else(|| "local".to_string()));

    let mut rl = DefaultEditor::new()?;

    println!(
        "{}",
        format!(
            "chatgate ready (model {}, session {}). Type 'exit' to leave.",
            config.api.model, context.session_id
        )
        .cyan()
    );

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }

                rl.add_history_entry(trimmed)?;

                let reply = bot.reply(trimmed, &context).await;
                if !reply.is_empty() {
                    println!("{}", reply.green());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }

    println!("{}", "Goodbye.".cyan());
    Ok(())
}

/// Send a single message and print the reply
pub async fn run_reply(config: Config, session: Option<String>, message: String) -> Result<()> {
    let bot = ChatBot::new(&config)?;
    let context = ReplyContext::text(session.unwrap_or_else(|| "local".to_string()));

    let reply = bot.reply(&message, &context).await;
    println!("{}", reply);
    Ok(())
}
