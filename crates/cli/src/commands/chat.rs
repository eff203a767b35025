//! Chat command handler.
//!
//! Line-oriented conversation on stdin/stdout. A failed turn prints a short
//! apology and the conversation carries on.

use super::build_pipeline;
use clap::Args;
use policybot_core::{config::AppConfig, AppError, AppResult};
use policybot_rag::ConversationSession;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEGRADED_REPLY: &str =
    "Sorry, I could not answer that right now. Please try again in a moment.";

/// Interactive conversation
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Print the passages behind each answer
    #[arg(long)]
    pub sources: bool,
}

enum Input<'a> {
    Quit,
    History,
    Question(&'a str),
    Blank,
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/quit" | "/exit" => Input::Quit,
        "/history" => Input::History,
        question => Input::Question(question),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat session");

        let pipeline = build_pipeline(config)?;
        let mut session = ConversationSession::new(config.retrieval.greeting.clone());
        tracing::debug!(session = %session.id(), "Session created");

        println!("{}", session.greeting());
        println!("(type /history to review the conversation, /quit to leave)");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match classify(&line) {
                Input::Blank => continue,
                Input::Quit => break,
                Input::History => print_history(&session),
                Input::Question(question) => match session.submit_turn(&pipeline, question).await {
                    Ok(answer) => {
                        println!("{}", answer.answer);
                        if self.sources {
                            for (i, passage) in answer.context.iter().enumerate() {
                                println!("  [{}] {}", i + 1, passage.text().trim());
                            }
                        }
                    }
                    Err(e @ AppError::Input(_)) => println!("{}", e),
                    Err(e) => {
                        tracing::warn!("Turn failed: {}", e);
                        println!("{}", DEGRADED_REPLY);
                    }
                },
            }
        }

        tracing::info!(turns = session.turn_count(), "Chat session ended");
        Ok(())
    }
}

fn print_history(session: &ConversationSession) {
    for turn in session.turns() {
        if let Some(question) = turn.question {
            println!("[{}] you: {}", question.at.format("%H:%M:%S"), question.text);
        }
        println!("[{}] bot: {}", turn.answer.at.format("%H:%M:%S"), turn.answer.text);
    }
}
