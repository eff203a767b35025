//! Ask command handler.
//!
//! Answers one question through the full retrieval pipeline.

use super::{build_pipeline, print_json};
use clap::Args;
use policybot_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Print the passages the answer was based on
    #[arg(long)]
    pub sources: bool,

    /// Output as JSON (answer, queries, fused scores, context)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;
        let pipeline = build_pipeline(config)?;
        let result = pipeline.answer(&question).await?;

        if self.json {
            return print_json(&result);
        }

        println!("{}", result.answer);

        if self.sources && !result.context.is_empty() {
            println!();
            println!("Sources:");
            for (i, passage) in result.context.iter().enumerate() {
                println!("  [{}] {}", i + 1, passage.text().trim());
            }
        }

        tracing::debug!(
            "Searched {} queries, fused {} passages",
            result.queries.len(),
            result.fused.len()
        );

        Ok(())
    }

    fn get_question(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }

        if let Some(ref path) = self.file {
            return std::fs::read_to_string(path)
                .map_err(|e| AppError::Input(format!("Failed to read {:?}: {}", path, e)));
        }

        Err(AppError::Input("No question provided".to_string()))
    }
}
