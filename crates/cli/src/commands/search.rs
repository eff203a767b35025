//! Search command handler.
//!
//! Runs retrieval and fusion only, for inspecting what the answer step would see.

use super::{build_pipeline, print_json};
use clap::Args;
use policybot_core::{config::AppConfig, AppResult};

/// Show fused retrieval results without generating an answer
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// The question to search for
    pub query: String,

    /// Search the question as-is, without expansion
    #[arg(long)]
    pub no_expand: bool,

    /// Number of fused passages to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");
        tracing::debug!("Search options: {:?}", self);

        let pipeline = build_pipeline(config)?;
        let mut retrieval = if self.no_expand {
            pipeline.retrieve_direct(&self.query).await?
        } else {
            pipeline.retrieve(&self.query).await?
        };
        retrieval.fused.truncate(self.limit);

        if self.json {
            return print_json(&retrieval);
        }

        println!("Queries:");
        for query in &retrieval.queries {
            println!("  - {}", query);
        }

        if retrieval.fused.is_empty() {
            println!("\nNo passages found.");
            return Ok(());
        }

        println!("\nResults:");
        for (i, scored) in retrieval.fused.iter().enumerate() {
            println!(
                "{:>3}. [{:.5}] {}",
                i + 1,
                scored.score,
                preview(scored.passage.text(), 160)
            );
        }

        Ok(())
    }
}

/// First `max_chars` characters on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}
