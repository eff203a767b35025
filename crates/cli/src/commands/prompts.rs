//! Prompts command handler.

use super::print_json;
use clap::Args;
use policybot_core::{config::AppConfig, AppResult};
use policybot_prompt::{list_prompts, load_prompt};

/// List available prompts
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Show the resolved definition of one prompt
    #[arg(long)]
    pub show: Option<String>,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(ref id) = self.show {
            let definition = load_prompt(&config.workspace, id)?;
            return print_json(&definition);
        }

        for id in list_prompts(&config.workspace)? {
            let override_path = config
                .policybot_dir()
                .join("prompts")
                .join(format!("{}.yml", id));
            let origin = if override_path.exists() {
                "workspace"
            } else {
                "built-in"
            };
            println!("{:<16} {}", id, origin);
        }

        Ok(())
    }
}

