//! Prompt system for policybot.
//!
//! - YAML prompt definitions, built in or overridden per workspace
//! - Handlebars rendering of system and user templates

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, ANSWER_PROMPT_ID, EXPAND_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
