//! Prompt loader.
//!
//! Definitions come from `.policybot/prompts/<id>.yml` in the workspace when
//! present, otherwise from the built-in set compiled into the binary.

use crate::types::PromptDefinition;
use policybot_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Prompt used to expand one question into several search queries.
pub const EXPAND_PROMPT_ID: &str = "rag.expand";

/// Prompt used to compose the final answer from retrieved context.
pub const ANSWER_PROMPT_ID: &str = "rag.answer";

const BUILTIN_PROMPTS: [(&str, &str); 2] = [
    (EXPAND_PROMPT_ID, include_str!("../prompts/rag.expand.yml")),
    (ANSWER_PROMPT_ID, include_str!("../prompts/rag.answer.yml")),
];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".policybot").join("prompts")
}

/// Load a prompt definition by ID.
///
/// # Example
/// ```no_run
/// use policybot_prompt::{load_prompt, ANSWER_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ANSWER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    let definition = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        parse_prompt(&contents, &format!("{:?}", prompt_file))?
    } else {
        builtin_prompt(prompt_id)?
    };

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file for '{}' declares id '{}'",
            prompt_id, definition.id
        )));
    }

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);
    Ok(definition)
}

/// Built-in definition for an ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))?;

    parse_prompt(source, prompt_id)
}

/// List all available prompt IDs: built-ins plus workspace overrides.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, body: &str) {
        let prompts = prompts_dir(dir);
        fs::create_dir_all(&prompts).unwrap();
        fs::write(prompts.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_builtin_prompts_are_valid() {
        let expand = builtin_prompt(EXPAND_PROMPT_ID).unwrap();
        assert!(expand.template.contains("{{question}}"));
        assert!(expand.system.is_some());

        let answer = builtin_prompt(ANSWER_PROMPT_ID).unwrap();
        assert!(answer.template.contains("{{question}}"));
        assert!(answer.template.contains("{{context}}"));
        assert!(answer.template.contains("3-4 lines"));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, ANSWER_PROMPT_ID);
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            ANSWER_PROMPT_ID,
            r#"
id: rag.answer
title: Terse answer
apiVersion: "1.1"
template: "Q: {{question}} C: {{context}}"
output:
  format: text
"#,
        );

        let prompt = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Terse answer");
        assert!(prompt.system.is_none());
    }

    #[test]
    fn test_override_with_mismatched_id() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            EXPAND_PROMPT_ID,
            r#"
id: something.else
title: Wrong
apiVersion: "1.0"
template: "{{question}}"
output:
  format: lines
"#,
        );

        assert!(load_prompt(temp_dir.path(), EXPAND_PROMPT_ID).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "broken", "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_load_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            "custom.greeting",
            "id: custom.greeting\ntitle: Hi\napiVersion: \"1.0\"\ntemplate: hi\noutput:\n  format: text\n",
        );
        write_override(
            temp_dir.path(),
            ANSWER_PROMPT_ID,
            "id: rag.answer\ntitle: A\napiVersion: \"1.0\"\ntemplate: a\noutput:\n  format: text\n",
        );

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(
            prompts,
            vec![
                "custom.greeting".to_string(),
                ANSWER_PROMPT_ID.to_string(),
                EXPAND_PROMPT_ID.to_string(),
            ]
        );
    }
}
