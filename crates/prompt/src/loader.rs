//! Prompt loader for YAML prompt definitions.

use crate::builtin::builtin_prompt;
use crate::types::PromptDefinition;
use consult_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID from a prompts directory.
///
/// Looks for a file named `<id>.yml` in `prompts_dir`
/// (normally `<workspace>/.consult/prompts/`).
///
/// # Example
/// ```no_run
/// use consult_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".consult/prompts"), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition, prompt_id)?;

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve a prompt: workspace override first, then the built-in.
pub fn resolve_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if prompts_dir.join(format!("{}.yml", prompt_id)).exists() {
        return load_prompt(prompts_dir, prompt_id);
    }

    builtin_prompt(prompt_id)?
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition, expected_id: &str) -> AppResult<()> {
    if def.id != expected_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {}.yml declares id '{}'",
            expected_id, def.id
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Simple "x.y" check
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
    use crate::builtin::{ANSWER_PROMPT_ID, REWRITE_PROMPT_ID};
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, file_id: &str, declared_id: &str) {
        fs::create_dir_all(dir).unwrap();
        let content = format!(
            r#"
id: {}
title: "Override"
apiVersion: "1.0"
template: "Short answer please: {{{{question}}}}"
"#,
            declared_id
        );
        fs::write(dir.join(format!("{}.yml", file_id)), content).unwrap();
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), ANSWER_PROMPT_ID, ANSWER_PROMPT_ID);

        let prompt = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Override");
        assert_eq!(prompt.template, "Short answer please: {{question}}");
    }

    #[test]
    fn test_id_mismatch_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), ANSWER_PROMPT_ID, "something.else");

        let result = load_prompt(temp_dir.path(), ANSWER_PROMPT_ID);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.yml"), "invalid: yaml: content:").unwrap();

        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }

    #[test]
    fn test_resolve_prefers_override() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), ANSWER_PROMPT_ID, ANSWER_PROMPT_ID);

        let answer = resolve_prompt(temp_dir.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(answer.title, "Override");

        let rewrite = resolve_prompt(temp_dir.path(), REWRITE_PROMPT_ID).unwrap();
        assert_eq!(rewrite.id, REWRITE_PROMPT_ID);
        assert_ne!(rewrite.title, "Override");
    }

    #[test]
    fn test_resolve_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(resolve_prompt(temp_dir.path(), "nope").is_err());
    }
}
