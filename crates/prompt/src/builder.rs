//! Prompt builder for rendering templates.

use crate::builtin::{builtin_prompt, ANSWER_PROMPT_ID, REWRITE_PROMPT_ID};
use crate::loader::resolve_prompt;
use crate::types::{BuiltPrompt, PromptDefinition};
use consult_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;
use std::path::Path;

/// Build a prompt from a definition and input variables.
///
/// # Example
/// ```no_run
/// use consult_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is a franchise fee?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("Prompt: {}", built.text);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for name in &definition.variables {
        if !variables.contains_key(name) {
            tracing::warn!(prompt = %definition.id, variable = %name, "Template variable not supplied");
        }
    }

    let text = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(text, definition.id.clone(), variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// The two prompts the query pipeline needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    rewrite: PromptDefinition,
    answer: PromptDefinition,
}

impl PromptLibrary {
    /// Built-in definitions only.
    pub fn builtin() -> AppResult<Self> {
        let get = |id: &str| -> AppResult<PromptDefinition> {
            builtin_prompt(id)?
                .ok_or_else(|| AppError::Prompt(format!("Missing built-in prompt: {}", id)))
        };
        Ok(Self {
            rewrite: get(REWRITE_PROMPT_ID)?,
            answer: get(ANSWER_PROMPT_ID)?,
        })
    }

    /// Resolve both prompts, preferring overrides in `prompts_dir`.
    pub fn load(prompts_dir: &Path) -> AppResult<Self> {
        Ok(Self {
            rewrite: resolve_prompt(prompts_dir, REWRITE_PROMPT_ID)?,
            answer: resolve_prompt(prompts_dir, ANSWER_PROMPT_ID)?,
        })
    }

    pub fn rewrite(&self) -> &PromptDefinition {
        &self.rewrite
    }

    pub fn answer(&self) -> &PromptDefinition {
        &self.answer
    }
}
