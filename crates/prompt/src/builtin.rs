//! Built-in prompt definitions.
//!
//! These ship with the binary and are used whenever the workspace does not
//! provide an override of the same id.

use crate::types::PromptDefinition;
use consult_core::{AppError, AppResult};

/// Turns a follow-up question plus transcript into a standalone query.
pub const REWRITE_PROMPT_ID: &str = "rag.rewrite";

/// Answers a question from retrieved context, restricted to the domain.
pub const ANSWER_PROMPT_ID: &str = "rag.answer";

const REWRITE_YAML: &str = r#"
id: rag.rewrite
title: Standalone question rewrite
apiVersion: "1.0"
createdBy: consult
behavior:
  tone: neutral
  style: concise
variables: [transcript, question]
template: |-
  Given the following conversation and a follow-up question, rephrase the follow-up question to be a standalone question. This standalone question can then be used to perform a relevant search.

  Conversation History:
  {{transcript}}

  Follow-up Question: {{question}}

  Standalone Question:
output:
  format: text
"#;

const ANSWER_YAML: &str = r#"
id: rag.answer
title: Domain consultant answer
apiVersion: "1.0"
createdBy: consult
behavior:
  tone: professional
  style: concise
variables: [transcript, domain, topics, refusal, context, question]
template: |-
  You are a helpful assistant. Here is the previous conversation history:
  {{transcript}}

  As a {{domain}} Consultant, you ONLY answer questions related to {{topics}}.
  If the user asks something unrelated, respond with exactly:
  "{{refusal}}"

  Context:
  {{context}}

  Question:
  {{question}}
output:
  format: text
"#;

/// Look up a built-in definition by id.
pub fn builtin_prompt(id: &str) -> AppResult<Option<PromptDefinition>> {
    let yaml = match id {
        REWRITE_PROMPT_ID => REWRITE_YAML,
        ANSWER_PROMPT_ID => ANSWER_YAML,
        _ => return Ok(None),
    };

    let definition = serde_yaml::from_str(yaml).map_err(|e| {
        AppError::Prompt(format!("Built-in prompt '{}' is malformed: {}", id, e))
    })?;

    Ok(Some(definition))
}
