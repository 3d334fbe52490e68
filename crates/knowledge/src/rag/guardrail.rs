//! Context sufficiency check and domain wording.

use crate::types::RetrievalResult;
use consult_core::config::DomainConfig;

/// Assembled context handed to the answer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Non-empty parts, retrieved first then extra documents
    pub parts: Vec<String>,
}

impl Context {
    /// Parts joined with a blank line.
    pub fn text(&self) -> String {
        self.parts.join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed(Context),
    Refuse(String),
}

/// Refuses when there is nothing to ground an answer on.
///
/// Topic restriction is not enforced here; the answer prompt carries it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardrailPolicy;

impl GuardrailPolicy {
    pub fn evaluate(&self, retrieved: &[RetrievalResult], extra_docs: &[String]) -> Decision {
        let parts: Vec<String> = retrieved
            .iter()
            .map(|r| r.text.as_str())
            .chain(extra_docs.iter().map(String::as_str))
            .filter(|part| !part.trim().is_empty())
            .map(str::to_string)
            .collect();

        if parts.is_empty() {
            Decision::Refuse("empty context".to_string())
        } else {
            Decision::Proceed(Context { parts })
        }
    }
}

/// Domain wording used in refusals and the answer instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    name: String,
    topics: Vec<String>,
}

impl DomainScope {
    pub fn new(name: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            name: name.into(),
            topics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed answer when the guardrail refuses.
    pub fn refusal(&self) -> String {
        format!(
            "Sorry, as a {} Consultant, your question is not within my scope.",
            self.name
        )
    }

    /// Exact phrase the model must give for off-topic questions.
    pub fn out_of_scope_phrase(&self) -> String {
        format!(
            "I'm only specialized in giving {} consulting answers.",
            self.name.to_lowercase()
        )
    }

    /// Topics as an English list: "a, b, and c".
    pub fn topics_phrase(&self) -> String {
        match self.topics.as_slice() {
            [] => format!("{} consulting", self.name.to_lowercase()),
            [one] => one.clone(),
            [first, second] => format!("{} and {}", first, second),
            [init @ .., last] => format!("{}, and {}", init.join(", "), last),
        }
    }
}

impl From<&DomainConfig> for DomainScope {
    fn from(config: &DomainConfig) -> Self {
        Self::new(config.name.clone(), config.topics.clone())
    }
}
