//! Request, response and conversation types for the query pipeline.

use consult_llm::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Capitalized label used in prompt transcripts.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One prior turn of the conversation. Supplied per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            content: content.into(),
        }
    }
}

/// Render history as `"{Sender}: {content}"` lines, oldest first.
pub fn format_transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}\n", m.sender, m.content))
        .collect()
}

/// A document attached to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Decode as UTF-8, dropping invalid byte sequences.
    pub fn decode(&self) -> String {
        self.bytes
            .utf8_chunks()
            .map(|chunk| chunk.valid())
            .collect()
    }
}

/// One question to the consultant.
#[derive(Debug, Clone)]
pub struct RagRequest {
    pub query_text: String,
    pub uploads: Vec<Upload>,

    /// Persist uploads after a successful answer
    pub save: bool,

    pub chat_history: Vec<ChatMessage>,

    /// Overrides the configured retrieval depth
    pub top_k: Option<usize>,

    pub provider: Provider,
}

impl RagRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            uploads: Vec::new(),
            save: true,
            chat_history: Vec::new(),
            top_k: None,
            provider: Provider::default(),
        }
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.chat_history = history;
        self
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }
}

/// Terminal state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Answered,
    Refused,
}

/// Result of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,

    /// Context parts handed to the model, retrieved first then uploads
    pub context: Vec<String>,

    pub used_user_docs: bool,

    /// True only when uploads were actually persisted
    pub saved_user_docs: bool,

    pub outcome: Outcome,

    /// Query used for retrieval
    pub standalone_query: String,

    /// Non-fatal problem, e.g. uploads that could not be saved
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
}

/// Pipeline states, logged as each request advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Rewritten,
    Retrieved,
    Guarded,
    Answered,
    Refused,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Received => "received",
            RequestState::Rewritten => "rewritten",
            RequestState::Retrieved => "retrieved",
            RequestState::Guarded => "guarded",
            RequestState::Answered => "answered",
            RequestState::Refused => "refused",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub text: String,
}
