//! Configuration management for Consult.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - `.env` file (loaded into the process environment)
//! - YAML config file (`.consult/config.yaml` or `CONSULT_CONFIG`)
//! - Environment variables (`CONSULT_*`)
//! - Command-line flags
//!
//! The configuration is workspace-centric: relative paths (such as the vector
//! store directory) resolve against the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers known to the LLM crate.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "gemini"];

/// Embedding providers known to the knowledge crate.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .consult/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub domain: DomainConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
}

/// Topic the assistant is restricted to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DomainConfig {
    /// Display name used in refusal phrases (e.g. "Franchise")
    pub name: String,

    /// Subjects the assistant may answer about
    pub topics: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            name: "Franchise".to_string(),
            topics: vec![
                "franchises".to_string(),
                "franchising".to_string(),
                "business consulting".to_string(),
            ],
        }
    }
}

/// Durable vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Store directory; relative paths resolve against the workspace
    pub path: PathBuf,

    /// Documents embedded per batch during `add`
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/vector_store"),
            batch_size: 100,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "trigram" (offline, deterministic) or "ollama"
    pub provider: String,

    pub model: String,

    pub dimensions: usize,

    /// Endpoint for HTTP-backed providers
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Generation provider wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider behind the PRIMARY slot
    pub primary: String,

    /// Provider behind the SECONDARY slot
    pub secondary: String,

    /// Provider-specific configurations keyed by provider name
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "ollama".to_string(),
            ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "mistral".to_string(),
                timeout: Some(120),
            },
        );
        providers.insert(
            "gemini".to_string(),
            ProviderConfig::Gemini {
                api_key_env: "GEMINI_API_KEY".to_string(),
                model: "gemini-1.5-pro".to_string(),
                endpoint: None,
            },
        );

        Self {
            primary: "ollama".to_string(),
            secondary: "gemini".to_string(),
            providers,
        }
    }
}

/// Provider-specific configuration.
///
/// Variant order matters for untagged matching: `Gemini` requires
/// `apiKeyEnv`, so it is tried before the looser `Ollama` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model identifier for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }

    /// Mutable access to the model identifier.
    pub fn model_mut(&mut self) -> &mut String {
        match self {
            Self::Gemini { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }
}

/// Sampling defaults applied to every generation call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            repeat_penalty: 1.1,
            max_tokens: None,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Documents retrieved per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Ingestion chunking settings (characters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    domain: Option<DomainConfig>,
    store: Option<StoreConfig>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    generation: Option<GenerationSettings>,
    retrieval: Option<RetrievalConfig>,
    ingest: Option<IngestConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            domain: DomainConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            generation: GenerationSettings::default(),
            retrieval: RetrievalConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `CONSULT_WORKSPACE`: Override workspace path
    /// - `CONSULT_CONFIG`: Path to config file
    /// - `CONSULT_DOMAIN`: Domain display name
    /// - `CONSULT_STORE_DIR`: Vector store directory
    /// - `CONSULT_PRIMARY_PROVIDER` / `CONSULT_SECONDARY_PROVIDER`
    /// - `CONSULT_MODEL`: Model for the primary provider
    /// - `CONSULT_EMBEDDING_PROVIDER` / `CONSULT_EMBEDDING_MODEL`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use consult_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.store_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with workspace and config file chosen by the
    /// caller taking precedence over `CONSULT_WORKSPACE` / `CONSULT_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env is normal
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        let mut config = Self::default();

        let env_path = |key: &str| std::env::var(key).ok().map(PathBuf::from);

        if let Some(workspace) = workspace.or_else(|| env_path("CONSULT_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("CONSULT_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.consult_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(domain) = std::env::var("CONSULT_DOMAIN") {
            self.domain.name = domain;
        }

        if let Ok(dir) = std::env::var("CONSULT_STORE_DIR") {
            self.store.path = PathBuf::from(dir);
        }

        if let Ok(provider) = std::env::var("CONSULT_PRIMARY_PROVIDER") {
            self.llm.primary = provider;
        }

        if let Ok(provider) = std::env::var("CONSULT_SECONDARY_PROVIDER") {
            self.llm.secondary = provider;
        }

        if let Ok(model) = std::env::var("CONSULT_MODEL") {
            let primary = self.llm.primary.clone();
            if let Some(provider) = self.llm.providers.get_mut(&primary) {
                *provider.model_mut() = model;
            }
        }

        if let Ok(provider) = std::env::var("CONSULT_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("CONSULT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(domain) = file.domain {
            result.domain = domain;
        }
        if let Some(store) = file.store {
            result.store = store;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(llm) = file.llm {
            // Providers merge per key so a file may override just one
            let mut providers = result.llm.providers;
            providers.extend(llm.providers);
            result.llm = LlmSettings {
                primary: llm.primary,
                secondary: llm.secondary,
                providers,
            };
        }
        if let Some(generation) = file.generation {
            result.generation = generation;
        }
        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(ingest) = file.ingest {
            result.ingest = ingest;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .consult directory.
    pub fn consult_dir(&self) -> PathBuf {
        self.workspace.join(".consult")
    }

    /// Directory holding workspace prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.consult_dir().join("prompts")
    }

    /// Resolved vector store directory.
    pub fn store_dir(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            self.workspace.join(&self.store.path)
        }
    }

    /// Get a provider's configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(provider)
    }

    /// Resolve a provider's API key from its configured environment variable.
    ///
    /// Returns `None` for providers that need no key or when the variable is unset.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        match self.get_provider_config(provider)? {
            ProviderConfig::Gemini { api_key_env, .. } => std::env::var(api_key_env)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    /// Validate the configuration.
    ///
    /// A missing API key is not a configuration error: the affected provider
    /// reports `GenerationUnavailable` when it is selected.
    pub fn validate(&self) -> AppResult<()> {
        if self.domain.name.trim().is_empty() {
            return Err(AppError::Config("Domain name cannot be empty".to_string()));
        }

        for provider in [&self.llm.primary, &self.llm.secondary] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }

        if self.get_provider_config(&self.llm.primary).is_none() {
            return Err(AppError::Config(format!(
                "No configuration for primary provider '{}'",
                self.llm.primary
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.store.batch_size == 0 {
            return Err(AppError::Config(
                "Store batch size must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "Retrieval top_k must be greater than zero".to_string(),
            ));
        }

        if self.ingest.chunk_size == 0 || self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "Invalid chunking: size {} overlap {} (overlap must be smaller than size)",
                self.ingest.chunk_size, self.ingest.chunk_overlap
            )));
        }

        Ok(())
    }
}
