//! Configuration management for nucrag.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The workspace config file (`.nucrag/config.yaml`, or `NUCRAG_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Secrets are never stored in the config file. Provider sections name the
//! environment variables that hold API keys and endpoints.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".nucrag";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .nucrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chunking, embedding and ranking settings
    pub retrieval: RetrievalConfig,

    /// Language-model settings
    pub completion: CompletionConfig,

    /// Endpoints and credentials for every backend
    pub providers: ProvidersConfig,
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Embedding model name, e.g. "all-MiniLM-L6-v2"
    pub embedding_model: String,

    /// Words per chunk; the model's recommendation when unset
    pub chunk_size: Option<usize>,

    /// Words shared by consecutive chunks; the model's recommendation when unset
    pub overlap: Option<usize>,

    /// Minimum similarity, in percent, for a chunk to reach the prompt
    pub threshold_percent: f32,

    /// Directory for corpus and ranking CSV exports (disabled when unset)
    pub export_dir: Option<PathBuf>,

    /// SQLite file for extracted documents, relative to the workspace
    pub store_path: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            chunk_size: None,
            overlap: None,
            threshold_percent: 20.0,
            export_dir: None,
            store_path: PathBuf::from(STATE_DIR).join("documents.sqlite"),
        }
    }
}

/// Language-model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Backend name, e.g. "AzureGPT", "gpt-4o", "ollama"
    pub backend: String,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Completion token limit; the backend's recommendation when unset
    pub max_tokens: Option<u32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: "AzureGPT".to_string(),
            temperature: 0.5,
            max_tokens: None,
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: OpenAiConfig,
    pub azure: AzureConfig,
    pub ollama: OllamaConfig,
    pub tei: TeiConfig,
    pub http: HttpConfig,
}

/// OpenAI API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,

    /// API base URL
    pub endpoint: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Azure OpenAI settings.
///
/// Chat and embeddings may live on different Azure resources, so each has its
/// own endpoint and key variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureConfig {
    pub endpoint_env: String,
    pub api_key_env: String,

    /// Chat deployment name
    pub deployment: String,
    pub api_version: String,

    pub embedding_endpoint_env: String,
    pub embedding_api_key_env: String,

    /// Embedding deployment; ada-002 goes through OpenAI when unset
    pub embedding_deployment: Option<String>,
    pub embedding_api_version_env: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint_env: "AZURE_OPENAI_ENDPOINT".to_string(),
            api_key_env: "AZURE_OPENAI_KEY".to_string(),
            deployment: "gpt4-testing-app".to_string(),
            api_version: "2024-05-01-preview".to_string(),
            embedding_endpoint_env: "AZURE_EMB_ENDPOINT".to_string(),
            embedding_api_key_env: "AZURE_EMB_API_KEY".to_string(),
            embedding_deployment: None,
            embedding_api_version_env: "AZURE_VERSION".to_string(),
        }
    }
}

/// Ollama settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaConfig {
    pub endpoint: String,

    /// Chat model used by the "ollama" completion backend
    pub model: String,

    /// Ollama tag serving all-MiniLM-L6-v2
    pub embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            embedding_model: "all-minilm".to_string(),
        }
    }
}

/// text-embeddings-inference server hosting the sparse model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TeiConfig {
    pub endpoint: String,
}

impl Default for TeiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
        }
    }
}

/// Timeout and retry policy for every backend call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpConfig {
    pub timeout_secs: u64,

    /// Total attempts per call, the first one included
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_attempts: 2,
            backoff_ms: 500,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    retrieval: Option<RetrievalConfig>,
    completion: Option<CompletionConfig>,
    providers: Option<ProvidersConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            retrieval: RetrievalConfig::default(),
            completion: CompletionConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `NUCRAG_WORKSPACE`: Override workspace path
    /// - `NUCRAG_CONFIG`: Path to config file
    /// - `NUCRAG_EMBEDDING_MODEL`: Embedding model name
    /// - `NUCRAG_LLM_BACKEND`: Completion backend name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use nucrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like `load`, with explicit workspace and config file paths taking
    /// precedence over `NUCRAG_WORKSPACE` and `NUCRAG_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| std::env::var_os("NUCRAG_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var_os("NUCRAG_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.state_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();
        Ok(config)
    }

    /// Environment variables override the config file.
    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("NUCRAG_EMBEDDING_MODEL") {
            self.retrieval.embedding_model = model;
        }

        if let Ok(backend) = std::env::var("NUCRAG_LLM_BACKEND") {
            self.completion.backend = backend;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merged_with(file))
    }

    fn merged_with(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(completion) = file.completion {
            result.completion = completion;
        }
        if let Some(providers) = file.providers {
            result.providers = providers;
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the file and the environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        embedding_model: Option<String>,
        llm_backend: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(model) = embedding_model {
            self.retrieval.embedding_model = model;
        }

        if let Some(backend) = llm_backend {
            self.completion.backend = backend;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the .nucrag directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .nucrag directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the document store.
    pub fn store_path(&self) -> PathBuf {
        resolve(&self.workspace, &self.retrieval.store_path)
    }

    /// Absolute export directory, if exports are enabled.
    pub fn export_dir(&self) -> Option<PathBuf> {
        self.retrieval
            .export_dir
            .as_ref()
            .map(|dir| resolve(&self.workspace, dir))
    }

    /// Validate value ranges that do not depend on backend catalogs.
    ///
    /// Backend and model names are checked by the crates that own the
    /// catalogs, before any I/O happens.
    pub fn validate(&self) -> AppResult<()> {
        let threshold = self.retrieval.threshold_percent;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "thresholdPercent must be within 0-100, got {}",
                threshold
            )));
        }

        if let (Some(size), Some(overlap)) = (self.retrieval.chunk_size, self.retrieval.overlap) {
            if size == 0 || overlap >= size {
                return Err(AppError::Config(format!(
                    "overlap ({}) must be smaller than chunkSize ({})",
                    overlap, size
                )));
            }
        }

        let temperature = self.completion.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Config(format!(
                "temperature must be within 0.0-2.0, got {}",
                temperature
            )));
        }

        if self.providers.http.max_attempts == 0 {
            return Err(AppError::Config(
                "providers.http.maxAttempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read a required environment variable named by the config.
pub fn require_env(var: &str) -> AppResult<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "Environment variable {} is not set",
            var
        ))),
    }
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retrieval.embedding_model, "all-MiniLM-L6-v2");
        assert_eq!(config.completion.backend, "AzureGPT");
        assert_eq!(config.retrieval.threshold_percent, 20.0);
        assert_eq!(config.providers.http.max_attempts, 2);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_state_dir_and_store_path() {
        let config = AppConfig {
            workspace: PathBuf::from("/tmp/ws"),
            ..Default::default()
        };
        assert!(config.state_dir().ends_with(".nucrag"));
        assert_eq!(
            config.store_path(),
            PathBuf::from("/tmp/ws/.nucrag/documents.sqlite")
        );
        assert!(config.export_dir().is_none());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            Some("trigram".to_string()),
            Some("gpt-4o".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.retrieval.embedding_model, "trigram");
        assert_eq!(config.completion.backend, "gpt-4o");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_partial_yaml_sections_keep_defaults() {
        let yaml = r#"
retrieval:
  embeddingModel: atomic-canyon-fermi-nrc
  chunkSize: 800
  overlap: 300
completion:
  backend: gpt-4o-mini
providers:
  azure:
    embeddingDeployment: ada-002
logging:
  level: debug
  color: false
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let config = AppConfig::default().merged_with(file);

        assert_eq!(config.retrieval.embedding_model, "atomic-canyon-fermi-nrc");
        assert_eq!(config.retrieval.chunk_size, Some(800));
        assert_eq!(config.retrieval.threshold_percent, 20.0);
        assert_eq!(config.completion.backend, "gpt-4o-mini");
        assert_eq!(config.completion.temperature, 0.5);
        assert_eq!(
            config.providers.azure.embedding_deployment.as_deref(),
            Some("ada-002")
        );
        assert_eq!(config.providers.azure.api_key_env, "AZURE_OPENAI_KEY");
        assert_eq!(config.providers.ollama.endpoint, "http://localhost:11434");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
    }

    #[test]
    fn test_load_from_explicit_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(&path, "retrieval:\n  embeddingModel: lexical\n").unwrap();

        let config =
            AppConfig::load_from(Some(temp.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.config_file, Some(path));

        let missing = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.yaml")),
        );
        assert!(matches!(missing, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_yaml_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "completion:\n  backend: ollama\n  temperature: 0.2\n").unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.completion.backend, "ollama");
        assert_eq!(config.completion.temperature, 0.2);
    }

    #[test]
    fn test_validate_rejects_overlap_not_below_chunk_size() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_size = Some(100);
        config.retrieval.overlap = Some(100);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.retrieval.threshold_percent = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_env_missing() {
        let err = require_env("NUCRAG_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("NUCRAG_TEST_SURELY_UNSET_VARIABLE"));
    }
}
