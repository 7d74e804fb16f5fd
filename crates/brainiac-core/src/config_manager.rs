use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for Brainiac
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrainiacConfig {
    /// Generation service settings
    #[serde(default)]
    pub openai: OpenAISettings,

    /// Where the metadata store and copied articles live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Author recorded on every new article
    #[serde(default)]
    pub author: String,

    /// Optional prompt overrides
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAISettings {
    /// Provider: "openai" or "openai-compatible"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key used as a bearer token
    #[serde(default)]
    pub api_key: String,

    /// Model identifier (e.g., "gpt-4.1-mini")
    #[serde(default)]
    pub model: String,

    /// Base URL for the Responses API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Reasoning effort for reasoning models: "minimal", "low", "medium", "high"
    #[serde(default)]
    pub reasoning_effort: Option<String>,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            reasoning_effort: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory receiving the copied articles and the metadata store
    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// File name of the metadata store inside `output_directory`
    #[serde(default)]
    pub metadata_storage_name: String,
}

/// Prompt files replacing the built-in instructions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub extraction_file: Option<PathBuf>,

    #[serde(default)]
    pub relatedness_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl BrainiacConfig {
    /// Path of the persisted metadata store
    pub fn metadata_path(&self) -> Option<PathBuf> {
        self.storage
            .output_directory
            .as_ref()
            .map(|dir| dir.join(&self.storage.metadata_storage_name))
    }
}

// Default value functions
fn default_provider() -> String {
    "openai".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "warn".to_string()
} // stdout carries the record, keep stderr quiet
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with file discovery and environment overrides
pub struct ConfigManager {
    config: BrainiacConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (explicit path, .brainiac.toml, ~/.brainiac/config.toml)
    /// 3. Defaults
    ///
    /// Validation runs last, so a missing value fails before any store or
    /// network access.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                (Self::read_toml_file(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_config_file()?,
        };

        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        match config_path {
            Some(ref path) => info!(config_file = %path.display(), "Configuration loaded"),
            None => info!("Configuration loaded from environment"),
        }
        info!(
            provider = %config.openai.provider,
            model = %config.openai.model,
            "Generation service configured"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".brainiac.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .brainiac.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.brainiac.toml
    /// 2. ~/.brainiac/config.toml
    /// 3. Defaults
    fn load_config_file() -> Result<(BrainiacConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".brainiac.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".brainiac").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((BrainiacConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<BrainiacConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: BrainiacConfig) -> BrainiacConfig {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai.api_key = key;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.openai.model = model;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.openai.base_url = url;
        }
        if let Ok(timeout) = std::env::var("BRAINIAC_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.openai.timeout_secs = secs;
            }
        }

        if let Some(dir) = env_with_fallback("BRAINIAC_OUTPUT_DIRECTORY", "OUTPUT_DIRECTORY") {
            config.storage.output_directory = Some(PathBuf::from(dir));
        }
        if let Some(name) =
            env_with_fallback("BRAINIAC_METADATA_STORAGE_NAME", "METADATA_STORAGE_NAME")
        {
            config.storage.metadata_storage_name = name;
        }
        if let Some(author) = env_with_fallback("BRAINIAC_AUTHOR", "AUTHOR") {
            config.author = author;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    /// Validate configuration
    pub fn validate_config(config: &BrainiacConfig) -> Result<(), ConfigError> {
        if config.openai.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("OPENAI_API_KEY"));
        }
        if config.openai.model.trim().is_empty() {
            return Err(ConfigError::MissingValue("OPENAI_MODEL"));
        }
        match config.storage.output_directory {
            Some(ref dir) if !dir.as_os_str().is_empty() => {}
            _ => return Err(ConfigError::MissingValue("OUTPUT_DIRECTORY")),
        }
        if config.storage.metadata_storage_name.trim().is_empty() {
            return Err(ConfigError::MissingValue("METADATA_STORAGE_NAME"));
        }
        if config.author.trim().is_empty() {
            return Err(ConfigError::MissingValue("AUTHOR"));
        }

        if config.openai.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        match config.openai.provider.as_str() {
            "openai" | "openai-compatible" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid provider: {}. Must be one of: openai, openai-compatible",
                    other
                )))
            }
        }

        // RUST_LOG may carry directives like "brainiac_core=debug"; only bare levels are checked
        if !config.logging.level.contains('=') {
            match config.logging.level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        other
                    )))
                }
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BrainiacConfig {
        &self.config
    }

    /// Consume the manager, keeping only the configuration
    pub fn into_config(self) -> BrainiacConfig {
        self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

fn env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .ok()
}
