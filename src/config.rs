//! Configuration management for toolchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, ToolchatError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provider types this build knows how to construct
pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama"];

/// Main configuration structure for toolchat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider configuration
    pub provider: ProviderConfig,
    /// Conversation loop configuration
    #[serde(default)]
    pub chat: ChatConfig,
    /// Tool registry configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Provider configuration
///
/// Specifies which model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// System prompt handed to the provider on every call
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Prompt shown when waiting for human input
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Colorize rendered labels when writing to a terminal
    #[serde(default = "default_color")]
    pub color: bool,

    /// Timeout for a single completion attempt (seconds)
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_seconds: u64,

    /// Extra attempts after a failed completion call
    #[serde(default)]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

fn default_system_prompt() -> String {
    "You are a helpful, respectful and honest assistant. \
     If the weather is requested use the weather tool."
        .to_string()
}

fn default_prompt() -> String {
    "You: ".to_string()
}

fn default_color() -> bool {
    true
}

fn default_completion_timeout() -> u64 {
    300
}

fn default_retry_base_delay() -> u64 {
    1000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            prompt: default_prompt(),
            color: default_color(),
            completion_timeout_seconds: default_completion_timeout(),
            max_retries: 0,
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

/// Tool registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Register the weather tool
    #[serde(default = "default_weather_enabled")]
    pub weather: bool,
}

fn default_weather_enabled() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather: default_weather_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged. Environment variables are applied before CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, overrides: &ChatOverrides) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(overrides);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "ollama".to_string(),
                ollama: OllamaConfig::default(),
            },
            chat: ChatConfig::default(),
            tools: ToolsConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ToolchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("TOOLCHAT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(ollama_host) = std::env::var("TOOLCHAT_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("TOOLCHAT_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(system_prompt) = std::env::var("TOOLCHAT_SYSTEM_PROMPT") {
            self.chat.system_prompt = system_prompt;
        }

        if let Ok(timeout) = std::env::var("TOOLCHAT_COMPLETION_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.chat.completion_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TOOLCHAT_COMPLETION_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(retries) = std::env::var("TOOLCHAT_MAX_RETRIES") {
            if let Ok(value) = retries.parse() {
                self.chat.max_retries = value;
            } else {
                tracing::warn!("Invalid TOOLCHAT_MAX_RETRIES: {}", retries);
            }
        }
    }

    fn apply_cli_overrides(&mut self, overrides: &ChatOverrides) {
        if let Some(provider) = &overrides.provider {
            tracing::debug!("Provider override from CLI: {}", provider);
            self.provider.provider_type = provider.clone();
        }
        if let Some(model) = &overrides.model {
            tracing::debug!("Model override from CLI: {}", model);
            self.provider.ollama.model = model.clone();
        }
        if let Some(system) = &overrides.system_prompt {
            self.chat.system_prompt = system.clone();
        }
        if overrides.no_color {
            self.chat.color = false;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ToolchatError::Config` describing the first failing check
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(ToolchatError::Config("Provider type cannot be empty".to_string()).into());
        }

        if !SUPPORTED_PROVIDERS.contains(&self.provider.provider_type.as_str()) {
            return Err(ToolchatError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                SUPPORTED_PROVIDERS.join(", ")
            ))
            .into());
        }

        if self.provider.ollama.model.trim().is_empty() {
            return Err(ToolchatError::Config("ollama.model cannot be empty".to_string()).into());
        }

        if self.chat.completion_timeout_seconds == 0 {
            return Err(ToolchatError::Config(
                "chat.completion_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.max_retries > 10 {
            return Err(ToolchatError::Config(
                "chat.max_retries must be less than or equal to 10".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Per-invocation overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct ChatOverrides {
    /// Provider type override
    pub provider: Option<String>,
    /// Model name override
    pub model: Option<String>,
    /// System prompt override
    pub system_prompt: Option<String>,
    /// Disable colored output
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        assert_error_contains, create_test_file, temp_dir, test_config, test_config_yaml,
    };

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.provider.ollama.host, "http://localhost:11434");
        assert_eq!(config.chat.prompt, "You: ");
        assert_eq!(config.chat.max_retries, 0);
        assert!(config.tools.weather);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_provider() {
        let mut config = Config::default();
        config.provider.provider_type = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "bedrock".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bedrock"));
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.ollama.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.chat.completion_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_too_many_retries() {
        let mut config = Config::default();
        config.chat.max_retries = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: ollama
  ollama:
    host: http://gpu-box:11434
    model: qwen2.5:7b

chat:
  system_prompt: Be brief.
  prompt: "> "
  color: false
  completion_timeout_seconds: 60
  max_retries: 2
  retry_base_delay_ms: 250

tools:
  weather: false
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.ollama.host, "http://gpu-box:11434");
        assert_eq!(config.provider.ollama.model, "qwen2.5:7b");
        assert_eq!(config.provider.ollama.request_timeout_seconds, 120);
        assert_eq!(config.chat.system_prompt, "Be brief.");
        assert_eq!(config.chat.prompt, "> ");
        assert!(!config.chat.color);
        assert_eq!(config.chat.max_retries, 2);
        assert!(!config.tools.weather);
    }

    #[test]
    fn test_config_from_yaml_minimal() {
        let config: Config = serde_yaml::from_str("provider:\n  type: ollama\n").unwrap();
        assert_eq!(config.chat.completion_timeout_seconds, 300);
        assert!(config.tools.weather);
    }

    #[test]
    fn test_cli_overrides_apply_last() {
        let mut config = Config::default();
        config.apply_cli_overrides(&ChatOverrides {
            provider: None,
            model: Some("mistral:latest".to_string()),
            system_prompt: Some("Answer in French.".to_string()),
            no_color: true,
        });
        assert_eq!(config.provider.ollama.model, "mistral:latest");
        assert_eq!(config.chat.system_prompt, "Answer in French.");
        assert!(!config.chat.color);
    }

    #[test]
    fn test_load_from_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", &test_config_yaml());

        let config = Config::load(path.to_str().unwrap(), &ChatOverrides::default()).unwrap();
        assert_eq!(config.chat.retry_base_delay_ms, 10);
        assert_eq!(config.provider.ollama.request_timeout_seconds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "config.yaml", "provider: [unclosed");

        assert_error_contains(
            Config::load(path.to_str().unwrap(), &ChatOverrides::default()),
            "Failed to parse config",
        );
    }

    #[test]
    fn test_test_config_is_valid() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &ChatOverrides::default());
        assert!(config.is_ok());
    }
}
