//! Provider module for toolchat
//!
//! This module contains the model provider abstraction and the Ollama binding.

pub mod base;
pub mod ollama;

pub use base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, ToolchatError};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider (currently only "ollama")
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(provider_type: &str, config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match provider_type {
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        _ => Err(ToolchatError::Provider(format!("Unknown provider type: {}", provider_type)).into()),
    }
}
