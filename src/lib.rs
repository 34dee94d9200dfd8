//! toolchat - console chat with a tool-calling language model
//!
//! This library provides the pieces behind the `toolchat` binary: a
//! conversation loop that alternates between human input and a completion
//! service, the provider seam, the tool registry, and configuration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Transcript, completion service, conversation loop, rendering, input
//! - `providers`: Model provider abstraction and the Ollama implementation
//! - `tools`: Tool executor trait, registry, and the weather tool
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers
//!
//! # Example
//!
//! ```no_run
//! use toolchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     toolchat::commands::chat::run_chat(config).await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use agent::{CompletionService, ConversationLoop, LoopExit, LoopState, TurnOutcome};
pub use config::Config;
pub use error::{Result, ToolchatError};

#[cfg(test)]
pub mod test_utils;
