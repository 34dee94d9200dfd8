//! Command-line interface definition for toolchat
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// toolchat - console chat with a tool-calling language model
///
/// Alternates between your input and the model; when the model calls a
/// tool, the result goes straight back to the model before you are asked
/// again.
#[derive(Parser, Debug, Clone)]
#[command(name = "toolchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for toolchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Override the provider from config (ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,

        /// Override the system prompt from config
        #[arg(short, long)]
        system: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the tools offered to the model
    Tools {
        /// Print the tool descriptors as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Chat {
                provider: None,
                model: None,
                system: None,
                no_color: false,
            },
        }
    }
}
