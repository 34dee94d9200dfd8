//! toolchat - console chat with a tool-calling language model
//!
#![doc = "toolchat - console chat with a tool-calling language model"]
#![doc = "Main entry point for the toolchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toolchat::cli::{Cli, Commands};
use toolchat::commands;
use toolchat::config::{ChatOverrides, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    let overrides = match &cli.command {
        Commands::Chat {
            provider,
            model,
            system,
            no_color,
        } => ChatOverrides {
            provider: provider.clone(),
            model: model.clone(),
            system_prompt: system.clone(),
            no_color: *no_color,
        },
        Commands::Tools { .. } => ChatOverrides::default(),
    };

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &overrides)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { .. } => {
            tracing::info!("Starting interactive chat");
            tracing::debug!(
                "Provider: {}, model: {}",
                config.provider.provider_type,
                config.provider.ollama.model
            );
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Tools { json } => {
            commands::tools::list_tools(&config, json)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so the conversation on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "toolchat=debug" } else { "toolchat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
