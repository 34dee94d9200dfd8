/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `chat`  — Interactive chat session driven by the conversation loop
- `tools` — List the tools offered to the model

These handlers are intentionally small and use the library components:
providers, tools, and the agent.
*/

use crate::agent::{
    BufReadInput, ConversationLoop, HumanInput, LoopConfig, LoopExit, ReadlineInput,
    ToolExecutingService,
};
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_provider;
use crate::tools::build_default_registry;

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Builds the provider, the tool registry and the completion service,
    //! then hands stdin and stdout to the conversation loop until the input
    //! closes or Ctrl-C is pressed.

    use super::*;
    use colored::Colorize;
    use std::io::IsTerminal;
    use tokio_util::sync::CancellationToken;

    /// Start an interactive chat session
    ///
    /// Reads with a line editor when stdin is a terminal and line by line
    /// otherwise, so a conversation can be piped in.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration, CLI overrides already applied
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created or a completion fails
    pub async fn run_chat(config: Config) -> Result<()> {
        let provider = create_provider(&config.provider.provider_type, &config.provider)?;
        let model = provider.get_current_model()?;
        let registry = build_default_registry(&config.tools);
        let tool_names: Vec<String> = registry.names().into_iter().map(String::from).collect();

        let service =
            ToolExecutingService::new(provider, registry, config.chat.system_prompt.clone());
        let definitions = service.tool_definitions();

        let interactive = std::io::stdin().is_terminal();
        let mut loop_config = LoopConfig::from(&config.chat);
        loop_config.color = config.chat.color && std::io::stdout().is_terminal();

        let mut input: Box<dyn HumanInput> = if interactive {
            Box::new(ReadlineInput::new()?)
        } else {
            Box::new(BufReadInput::new(std::io::stdin().lock()))
        };

        if interactive {
            print_welcome_banner(&config, &model, &tool_names, loop_config.color);
        }

        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping chat");
                signal_token.cancel();
            }
        });

        let mut chat = ConversationLoop::new(Box::new(service), definitions, loop_config);
        let mut stdout = std::io::stdout();

        let result = chat.run(input.as_mut(), &mut stdout, &cancel).await;
        cancel.cancel();

        match result {
            Ok(exit) => {
                match exit {
                    LoopExit::InputClosed { turns } => {
                        tracing::info!(turns, "Chat ended: input closed")
                    }
                    LoopExit::Cancelled { turns } => {
                        tracing::info!(turns, "Chat ended: interrupted")
                    }
                }
                println!("Goodbye!");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    turns = chat.turns(),
                    transcript_len = chat.transcript().len(),
                    "Chat ended with error: {:#}",
                    e
                );
                Err(e)
            }
        }
    }

    fn print_welcome_banner(config: &Config, model: &str, tool_names: &[String], color: bool) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               toolchat Interactive Chat - Welcome!           ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let model = format!("{} ({})", model, config.provider.provider_type);
        let tools = if tool_names.is_empty() {
            "none".to_string()
        } else {
            tool_names.join(", ")
        };

        if color {
            println!("Model: {}", model.cyan());
            println!("Tools: {}\n", tools.cyan());
        } else {
            println!("Model: {}", model);
            println!("Tools: {}\n", tools);
        }
        println!("Press Ctrl-D or Ctrl-C to quit\n");
    }
}

// Tool listing command handler
pub mod tools {
    //! Lists the tool descriptors the model is offered.

    use super::*;

    /// Print the enabled tools
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration selecting the enabled tools
    /// * `json` - Print the raw descriptors as pretty JSON
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use toolchat::commands::tools::list_tools;
    /// use toolchat::config::Config;
    ///
    /// list_tools(&Config::default(), false).unwrap();
    /// ```
    pub fn list_tools(config: &Config, json: bool) -> Result<()> {
        let registry = build_default_registry(&config.tools);
        print!("{}", format_tool_list(&registry.all_definitions(), json)?);
        Ok(())
    }

    /// Format tool descriptors as text lines or pretty JSON
    pub fn format_tool_list(definitions: &[serde_json::Value], json: bool) -> Result<String> {
        if json {
            return Ok(format!("{}\n", serde_json::to_string_pretty(definitions)?));
        }

        if definitions.is_empty() {
            return Ok("No tools enabled\n".to_string());
        }

        let mut out = String::new();
        for definition in definitions {
            let name = definition["name"].as_str().unwrap_or("<unnamed>");
            let description = definition["description"].as_str().unwrap_or("");
            out.push_str(&format!("{} - {}\n", name, description));
        }
        Ok(out)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::ToolsConfig;

        #[test]
        fn test_format_tool_list_text() {
            let registry = build_default_registry(&ToolsConfig::default());
            let out = format_tool_list(&registry.all_definitions(), false).unwrap();
            assert_eq!(out, "weather - Get the weather in a location\n");
        }

        #[test]
        fn test_format_tool_list_json() {
            let registry = build_default_registry(&ToolsConfig::default());
            let out = format_tool_list(&registry.all_definitions(), true).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(parsed[0]["name"], "weather");
        }

        #[test]
        fn test_format_tool_list_empty() {
            let out = format_tool_list(&[], false).unwrap();
            assert_eq!(out, "No tools enabled\n");
        }
    }
}
