//! Console rendering of completion exchanges

use crate::agent::completion::TurnOutcome;
use crate::error::Result;
use colored::Colorize;
use std::io::Write;

/// Writes assistant text and tool notices to the output channel
///
/// Output order for one exchange is fixed: assistant text (when non-empty),
/// then one notice per tool call, then one notice per tool result, then a
/// blank line. The writer is flushed after every exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Creates a renderer; `color` enables colorized labels
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders one exchange
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::agent::{Renderer, TurnOutcome};
    ///
    /// let mut out = Vec::new();
    /// Renderer::new(false)
    ///     .render_outcome(&mut out, &TurnOutcome::text_reply("hi there"))
    ///     .unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "\nAssistant: hi there\n\n");
    /// ```
    pub fn render_outcome(&self, out: &mut dyn Write, outcome: &TurnOutcome) -> Result<()> {
        if let Some(text) = outcome.text.as_deref().filter(|t| !t.is_empty()) {
            write!(out, "\n{} {}", self.label("Assistant:"), text)?;
        }

        for call in &outcome.tool_calls {
            write!(
                out,
                "\n{} '{}' {}",
                self.label("Tool call:"),
                call.function.name,
                serde_json::to_string(&call.function.arguments)?
            )?;
        }

        for result in &outcome.tool_results {
            write!(
                out,
                "\n{} '{}' {}",
                self.label("Tool response:"),
                result.name,
                serde_json::to_string(&result.result)?
            )?;
        }

        write!(out, "\n\n")?;
        out.flush()?;
        Ok(())
    }

    fn label(&self, label: &str) -> String {
        if !self.color {
            return label.to_string();
        }
        match label {
            "Assistant:" => label.green().bold().to_string(),
            _ => label.cyan().to_string(),
        }
    }
}
