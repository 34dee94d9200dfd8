//! Tools module for toolchat
//!
//! This module contains the tool executor trait, the tool registry handed to
//! the completion service, and the bundled tool implementations.

pub mod weather;

pub use weather::WeatherTool;

use crate::config::ToolsConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```no_run
/// use toolchat::tools::ToolExecutor;
/// use toolchat::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct ClockTool;
///
/// #[async_trait]
/// impl ToolExecutor for ClockTool {
///     fn tool_definition(&self) -> Value {
///         serde_json::json!({
///             "name": "clock",
///             "description": "Returns a fixed time",
///             "parameters": {"type": "object", "properties": {}}
///         })
///     }
///
///     async fn execute(&self, _args: Value) -> Result<Value> {
///         Ok(serde_json::json!({"time": "12:00"}))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition as a JSON value
    ///
    /// The definition follows the OpenAI function calling format:
    /// ```json
    /// {
    ///   "name": "tool_name",
    ///   "description": "Tool description",
    ///   "parameters": {
    ///     "type": "object",
    ///     "properties": {
    ///       "param1": {"type": "string", "description": "..."}
    ///     },
    ///     "required": ["param1"]
    ///   }
    /// }
    /// ```
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns error if the arguments do not fit the schema or execution fails
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Tool registry for managing available tools
///
/// A fixed name-to-executor map built at startup and never mutated while a
/// conversation runs.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool executor in the registry
    ///
    /// Registering a second executor under the same name replaces the first.
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(name.into(), executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// All tool definitions, ordered by tool name
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Registered tool names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Build the registry of tools enabled in configuration
pub fn build_default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if config.weather {
        registry.register(weather::TOOL_NAME, Arc::new(WeatherTool::new()));
    }
    tracing::debug!("Registered {} tools: {:?}", registry.len(), registry.names());
    registry
}
