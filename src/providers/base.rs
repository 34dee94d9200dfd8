//! Base provider trait and common types for toolchat
//!
//! This module defines the Provider trait that model bindings implement,
//! along with the message types that make up a conversation transcript.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single conversation entry
///
/// Entries are tagged by role. `User`, `Assistant` and `Tool` entries make
/// up the transcript; `System` entries are only built when assembling a
/// provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// System instructions for the model
    System {
        /// Instruction text
        content: String,
    },
    /// A line typed by the human
    User {
        /// The text the human entered
        content: String,
    },
    /// A model reply, carrying text, tool calls, or both
    Assistant {
        /// Reply text, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls requested by the model
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The result of one tool call
    Tool {
        /// ID of the tool call this result answers
        tool_call_id: String,
        /// Name of the tool that produced the result
        name: String,
        /// Structured result value
        content: serde_json::Value,
    },
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role(), "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a new assistant message with text only
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role(), "assistant");
    /// assert_eq!(msg.text(), Some("Hello, user!"));
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates an assistant message with tool calls and no text
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::providers::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "weather", serde_json::json!({"location": "Paris"}));
    /// let msg = Message::assistant_with_tools(vec![call]);
    /// assert_eq!(msg.tool_calls().len(), 1);
    /// assert!(msg.text().is_none());
    /// ```
    pub fn assistant_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: None,
            tool_calls,
        }
    }

    /// Creates a new tool result message
    ///
    /// # Arguments
    ///
    /// * `tool_call_id` - The ID of the tool call this result corresponds to
    /// * `name` - The tool name
    /// * `content` - The structured result
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: serde_json::Value,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content,
        }
    }

    /// Role name as used on the wire
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Text content of system, user and assistant messages
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content } => Some(content.as_str()),
            Self::Assistant { content, .. } => content.as_deref(),
            Self::Tool { .. } => None,
        }
    }

    /// Tool calls carried by an assistant message (empty for other roles)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Function call information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function/tool to call
    pub name: String,
    /// Structured arguments, passed through untouched
    pub arguments: serde_json::Value,
}

/// Tool call structure
///
/// Represents a request from the model to execute a tool with specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier pairing this call with its result
    pub id: String,
    /// Function call details
    pub function: FunctionCall,
}

impl ToolCall {
    /// Creates a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Token usage information from a completion
///
/// Tracks the number of tokens used in prompts and completions,
/// as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Completion response with message and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The response message from the model
    pub message: Message,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage data
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }
}

/// Provider trait for model bindings
///
/// A provider turns a message list and a set of tool definitions into one
/// assistant message. It never executes tools itself.
///
/// # Examples
///
/// ```no_run
/// use toolchat::providers::{Provider, Message, CompletionResponse};
/// use toolchat::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(
///         &self,
///         messages: &[Message],
///         _tools: &[serde_json::Value],
///     ) -> Result<CompletionResponse> {
///         let last = messages.last().and_then(|m| m.text()).unwrap_or_default();
///         Ok(CompletionResponse::new(Message::assistant(last)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation with the given messages and available tools
    ///
    /// # Arguments
    ///
    /// * `messages` - Full request, system prompt first when present
    /// * `tools` - Tool definitions (OpenAI function format)
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse>;

    /// Get the name of the currently active model
    ///
    /// The default implementation reports that the provider does not expose it.
    fn get_current_model(&self) -> Result<String> {
        Err(crate::error::ToolchatError::Provider(
            "Current model information is not available from this provider".to_string(),
        )
        .into())
    }
}

/// Validates message sequence and removes orphan tool messages
///
/// A tool message is an orphan when no earlier assistant message carries a
/// tool call with the same id. Orphans make chat APIs reject the request, so
/// they are dropped (with a warning) from the outgoing copy.
///
/// # Examples
///
/// ```
/// use toolchat::providers::{Message, validate_message_sequence};
///
/// let messages = vec![
///     Message::user("Do something"),
///     Message::tool_result("call_123", "weather", serde_json::json!({})),
/// ];
/// let validated = validate_message_sequence(&messages);
/// assert_eq!(validated.len(), 1);
/// ```
pub fn validate_message_sequence(messages: &[Message]) -> Vec<Message> {
    let mut seen_call_ids: HashSet<String> = HashSet::new();

    messages
        .iter()
        .filter(|message| match message {
            Message::Assistant { tool_calls, .. } => {
                seen_call_ids.extend(tool_calls.iter().map(|call| call.id.clone()));
                true
            }
            Message::Tool { tool_call_id, .. } => {
                if seen_call_ids.contains(tool_call_id) {
                    true
                } else {
                    tracing::warn!(
                        "Dropping orphan tool message with tool_call_id: {}",
                        tool_call_id
                    );
                    false
                }
            }
            _ => true,
        })
        .cloned()
        .collect()
}
