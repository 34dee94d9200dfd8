//! Completion service: one model exchange with tools already resolved
//!
//! The conversation loop talks to the model through [`CompletionService`]
//! only. A service receives the full transcript, runs whatever tools the model
//! asked for, and hands back the call records, their results, and the new
//! transcript entries in one [`TurnOutcome`].

use crate::error::{Result, ToolchatError};
use crate::providers::{Message, Provider, TokenUsage, ToolCall};
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one tool invocation, reported for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// ID of the call this result answers
    pub tool_call_id: String,
    /// Tool name
    pub name: String,
    /// Structured result value
    pub result: serde_json::Value,
}

/// Everything one completion exchange produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Assistant text, when the model produced any
    pub text: Option<String>,
    /// Tool calls the model requested, in the order returned
    pub tool_calls: Vec<ToolCall>,
    /// Results of those calls, in the order returned
    pub tool_results: Vec<ToolInvocationResult>,
    /// Entries to append to the transcript, in order
    pub new_entries: Vec<Message>,
    /// Token usage reported by the provider
    pub usage: Option<TokenUsage>,
}

impl TurnOutcome {
    /// Outcome of a plain text reply
    ///
    /// # Examples
    ///
    /// ```
    /// use toolchat::agent::TurnOutcome;
    ///
    /// let outcome = TurnOutcome::text_reply("hi there");
    /// assert_eq!(outcome.text.as_deref(), Some("hi there"));
    /// assert_eq!(outcome.new_entries.len(), 1);
    /// assert!(outcome.tool_calls.is_empty());
    /// ```
    pub fn text_reply(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            new_entries: vec![Message::assistant(text.clone())],
            text: Some(text),
            ..Default::default()
        }
    }

    /// True when the model asked for at least one tool
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Checks that every tool call has exactly one result and every result
    /// answers a call
    ///
    /// # Errors
    ///
    /// Returns `ToolchatError::ContractViolation` naming the offending id
    pub fn check_contract(&self) -> Result<()> {
        let call_ids: HashSet<&str> = self.tool_calls.iter().map(|c| c.id.as_str()).collect();
        if call_ids.len() != self.tool_calls.len() {
            return Err(ToolchatError::ContractViolation(
                "duplicate tool call ids in one response".to_string(),
            )
            .into());
        }

        let mut answered: HashSet<&str> = HashSet::new();
        for result in &self.tool_results {
            if !call_ids.contains(result.tool_call_id.as_str()) {
                return Err(ToolchatError::ContractViolation(format!(
                    "result for unknown tool call '{}'",
                    result.tool_call_id
                ))
                .into());
            }
            if !answered.insert(result.tool_call_id.as_str()) {
                return Err(ToolchatError::ContractViolation(format!(
                    "more than one result for tool call '{}'",
                    result.tool_call_id
                ))
                .into());
            }
        }

        if let Some(missing) = self
            .tool_calls
            .iter()
            .find(|call| !answered.contains(call.id.as_str()))
        {
            return Err(ToolchatError::ContractViolation(format!(
                "tool call '{}' ({}) has no result",
                missing.id, missing.function.name
            ))
            .into());
        }

        Ok(())
    }
}

/// A completion service resolves one conversation turn
///
/// Implementations receive the whole transcript on every call and must not
/// rely on any state of their own to reconstruct it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs one exchange against the model
    ///
    /// # Arguments
    ///
    /// * `transcript` - Full conversation so far
    /// * `tools` - Tool descriptors the model may call
    ///
    /// # Errors
    ///
    /// Returns error if the model call or any requested tool fails
    async fn complete_turn(
        &self,
        transcript: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<TurnOutcome>;
}

/// Default completion service: one provider call, then every requested tool
/// executed in order through the registry
pub struct ToolExecutingService {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    system_prompt: Option<String>,
}

impl ToolExecutingService {
    /// Creates a service around a provider and a tool registry
    ///
    /// An empty or whitespace-only `system_prompt` is not sent.
    pub fn new(
        provider: Box<dyn Provider>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            provider: Arc::from(provider),
            tools,
            system_prompt: if system_prompt.trim().is_empty() {
                None
            } else {
                Some(system_prompt)
            },
        }
    }

    /// Tool descriptors of the wrapped registry
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        self.tools.all_definitions()
    }

    fn build_request(&self, transcript: &[Message]) -> Vec<Message> {
        let mut request = Vec::with_capacity(transcript.len() + 1);
        if let Some(system_prompt) = &self.system_prompt {
            request.push(Message::system(system_prompt.clone()));
        }
        request.extend_from_slice(transcript);
        request
    }

    async fn execute_tool_call(&self, tool_call: &ToolCall) -> Result<ToolInvocationResult> {
        let tool_name = &tool_call.function.name;
        debug!("Executing tool: {}", tool_name);

        let executor = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolchatError::ToolNotFound(tool_name.clone()))?;

        let result = executor
            .execute(tool_call.function.arguments.clone())
            .await
            .map_err(|e| {
                anyhow::Error::from(ToolchatError::Tool(format!(
                    "Tool '{}' execution failed: {}",
                    tool_name, e
                )))
            })?;

        Ok(ToolInvocationResult {
            tool_call_id: tool_call.id.clone(),
            name: tool_name.clone(),
            result,
        })
    }
}

#[async_trait]
impl CompletionService for ToolExecutingService {
    async fn complete_turn(
        &self,
        transcript: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<TurnOutcome> {
        let request = self.build_request(transcript);
        let response = self.provider.complete(&request, tools).await?;

        let (content, tool_calls) = match response.message {
            Message::Assistant {
                content,
                tool_calls,
            } => (content, tool_calls),
            other => {
                return Err(ToolchatError::Provider(format!(
                    "Provider returned a '{}' message instead of an assistant reply",
                    other.role()
                ))
                .into())
            }
        };

        let text = content.clone().filter(|t| !t.is_empty());

        if !tool_calls.is_empty() {
            info!("Model requested {} tool call(s)", tool_calls.len());
        }

        let mut tool_results = Vec::with_capacity(tool_calls.len());
        for tool_call in &tool_calls {
            tool_results.push(self.execute_tool_call(tool_call).await?);
        }

        let mut new_entries = Vec::with_capacity(1 + tool_results.len());
        new_entries.push(Message::Assistant {
            content,
            tool_calls: tool_calls.clone(),
        });
        new_entries.extend(
            tool_results
                .iter()
                .map(|r| Message::tool_result(r.tool_call_id.clone(), r.name.clone(), r.result.clone())),
        );

        Ok(TurnOutcome {
            text,
            tool_calls,
            tool_results,
            new_entries,
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CompletionResponse;
    use crate::tools::{ToolExecutor, WeatherTool};
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider that replays canned replies and records every request
    struct ScriptedProvider {
        replies: Mutex<Vec<Message>>,
        requests: Arc<Mutex<Vec<Vec<Message>>>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Message>) -> (Self, Arc<Mutex<Vec<Vec<Message>>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    replies: Mutex::new(replies.into_iter().rev().collect()),
                    requests: Arc::clone(&requests),
                },
                requests,
            )
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[serde_json::Value],
        ) -> Result<CompletionResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Message::assistant("Done"));
            Ok(CompletionResponse::new(reply))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolExecutor for FailingTool {
        fn tool_definition(&self) -> serde_json::Value {
            json!({"name": "broken", "description": "Always fails", "parameters": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
            Err(ToolchatError::Tool("backend unavailable".to_string()).into())
        }
    }

    fn weather_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register("weather", Arc::new(WeatherTool::new()));
        registry.register("broken", Arc::new(FailingTool));
        registry
    }

    #[tokio::test]
    async fn test_text_reply_produces_single_entry() {
        let (provider, _) = ScriptedProvider::new(vec![Message::assistant("hi there")]);
        let service = ToolExecutingService::new(Box::new(provider), weather_registry(), "");

        let outcome = service
            .complete_turn(&[Message::user("hello")], &[])
            .await
            .unwrap();

        assert_eq!(outcome.text.as_deref(), Some("hi there"));
        assert!(!outcome.has_tool_calls());
        assert_eq!(outcome.new_entries, vec![Message::assistant("hi there")]);
        assert!(outcome.check_contract().is_ok());
    }

    #[test]
    fn test_tool_definitions_come_from_registry() {
        let (provider, _) = ScriptedProvider::new(vec![]);
        let service = ToolExecutingService::new(Box::new(provider), weather_registry(), "");

        let definitions = service.tool_definitions();
        let names: Vec<&str> = definitions
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect();
        assert_eq!(names, vec!["broken", "weather"]);
    }

    #[tokio::test]
    async fn test_system_prompt_is_prepended_to_request_only() {
        let (provider, requests) = ScriptedProvider::new(vec![Message::assistant("ok")]);
        let service =
            ToolExecutingService::new(Box::new(provider), ToolRegistry::new(), "Be helpful.");

        let transcript = vec![Message::user("hello")];
        service.complete_turn(&transcript, &[]).await.unwrap();

        let sent = requests.lock().unwrap();
        assert_eq!(sent[0][0], Message::system("Be helpful."));
        assert_eq!(sent[0][1], Message::user("hello"));
        assert_eq!(transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_calls_are_executed_in_order() {
        let (provider, _) = ScriptedProvider::new(vec![Message::assistant_with_tools(vec![
            ToolCall::new("call_1", "weather", json!({"location": "Paris"})),
            ToolCall::new("call_2", "weather", json!({"location": "Oslo"})),
        ])]);
        let service = ToolExecutingService::new(Box::new(provider), weather_registry(), "");

        let outcome = service
            .complete_turn(&[Message::user("weather in Paris and Oslo?")], &[])
            .await
            .unwrap();

        assert!(outcome.text.is_none());
        assert_eq!(outcome.tool_results.len(), 2);
        assert_eq!(outcome.tool_results[0].tool_call_id, "call_1");
        assert_eq!(outcome.tool_results[0].result["location"], "Paris");
        assert_eq!(outcome.tool_results[1].result["location"], "Oslo");

        let roles: Vec<&str> = outcome.new_entries.iter().map(Message::role).collect();
        assert_eq!(roles, vec!["assistant", "tool", "tool"]);
        assert!(outcome.check_contract().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_exchange() {
        let (provider, _) = ScriptedProvider::new(vec![Message::assistant_with_tools(vec![
            ToolCall::new("call_1", "stock_price", json!({})),
        ])]);
        let service = ToolExecutingService::new(Box::new(provider), weather_registry(), "");

        let err = service
            .complete_turn(&[Message::user("price?")], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolchatError>(),
            Some(ToolchatError::ToolNotFound(name)) if name == "stock_price"
        ));
    }

    #[tokio::test]
    async fn test_tool_failure_fails_exchange() {
        let (provider, _) = ScriptedProvider::new(vec![Message::assistant_with_tools(vec![
            ToolCall::new("call_1", "broken", json!({})),
        ])]);
        let service = ToolExecutingService::new(Box::new(provider), weather_registry(), "");

        let err = service
            .complete_turn(&[Message::user("go")], &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_check_contract_detects_missing_result() {
        let outcome = TurnOutcome {
            tool_calls: vec![ToolCall::new("call_1", "weather", json!({}))],
            ..Default::default()
        };
        let err = outcome.check_contract().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolchatError>(),
            Some(ToolchatError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_check_contract_detects_unmatched_result() {
        let outcome = TurnOutcome {
            tool_results: vec![ToolInvocationResult {
                tool_call_id: "call_9".to_string(),
                name: "weather".to_string(),
                result: json!({}),
            }],
            ..Default::default()
        };
        assert!(outcome.check_contract().is_err());
    }

    #[test]
    fn test_check_contract_detects_duplicate_result() {
        let result = ToolInvocationResult {
            tool_call_id: "call_1".to_string(),
            name: "weather".to_string(),
            result: json!({}),
        };
        let outcome = TurnOutcome {
            tool_calls: vec![ToolCall::new("call_1", "weather", json!({}))],
            tool_results: vec![result.clone(), result],
            ..Default::default()
        };
        assert!(outcome.check_contract().is_err());
    }
}
