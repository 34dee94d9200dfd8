//! Conversation loop: the turn-taking state machine
//!
//! Each iteration:
//! - reads one human line, unless the previous exchange requested tools
//! - hands the whole transcript to the completion service
//! - renders assistant text, tool calls, and tool results in that order
//! - appends the entries the service produced
//!
//! The loop never calls tools itself. It only decides whether the next
//! iteration needs a human line or goes straight back to the model.

use crate::agent::completion::{CompletionService, TurnOutcome};
use crate::agent::conversation::Transcript;
use crate::agent::input::HumanInput;
use crate::agent::render::Renderer;
use crate::config::ChatConfig;
use crate::error::{is_input_closed, Result, ToolchatError};
use crate::providers::Message;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound for a single retry delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Whether the next iteration reads human input first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Read one human line before calling the model
    #[default]
    NeedHumanInput,
    /// The last exchange produced tool results the model has not seen yet
    NeedModelContinuation,
}

/// How [`ConversationLoop::run`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The human input channel was closed
    InputClosed {
        /// Completed iterations
        turns: usize,
    },
    /// The cancellation token fired
    Cancelled {
        /// Completed iterations
        turns: usize,
    },
}

/// Summary of one completed iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    /// Whether a human line was read this iteration
    pub read_input: bool,
    /// Number of tool calls the model made
    pub tool_calls: usize,
    /// Number of entries appended to the transcript (human line included)
    pub appended: usize,
    /// State for the next iteration
    pub next_state: LoopState,
}

/// Retry policy for failed completion attempts
///
/// Every retry re-sends the same transcript; entries are appended only once,
/// after the attempt that succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each following one
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    ///
    /// Exponential backoff plus up to one base delay of jitter, capped at
    /// 30 seconds.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        if base_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff_ms = base_ms.saturating_mul(1u64 << exponent);
        let jitter_ms = rand::random::<u64>() % base_ms;
        Duration::from_millis(backoff_ms.saturating_add(jitter_ms)).min(MAX_RETRY_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Runtime settings of the conversation loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Prompt shown when reading a human line
    pub prompt: String,
    /// Limit for a single completion attempt
    pub completion_timeout: Duration,
    /// Retry behaviour for failed attempts
    pub retry: RetryPolicy,
    /// Colorize rendered labels
    pub color: bool,
}

impl From<&ChatConfig> for LoopConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            prompt: config.prompt.clone(),
            completion_timeout: Duration::from_secs(config.completion_timeout_seconds),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
            color: config.color,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

/// The conversation loop
///
/// Owns the transcript and the loop state for the whole session; the
/// completion service only ever sees a borrowed view of the transcript.
///
/// # Examples
///
/// ```no_run
/// use toolchat::agent::{BufReadInput, ConversationLoop, LoopConfig, ToolExecutingService};
/// use toolchat::config::Config;
/// use toolchat::providers::create_provider;
/// use toolchat::tools::build_default_registry;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> toolchat::error::Result<()> {
/// let config = Config::default();
/// let provider = create_provider(&config.provider.provider_type, &config.provider)?;
/// let registry = build_default_registry(&config.tools);
/// let service = ToolExecutingService::new(provider, registry, config.chat.system_prompt.clone());
/// let definitions = service.tool_definitions();
///
/// let mut chat = ConversationLoop::new(
///     Box::new(service),
///     definitions,
///     LoopConfig::from(&config.chat),
/// );
/// let mut input = BufReadInput::new(std::io::stdin().lock());
/// let exit = chat
///     .run(&mut input, &mut std::io::stdout(), &CancellationToken::new())
///     .await?;
/// println!("{:?}", exit);
/// # Ok(())
/// # }
/// ```
pub struct ConversationLoop {
    service: Box<dyn CompletionService>,
    tools: Vec<serde_json::Value>,
    config: LoopConfig,
    renderer: Renderer,
    transcript: Transcript,
    state: LoopState,
    turns: usize,
}

impl ConversationLoop {
    /// Creates a loop with an empty transcript, waiting for human input
    ///
    /// # Arguments
    ///
    /// * `service` - Completion service that resolves each exchange
    /// * `tools` - Tool descriptors passed to the service on every call
    /// * `config` - Prompt, timeout, retry and color settings
    pub fn new(
        service: Box<dyn CompletionService>,
        tools: Vec<serde_json::Value>,
        config: LoopConfig,
    ) -> Self {
        Self {
            service,
            tools,
            renderer: Renderer::new(config.color),
            config,
            transcript: Transcript::new(),
            state: LoopState::NeedHumanInput,
            turns: 0,
        }
    }

    /// The transcript so far
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// State for the next iteration
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Completed iterations
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Runs iterations until the input closes or `cancel` fires
    ///
    /// The token is checked before each iteration and raced against the
    /// in-flight iteration. A cancelled completion call appends nothing.
    ///
    /// # Errors
    ///
    /// Returns the first completion-service or output failure; the
    /// transcript keeps every entry appended before it
    pub async fn run(
        &mut self,
        input: &mut dyn HumanInput,
        output: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<LoopExit> {
        info!("Conversation loop started");

        loop {
            if cancel.is_cancelled() {
                info!(turns = self.turns, "Conversation loop cancelled");
                return Ok(LoopExit::Cancelled { turns: self.turns });
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.run_turn(&mut *input, &mut *output) => Some(result),
            };

            match outcome {
                None => {
                    info!(turns = self.turns, "Conversation loop cancelled mid-turn");
                    return Ok(LoopExit::Cancelled { turns: self.turns });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) if is_input_closed(&e) => {
                    info!(turns = self.turns, "Input closed, ending conversation");
                    return Ok(LoopExit::InputClosed { turns: self.turns });
                }
                Some(Err(e)) => return Err(e),
            }
        }
    }

    /// Runs exactly one iteration
    ///
    /// # Errors
    ///
    /// Returns `ToolchatError::InputClosed` if a human line was needed and
    /// the channel is closed, or the completion failure. On failure nothing
    /// produced by the completion call is rendered or appended.
    pub async fn run_turn(
        &mut self,
        input: &mut dyn HumanInput,
        output: &mut dyn Write,
    ) -> Result<TurnReport> {
        let read_input = self.state == LoopState::NeedHumanInput;
        let mut appended = 0;

        if read_input {
            let line = input.read_line(&self.config.prompt)?;
            self.transcript.push(Message::user(line));
            appended += 1;
        }

        debug!(
            turn = self.turns + 1,
            transcript_len = self.transcript.len(),
            estimated_tokens = self.transcript.estimated_tokens(),
            read_input,
            "Requesting completion"
        );

        let outcome = self.complete_with_retry().await?;
        outcome.check_contract()?;

        self.state = LoopState::NeedHumanInput;

        if let Some(usage) = outcome.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Token usage"
            );
        }

        self.renderer.render_outcome(output, &outcome)?;

        appended += outcome.new_entries.len();
        let tool_calls = outcome.tool_calls.len();
        let continue_with_model = outcome.has_tool_calls();
        self.transcript.extend(outcome.new_entries);

        if continue_with_model {
            self.state = LoopState::NeedModelContinuation;
        }
        self.turns += 1;

        Ok(TurnReport {
            read_input,
            tool_calls,
            appended,
            next_state: self.state,
        })
    }

    async fn complete_with_retry(&self) -> Result<TurnOutcome> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            match self.complete_once().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < policy.max_retries => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Completion failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn complete_once(&self) -> Result<TurnOutcome> {
        let call = self
            .service
            .complete_turn(self.transcript.messages(), &self.tools);

        match tokio::time::timeout(self.config.completion_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ToolchatError::CompletionTimeout {
                seconds: self.config.completion_timeout.as_secs(),
            }
            .into()),
        }
    }
}
