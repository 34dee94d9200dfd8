//! Agent module for toolchat
//!
//! This module contains the conversation core: the transcript, the
//! completion service seam, the turn-taking loop, console rendering, and the
//! human input channel.

pub mod completion;
pub mod conversation;
pub mod core;
pub mod input;
pub mod render;

pub use completion::{CompletionService, ToolExecutingService, ToolInvocationResult, TurnOutcome};
pub use conversation::Transcript;
pub use core::{ConversationLoop, LoopConfig, LoopExit, LoopState, RetryPolicy, TurnReport};
pub use input::{BufReadInput, HumanInput, ReadlineInput};
pub use render::Renderer;
