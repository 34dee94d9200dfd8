//! Append-only conversation transcript
//!
//! The transcript is the only state carried from one completion call to the
//! next. Entries are only ever appended; nothing reorders, edits, or prunes
//! them while a session runs.

use crate::providers::Message;

/// Ordered, append-only list of conversation entries
///
/// # Token Counting
///
/// `estimated_tokens` uses characters / 4 as a rough approximation of
/// tokenizer output. It is informational (logged per turn) and never used to
/// drop entries.
///
/// # Examples
///
/// ```
/// use toolchat::agent::Transcript;
/// use toolchat::providers::Message;
///
/// let mut transcript = Transcript::new();
/// transcript.push(Message::user("hello"));
/// transcript.extend(vec![Message::assistant("hi there")]);
/// assert_eq!(transcript.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    estimated_tokens: usize,
}

impl Transcript {
    /// Creates an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry
    pub fn push(&mut self, message: Message) {
        self.estimated_tokens += estimate_message_tokens(&message);
        self.messages.push(message);
    }

    /// Appends entries in the order given
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }

    /// All entries in chronological order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rough token estimate for the whole transcript
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }
}

fn estimate_message_tokens(message: &Message) -> usize {
    match message {
        Message::System { content } | Message::User { content } => estimate_tokens(content),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            content.as_deref().map(estimate_tokens).unwrap_or(0)
                + tool_calls
                    .iter()
                    .map(|call| {
                        estimate_tokens(&call.function.name)
                            + estimate_tokens(&call.function.arguments.to_string())
                    })
                    .sum::<usize>()
        }
        Message::Tool { name, content, .. } => {
            estimate_tokens(name) + estimate_tokens(&content.to_string())
        }
    }
}

/// Estimates token count for a string (characters / 4, rounded up)
fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ToolCall;
    use serde_json::json;

    #[test]
    fn test_new_transcript_is_empty() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.estimated_tokens(), 0);
        assert!(transcript.last().is_none());
    }

    #[test]
    fn test_push_and_extend_preserve_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("what's the weather in Paris?"));
        transcript.extend(vec![
            Message::assistant_with_tools(vec![ToolCall::new(
                "call_1",
                "weather",
                json!({"location": "Paris"}),
            )]),
            Message::tool_result("call_1", "weather", json!({"temperature": 64})),
        ]);

        let roles: Vec<&str> = transcript.messages().iter().map(Message::role).collect();
        assert_eq!(roles, vec!["user", "assistant", "tool"]);
        assert_eq!(transcript.last().map(Message::role), Some("tool"));
    }

    #[test]
    fn test_estimated_tokens_grows() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("abcd"));
        assert_eq!(transcript.estimated_tokens(), 1);
        transcript.push(Message::assistant("abcdefgh"));
        assert_eq!(transcript.estimated_tokens(), 3);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
