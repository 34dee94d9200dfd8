//! Human-facing input channel
//!
//! The conversation loop reads one line at a time through [`HumanInput`].
//! A closed stream is reported as `ToolchatError::InputClosed`, which ends the
//! loop cleanly.

use crate::error::{Result, ToolchatError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::BufRead;

/// Line-oriented source of human input
pub trait HumanInput {
    /// Blocks until one line is available
    ///
    /// The returned line has its line terminator removed and is otherwise
    /// verbatim, so an empty line yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns `ToolchatError::InputClosed` when the stream has ended and
    /// `ToolchatError::Input` when reading fails
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Interactive line editor input with in-memory history
pub struct ReadlineInput {
    editor: DefaultEditor,
}

impl ReadlineInput {
    /// Creates a line editor bound to the controlling terminal
    ///
    /// # Errors
    ///
    /// Returns error if the terminal cannot be initialized
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new()
            .map_err(|e| ToolchatError::Input(format!("Failed to start line editor: {}", e)))?;
        Ok(Self { editor })
    }
}

impl HumanInput for ReadlineInput {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        tracing::debug!("Failed to record history entry: {}", e);
                    }
                }
                Ok(line)
            }
            // Ctrl-C at the prompt ends the session the same way Ctrl-D does
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Err(ToolchatError::InputClosed.into())
            }
            Err(err) => Err(ToolchatError::Input(err.to_string()).into()),
        }
    }
}

/// Input read from any buffered reader, used for piped stdin and tests
///
/// No prompt is written. Bytes that are not valid UTF-8 are replaced with
/// U+FFFD rather than failing the session.
///
/// # Examples
///
/// ```
/// use toolchat::agent::{BufReadInput, HumanInput};
///
/// let mut input = BufReadInput::new("hello\r\n\nbye".as_bytes());
/// assert_eq!(input.read_line("You: ").unwrap(), "hello");
/// assert_eq!(input.read_line("You: ").unwrap(), "");
/// assert_eq!(input.read_line("You: ").unwrap(), "bye");
/// assert!(input.read_line("You: ").is_err());
/// ```
pub struct BufReadInput<R> {
    reader: R,
}

impl<R: BufRead> BufReadInput<R> {
    /// Wraps a reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> HumanInput for BufReadInput<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ToolchatError::Input(e.to_string()))?;
        if read == 0 {
            return Err(ToolchatError::InputClosed.into());
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_input_closed;
    use std::io::Cursor;

    #[test]
    fn test_strips_line_terminators_only() {
        let mut input = BufReadInput::new(Cursor::new("  padded  \nwindows\r\n"));
        assert_eq!(input.read_line("").unwrap(), "  padded  ");
        assert_eq!(input.read_line("").unwrap(), "windows");
    }

    #[test]
    fn test_empty_line_is_returned() {
        let mut input = BufReadInput::new(Cursor::new("\n"));
        assert_eq!(input.read_line("").unwrap(), "");
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut input = BufReadInput::new(Cursor::new("final"));
        assert_eq!(input.read_line("").unwrap(), "final");
        assert!(is_input_closed(&input.read_line("").unwrap_err()));
    }

    #[test]
    fn test_empty_stream_is_closed() {
        let mut input = BufReadInput::new(Cursor::new(""));
        let err = input.read_line("You: ").unwrap_err();
        assert!(is_input_closed(&err));
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut input = BufReadInput::new(Cursor::new(b"caf\xe9\nnext\n".to_vec()));
        assert_eq!(input.read_line("").unwrap(), "caf\u{FFFD}");
        assert_eq!(input.read_line("").unwrap(), "next");
        assert!(is_input_closed(&input.read_line("").unwrap_err()));
    }
}
