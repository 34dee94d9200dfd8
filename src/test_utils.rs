//! Test utilities for toolchat
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, and assertion helpers.

use crate::config::Config;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or the message does not contain `expected`
pub fn assert_error_contains<T: std::fmt::Debug>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error containing '{}', got Ok({:?})", expected, value),
        Err(e) => {
            let message = format!("{:#}", e);
            assert!(
                message.contains(expected),
                "Error '{}' does not contain '{}'",
                message,
                expected
            );
        }
    }
}

/// Configuration suitable for tests: no color, short timeout
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.chat.color = false;
    config.chat.completion_timeout_seconds = 5;
    config
}

/// YAML text of a complete configuration file
pub fn test_config_yaml() -> String {
    r#"
provider:
  type: ollama
  ollama:
    host: http://127.0.0.1:11434
    model: test-model
    request_timeout_seconds: 10

chat:
  system_prompt: You are a test assistant.
  prompt: "You: "
  color: false
  completion_timeout_seconds: 5
  max_retries: 1
  retry_base_delay_ms: 10

tools:
  weather: true
"#
    .to_string()
}
