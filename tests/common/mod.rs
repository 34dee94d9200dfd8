use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config file pointing the Ollama provider at `host`
#[allow(dead_code)]
pub fn ollama_config_yaml(host: &str) -> String {
    format!(
        r#"
provider:
  type: ollama
  ollama:
    host: {host}
    model: test-model
    request_timeout_seconds: 5
chat:
  system_prompt: You are a test assistant.
  color: false
  completion_timeout_seconds: 5
tools:
  weather: true
"#
    )
}

/// Non-streaming `/api/chat` body with plain assistant text
#[allow(dead_code)]
pub fn ollama_text_reply(text: &str) -> Value {
    json!({
        "model": "test-model",
        "message": {"role": "assistant", "content": text},
        "done": true,
        "prompt_eval_count": 12,
        "eval_count": 4
    })
}

/// Non-streaming `/api/chat` body with one weather tool call
#[allow(dead_code)]
pub fn ollama_weather_call(id: &str, location: &str) -> Value {
    json!({
        "model": "test-model",
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{
                "id": id,
                "function": {"name": "weather", "arguments": {"location": location}}
            }]
        },
        "done": true
    })
}
