//! Weather lookup tool
//!
//! A demonstration tool: it reports a plausible Fahrenheit temperature for any
//! location without contacting a weather service.

use crate::error::{Result, ToolchatError};
use crate::tools::ToolExecutor;
use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

/// Name the weather tool is registered under
pub const TOOL_NAME: &str = "weather";

const BASE_TEMPERATURE_F: i64 = 72;
const TEMPERATURE_SPREAD_F: i64 = 10;

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

/// Weather tool executor
#[derive(Debug, Default, Clone)]
pub struct WeatherTool;

impl WeatherTool {
    /// Create a new weather tool
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolExecutor for WeatherTool {
    fn tool_definition(&self) -> Value {
        json!({
            "name": TOOL_NAME,
            "description": "Get the weather in a location",
            "parameters": {
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The location to get the weather for"
                    }
                },
                "required": ["location"]
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: WeatherArgs = serde_json::from_value(args).map_err(|e| {
            ToolchatError::Tool(format!("Invalid arguments for '{}': {}", TOOL_NAME, e))
        })?;

        let temperature = BASE_TEMPERATURE_F
            + rand::rng().random_range(-TEMPERATURE_SPREAD_F..=TEMPERATURE_SPREAD_F);

        tracing::debug!(location = %args.location, temperature, "Weather lookup");

        Ok(json!({
            "location": args.location,
            "temperature": temperature,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_requires_location() {
        let definition = WeatherTool::new().tool_definition();
        assert_eq!(definition["name"], TOOL_NAME);
        assert_eq!(definition["parameters"]["required"], json!(["location"]));
    }

    #[tokio::test]
    async fn test_execute_reports_location_and_temperature() {
        let result = WeatherTool::new()
            .execute(json!({"location": "Paris"}))
            .await
            .unwrap();

        assert_eq!(result["location"], "Paris");
        let temperature = result["temperature"].as_i64().unwrap();
        assert!((62..=82).contains(&temperature));
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_location() {
        let err = WeatherTool::new().execute(json!({"city": "Paris"})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid arguments"));
    }
}
