use crate::tools::{extract_string_arg, http_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

/// Current conditions from OpenWeatherMap. Without an API key it serves a
/// fixed demo observation so the loop stays runnable offline.
pub struct CurrentWeatherTool {
    client: reqwest::Client,
    api_key: String,
}

impl CurrentWeatherTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
        }
    }

    async fn fetch(&self, location: &str) -> anyhow::Result<serde_json::Value> {
        let data: serde_json::Value = self
            .client
            .get("https://api.openweathermap.org/data/2.5/weather")
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let description = data["weather"][0]["description"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("missing weather description"))?
            .to_string();
        let temperature = data["main"]["temp"].clone();
        let humidity = data["main"]["humidity"].clone();
        if temperature.is_null() || humidity.is_null() {
            anyhow::bail!("missing temperature data");
        }

        Ok(json!({
            "description": description,
            "temperature": temperature,
            "humidity": humidity,
        }))
    }
}

#[async_trait]
impl Tool for CurrentWeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Fetches the current weather for a given location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The name of the city for which to retrieve the weather information"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let location = extract_string_arg(&args, "location")?;
        tracing::info!(%location, "getting current weather");

        if self.api_key.is_empty() {
            tracing::debug!("no weather API key, returning demo observation");
            return Ok(ToolResult::success(
                json!({"description": "thunderstorms", "temperature": 25.3, "humidity": 94})
                    .to_string(),
            ));
        }

        let observation = match self.fetch(&location).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "weather lookup failed");
                json!({"description": "none", "temperature": "none", "humidity": "none"})
            }
        };

        Ok(ToolResult::success(observation.to_string()))
    }
}
