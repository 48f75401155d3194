use crate::tools::{extract_f64_arg, http_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use chrono::{Local, TimeZone};
use serde_json::{Value, json};

/// 5-day forecast at 3-hour intervals from OpenWeatherMap, shaped as a list
/// of `{"YYYY-MM-DD HH:MM:SS": temperature}` pairs.
///
/// Unlike the other weather tools this one propagates fetch errors instead
/// of degrading, so a broken lookup surfaces in the transcript.
pub struct WeatherForecastTool {
    client: reqwest::Client,
    api_key: String,
}

impl WeatherForecastTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
        }
    }

    async fn fetch(&self, lat: f64, lon: f64) -> anyhow::Result<Vec<Value>> {
        let data: Value = self
            .client
            .get("https://api.openweathermap.org/data/2.5/forecast")
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let entries = data["list"].as_array().cloned().unwrap_or_default();
        let mut formatted = Vec::with_capacity(entries.len());

        for item in entries {
            let Some(dt) = item["dt"].as_i64() else {
                continue;
            };
            let temperature = item["main"]["temp"].as_f64().unwrap_or(0.0);
            let Some(stamp) = Local.timestamp_opt(dt, 0).single() else {
                continue;
            };

            let mut point = serde_json::Map::new();
            point.insert(
                stamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                json!(temperature),
            );
            formatted.push(Value::Object(point));
        }

        tracing::info!(count = formatted.len(), "forecast datapoints fetched");
        Ok(formatted)
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "get_weather_forecast"
    }

    fn description(&self) -> &str {
        "Retrieves a 5-day weather forecast at 3-hourly intervals for a specific latitude and longitude. Returns a list of {\"YYYY-MM-DD HH:MM:SS\": temperature} pairs with temperatures in Celsius."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "lat": {
                    "type": "number",
                    "description": "Latitude coordinate in decimal degrees, range -90 to 90"
                },
                "lon": {
                    "type": "number",
                    "description": "Longitude coordinate in decimal degrees, range -180 to 180"
                }
            },
            "required": ["lat", "lon"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let lat = extract_f64_arg(&args, "lat")?;
        let lon = extract_f64_arg(&args, "lon")?;
        tracing::info!(lat, lon, "getting weather forecast");

        if self.api_key.is_empty() {
            tracing::debug!("no weather API key, returning demo forecast");
            return Ok(ToolResult::success(
                json!([{"2025-10-04 12:00:00": 25.3}]).to_string(),
            ));
        }

        let formatted = self.fetch(lat, lon).await?;
        Ok(ToolResult::success(Value::Array(formatted).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn demo_forecast_without_api_key() {
        let tool = WeatherForecastTool::new("");
        let result = tool
            .execute(json!({"lat": 37.7790262, "lon": -122.419906}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, r#"[{"2025-10-04 12:00:00":25.3}]"#);
    }

    #[tokio::test]
    async fn coordinates_are_required() {
        let tool = WeatherForecastTool::new("");
        assert!(tool.execute(json!({"lat": 37.0})).await.is_err());
    }
}
