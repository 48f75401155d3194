use serde_json::Value;

pub mod complete;
pub mod forecast;
pub mod geo;
pub mod plot;
pub mod stock;
pub mod weather;

pub use complete::{PLAN_COMPLETE, PlanCompleteTool};
pub use forecast::WeatherForecastTool;
pub use geo::GeoCoordinatesTool;
pub use plot::PlotWeatherTool;
pub use stock::StockPriceTool;
pub use weather::CurrentWeatherTool;

pub fn extract_string_arg(args: &Value, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

pub fn extract_string_arg_opt(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

pub fn extract_f64_arg(args: &Value, key: &str) -> anyhow::Result<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}
