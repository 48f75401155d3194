use crate::tools::{extract_string_arg, http_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

const ALPHAVANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Daily low/high lookup against Alpha Vantage. Without an API key it
/// serves a canned quote so demo runs work offline.
pub struct StockPriceTool {
    client: reqwest::Client,
    api_key: String,
}

impl StockPriceTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
        }
    }

    async fn fetch_range(&self, ticker: &str, date: &str) -> anyhow::Result<(String, String)> {
        let response = self
            .client
            .get(ALPHAVANTAGE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let data: serde_json::Value = response.json().await?;

        let day = data
            .get("Time Series (Daily)")
            .and_then(|series| series.get(date))
            .ok_or_else(|| anyhow::anyhow!("no quote for {} on {}", ticker, date))?;
        let low = day
            .get("3. low")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("quote is missing the low field"))?;
        let high = day
            .get("2. high")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("quote is missing the high field"))?;
        Ok((low.to_string(), high.to_string()))
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Gets the low and high stock price of a ticker for a given date, in USD."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol, for example 'AAPL'"
                },
                "date": {
                    "type": "string",
                    "description": "Date in YYYY-MM-DD format"
                }
            },
            "required": ["ticker", "date"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let ticker = extract_string_arg(&args, "ticker")?;
        let date = extract_string_arg(&args, "date")?;

        if self.api_key.is_empty() {
            tracing::debug!(%ticker, "no stock API key, returning demo quote");
            return Ok(ToolResult::success(
                json!({"low": "245.4500", "high": "249.0300"}).to_string(),
            ));
        }

        let quote = match self.fetch_range(&ticker, &date).await {
            Ok((low, high)) => json!({"low": low, "high": high}),
            Err(e) => {
                tracing::warn!(%ticker, %date, error = %e, "stock lookup failed");
                json!({"low": "none", "high": "none"})
            }
        };
        Ok(ToolResult::success(quote.to_string()))
    }
}
