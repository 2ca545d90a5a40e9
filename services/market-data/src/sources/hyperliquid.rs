use crate::http::RetryingClient;
use crate::types::*;
use serde::Deserialize;

pub struct HyperliquidClient {
    http: RetryingClient,
    base_url: String,
}

impl HyperliquidClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.hyperliquid.xyz";

    pub fn new(http: RetryingClient) -> Self {
        Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Latest perp funding rate for `symbol`, in percent
    pub async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/info", self.base_url);
        let body = serde_json::json!({
            "type": "perpFundingRates",
            "symbol": symbol,
        });

        let entries: Vec<FundingEntry> = self.http.post_json(&url, &body).await?;
        let first = entries
            .first()
            .ok_or_else(|| MarketDataError::InvalidResponse(format!("No funding for {symbol}")))?;

        Ok(first.funding_rate.as_f64()? * 100.0)
    }

    pub fn name(&self) -> &str {
        "hyperliquid"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundingEntry {
    funding_rate: NumberOrString,
}

/// Hyperliquid is inconsistent about quoting numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Result<f64> {
        match self {
            NumberOrString::Number(n) => Ok(*n),
            NumberOrString::Text(s) => s
                .parse::<f64>()
                .map_err(|e| MarketDataError::InvalidResponse(format!("{s}: {e}"))),
        }
    }
}
