use crate::http::RetryingClient;
use crate::types::*;
use serde::Deserialize;

/// BTC dominance and the market cap left over for everything else
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalMarket {
    /// Percent
    pub btc_dominance: f64,
    pub total_market_cap_usd: f64,
    pub alt_market_cap_usd: f64,
}

/// CoinGecko API client
pub struct CoinGeckoClient {
    http: RetryingClient,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    pub fn new(http: RetryingClient, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `GET /global`
    pub async fn global_market(&self) -> Result<GlobalMarket> {
        let url = format!("{}/global", self.base_url);
        let headers: Vec<(&str, &str)> = self
            .api_key
            .as_deref()
            .map(|key| vec![("x-cg-pro-api-key", key)])
            .unwrap_or_default();

        let response: GlobalResponse = self.http.get_json(&url, &[], &headers).await?;

        let btc_dominance = response
            .data
            .market_cap_percentage
            .get("btc")
            .copied()
            .ok_or_else(|| MarketDataError::InvalidResponse("Missing btc dominance".to_string()))?;
        let total = response
            .data
            .total_market_cap
            .get("usd")
            .copied()
            .ok_or_else(|| MarketDataError::InvalidResponse("Missing usd market cap".to_string()))?;

        Ok(GlobalMarket {
            btc_dominance,
            total_market_cap_usd: total,
            alt_market_cap_usd: total * (1.0 - btc_dominance / 100.0),
        })
    }

    pub fn name(&self) -> &str {
        "coingecko"
    }
}

// Response types for CoinGecko API
#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    market_cap_percentage: std::collections::HashMap<String, f64>,
    total_market_cap: std::collections::HashMap<String, f64>,
}
