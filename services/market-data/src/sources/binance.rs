use crate::http::RetryingClient;
use crate::types::*;
use serde::Deserialize;

/// Binance USD-M futures REST client (funding + open interest)
pub struct BinanceFuturesClient {
    http: RetryingClient,
    base_url: String,
}

/// Latest derivatives positioning for one symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundingAndInterest {
    /// Percent per 8h
    pub funding_rate_pct: f64,
    pub open_interest: f64,
}

impl BinanceFuturesClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://fapi.binance.com";

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

    pub async fn funding_and_open_interest(&self, symbol: &str) -> Result<FundingAndInterest> {
        let funding_url = format!("{}/fapi/v1/fundingRate", self.base_url);
        let oi_url = format!("{}/fapi/v1/openInterest", self.base_url);
        let query = [("symbol", symbol)];

        let funding: Vec<FundingRateEntry> = self.http.get_json(&funding_url, &query, &[]).await?;
        let open_interest: OpenInterestResponse = self.http.get_json(&oi_url, &query, &[]).await?;

        let latest = funding
            .last()
            .ok_or_else(|| MarketDataError::InvalidResponse("Empty funding history".to_string()))?;

        Ok(FundingAndInterest {
            funding_rate_pct: parse_decimal_str(&latest.funding_rate)? * 100.0,
            open_interest: parse_decimal_str(&open_interest.open_interest)?,
        })
    }

    pub async fn btc_funding_and_open_interest(&self) -> Result<FundingAndInterest> {
        self.funding_and_open_interest("BTCUSDT").await
    }

    pub fn name(&self) -> &str {
        "binance"
    }
}

// Binance encodes numbers as strings
fn parse_decimal_str(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| MarketDataError::InvalidResponse(format!("{raw}: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundingRateEntry {
    funding_rate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestResponse {
    open_interest: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_latest_funding_converted_to_percent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/fundingRate"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"symbol": "BTCUSDT", "fundingRate": "0.00010000", "fundingTime": 1},
                {"symbol": "BTCUSDT", "fundingRate": "0.00125000", "fundingTime": 2}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/openInterest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "symbol": "BTCUSDT", "openInterest": "81234.5"
            })))
            .mount(&server)
            .await;

        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = BinanceFuturesClient::new(http).with_base_url(&server.uri());
        let result = client.btc_funding_and_open_interest().await.unwrap();

        assert!((result.funding_rate_pct - 0.125).abs() < 1e-12);
        assert_eq!(result.open_interest, 81234.5);
    }

    #[tokio::test]
    async fn test_empty_history_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/fundingRate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fapi/v1/openInterest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "openInterest": "1"
            })))
            .mount(&server)
            .await;

        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = BinanceFuturesClient::new(http).with_base_url(&server.uri());

        assert!(client.btc_funding_and_open_interest().await.is_err());
    }
}
