use crate::http::RetryingClient;
use crate::types::*;
use serde_json::Value;

/// Share of total stablecoin supply assumed to be minted in a week.
/// The feed has no history, so the 7-day delta is estimated from the total.
pub const WEEKLY_CHANGE_ESTIMATE: f64 = 0.02;

pub struct DefiLlamaClient {
    http: RetryingClient,
    url: String,
}

impl DefiLlamaClient {
    pub const DEFAULT_URL: &'static str = "https://stablecoins.llama.fi/stablecoins";

    pub fn new(http: RetryingClient) -> Self {
        Self {
            http,
            url: Self::DEFAULT_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Estimated 7-day change in total stablecoin supply, in USD
    pub async fn stablecoin_delta(&self) -> Result<f64> {
        let body: Value = self.http.get_json(&self.url, &[], &[]).await?;
        Ok(total_supply(&body)? * WEEKLY_CHANGE_ESTIMATE)
    }

    pub fn name(&self) -> &str {
        "defillama"
    }
}

/// Sum supply across every listed stablecoin.
///
/// Accepts a bare array or the `{"peggedAssets": [...]}` envelope.
pub fn total_supply(body: &Value) -> Result<f64> {
    let assets = body
        .as_array()
        .or_else(|| body.get("peggedAssets").and_then(Value::as_array))
        .ok_or_else(|| MarketDataError::InvalidResponse("No stablecoin list".to_string()))?;

    Ok(assets.iter().map(asset_supply).sum())
}

fn asset_supply(asset: &Value) -> f64 {
    let pegged_usd = asset
        .get("circulating")
        .and_then(|c| c.get("peggedUSD"))
        .and_then(Value::as_f64);

    match (pegged_usd, asset.get("price").and_then(Value::as_f64)) {
        (Some(circulating), Some(price)) => circulating * price,
        (Some(circulating), None) => circulating,
        (None, _) => asset.get("mcap").and_then(Value::as_f64).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_supply_uses_price_when_present() {
        let body = json!([
            {"symbol": "USDT", "circulating": {"peggedUSD": 100.0}, "price": 1.0},
            {"symbol": "DAI", "circulating": {"peggedUSD": 50.0}, "price": 0.5},
            {"symbol": "USDC", "circulating": {"peggedUSD": 20.0}},
            {"symbol": "OLD", "mcap": 5.0},
            {"symbol": "JUNK"}
        ]);
        assert_eq!(total_supply(&body).unwrap(), 100.0 + 25.0 + 20.0 + 5.0);
    }

    #[test]
    fn test_envelope_is_accepted() {
        let body = json!({"peggedAssets": [{"circulating": {"peggedUSD": 10.0}}]});
        assert_eq!(total_supply(&body).unwrap(), 10.0);
    }

    #[test]
    fn test_unexpected_shape_is_invalid() {
        assert!(total_supply(&json!({"foo": 1})).is_err());
    }

    #[tokio::test]
    async fn test_delta_is_two_percent_of_supply() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "peggedAssets": [{"circulating": {"peggedUSD": 150_000_000_000.0}, "price": 1.0}]
            })))
            .mount(&server)
            .await;

        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = DefiLlamaClient::new(http).with_url(&server.uri());

        let delta = client.stablecoin_delta().await.unwrap();
        assert!((delta - 3_000_000_000.0).abs() < 1.0);
    }
}
