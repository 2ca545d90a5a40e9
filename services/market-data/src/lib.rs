pub mod fallback;
pub mod http;
pub mod types;
pub mod sources {
    pub mod binance;
    pub mod blockchaincenter;
    pub mod calendar;
    pub mod coingecko;
    pub mod defillama;
    pub mod hyperliquid;
}

pub use http::{RetryPolicy, RetryingClient};
pub use sources::binance::BinanceFuturesClient;
pub use sources::blockchaincenter::AltSeasonClient;
pub use sources::calendar::CalendarClient;
pub use sources::coingecko::CoinGeckoClient;
pub use sources::defillama::DefiLlamaClient;
pub use sources::hyperliquid::HyperliquidClient;
pub use types::*;

use chrono::Utc;
use tracing::{info, warn};

/// Perp symbol watched for secondary leverage signals
pub const HYPE_SYMBOL: &str = "HYPE";

/// API keys and endpoint overrides for every upstream source
#[derive(Debug, Clone, Default)]
pub struct MarketDataConfig {
    pub coingecko_api_key: Option<String>,
    pub tradingecon_key: Option<String>,
    pub finnhub_key: Option<String>,
}

/// Polls every upstream feed and assembles one `MetricSnapshot`
pub struct MarketDataClient {
    coingecko: CoinGeckoClient,
    alt_season: AltSeasonClient,
    binance: BinanceFuturesClient,
    hyperliquid: HyperliquidClient,
    defillama: DefiLlamaClient,
    calendar: CalendarClient,
}

impl MarketDataClient {
    pub fn new(config: MarketDataConfig, policy: RetryPolicy) -> Result<Self> {
        let http = RetryingClient::new(policy)?;

        Ok(Self {
            coingecko: CoinGeckoClient::new(http.clone(), config.coingecko_api_key),
            alt_season: AltSeasonClient::new(http.clone()),
            binance: BinanceFuturesClient::new(http.clone()),
            hyperliquid: HyperliquidClient::new(http.clone()),
            defillama: DefiLlamaClient::new(http.clone()),
            calendar: CalendarClient::new(http, config.tradingecon_key, config.finnhub_key),
        })
    }

    /// Assemble a client from individually configured sources
    pub fn from_sources(
        coingecko: CoinGeckoClient,
        alt_season: AltSeasonClient,
        binance: BinanceFuturesClient,
        hyperliquid: HyperliquidClient,
        defillama: DefiLlamaClient,
        calendar: CalendarClient,
    ) -> Self {
        Self {
            coingecko,
            alt_season,
            binance,
            hyperliquid,
            defillama,
            calendar,
        }
    }

    /// Fetch every metric concurrently.
    ///
    /// Never fails: a source that errors is replaced by its fallback value.
    pub async fn get_all_metrics(&self) -> MetricSnapshot {
        let (global, alt_index, btc_derivs, hype_funding, stable_delta, events) = tokio::join!(
            self.coingecko.global_market(),
            self.alt_season.latest_index(),
            self.binance.btc_funding_and_open_interest(),
            self.hyperliquid.funding_rate(HYPE_SYMBOL),
            self.defillama.stablecoin_delta(),
            self.calendar.high_impact_events(),
        );

        let (btc_dominance, alt_market_cap) = match global {
            Ok(g) => (g.btc_dominance, g.alt_market_cap_usd),
            Err(e) => {
                warn!("{} failed, using fallback: {}", self.coingecko.name(), e);
                (fallback::BTC_DOMINANCE, fallback::ALT_MARKET_CAP)
            }
        };

        let alt_season_index = or_fallback(self.alt_season.name(), alt_index, fallback::ALT_SEASON_INDEX);

        let (btc_funding_rate, btc_open_interest) = match btc_derivs {
            Ok(d) => (d.funding_rate_pct, d.open_interest),
            Err(e) => {
                warn!("{} failed, using fallback: {}", self.binance.name(), e);
                (fallback::BTC_FUNDING_RATE, fallback::BTC_OPEN_INTEREST)
            }
        };

        let hype_funding_rate =
            or_fallback(self.hyperliquid.name(), hype_funding, fallback::HYPE_FUNDING_RATE);
        let stablecoin_delta =
            or_fallback(self.defillama.name(), stable_delta, fallback::STABLECOIN_DELTA);

        let macro_events = match events {
            Ok(Some(events)) => events,
            Ok(None) => fallback::macro_events(),
            Err(e) => {
                warn!("{} failed, using fallback: {}", self.calendar.name(), e);
                fallback::macro_events()
            }
        };

        let snapshot = MetricSnapshot {
            btc_dominance: Some(btc_dominance),
            alt_market_cap: Some(alt_market_cap),
            alt_season_index: Some(alt_season_index),
            btc_funding_rate: Some(btc_funding_rate),
            btc_open_interest: Some(btc_open_interest),
            hype_funding_rate: Some(hype_funding_rate),
            stablecoin_delta: Some(stablecoin_delta),
            macro_events,
            timestamp: Utc::now(),
        };

        info!(
            "Metrics: BTC.D {:.1}% | alt index {:.1} | BTC funding {:.3}% | HYPE funding {:.3}% | stables {:.1}B | {} macro events",
            btc_dominance,
            alt_season_index,
            btc_funding_rate,
            hype_funding_rate,
            stablecoin_delta / 1e9,
            snapshot.macro_events.len()
        );

        snapshot
    }
}

fn or_fallback(source: &str, result: Result<f64>, fallback: f64) -> f64 {
    result.unwrap_or_else(|e| {
        warn!("{} failed, using fallback: {}", source, e);
        fallback
    })
}

#[async_trait::async_trait]
impl SnapshotSource for MarketDataClient {
    async fn fetch_snapshot(&self) -> Result<MetricSnapshot> {
        Ok(self.get_all_metrics().await)
    }

    fn name(&self) -> &str {
        "live"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_against(server: &MockServer) -> MarketDataClient {
        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let base = server.uri();

        MarketDataClient::from_sources(
            CoinGeckoClient::new(http.clone(), None).with_base_url(&base),
            AltSeasonClient::new(http.clone()).with_url(&format!("{base}/alt.csv")),
            BinanceFuturesClient::new(http.clone()).with_base_url(&base),
            HyperliquidClient::new(http.clone()).with_base_url(&base),
            DefiLlamaClient::new(http.clone()).with_url(&format!("{base}/stablecoins")),
            CalendarClient::new(http, None, None),
        )
    }

    #[tokio::test]
    async fn test_everything_down_yields_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let snapshot = client_against(&server).get_all_metrics().await;

        assert_eq!(snapshot.btc_dominance, Some(fallback::BTC_DOMINANCE));
        assert_eq!(snapshot.alt_season_index, Some(fallback::ALT_SEASON_INDEX));
        assert_eq!(snapshot.btc_funding_rate, Some(fallback::BTC_FUNDING_RATE));
        assert_eq!(snapshot.hype_funding_rate, Some(fallback::HYPE_FUNDING_RATE));
        assert_eq!(snapshot.stablecoin_delta, Some(fallback::STABLECOIN_DELTA));
        assert_eq!(snapshot.macro_events, fallback::macro_events());
    }

    #[tokio::test]
    async fn test_live_values_win_over_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/global"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "market_cap_percentage": {"btc": 62.0},
                    "total_market_cap": {"usd": 1000.0}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alt.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("date,value\n2025-07-02,33\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let snapshot = client_against(&server).get_all_metrics().await;

        assert_eq!(snapshot.btc_dominance, Some(62.0));
        assert_eq!(snapshot.alt_season_index, Some(33.0));
        assert_eq!(snapshot.btc_funding_rate, Some(fallback::BTC_FUNDING_RATE));
    }

    #[test]
    fn test_snapshot_missing_fields_deserialize_as_absent() {
        let snapshot: MetricSnapshot =
            serde_json::from_str(r#"{"btc_dominance": 65.0, "macro_events": []}"#).unwrap();
        assert_eq!(snapshot.btc_dominance, Some(65.0));
        assert_eq!(snapshot.alt_season_index, None);
        assert!(snapshot.macro_events.is_empty());
    }
}
