use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One evaluation cycle's worth of market metrics.
///
/// Every numeric field is optional: a degraded or mocked source may leave
/// any of them out, and consumers substitute their own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSnapshot {
    /// BTC share of total crypto market cap, in percent
    #[serde(default)]
    pub btc_dominance: Option<f64>,
    /// Total market cap minus BTC, in USD
    #[serde(default)]
    pub alt_market_cap: Option<f64>,
    /// Composite 0-100 score, higher means capital favours alts
    #[serde(default)]
    pub alt_season_index: Option<f64>,
    /// Latest BTC perp funding rate, in percent per 8h
    #[serde(default)]
    pub btc_funding_rate: Option<f64>,
    #[serde(default)]
    pub btc_open_interest: Option<f64>,
    /// Latest HYPE perp funding rate, in percent per 8h
    #[serde(default)]
    pub hype_funding_rate: Option<f64>,
    /// 7-day change in stablecoin supply, in USD
    #[serde(default)]
    pub stablecoin_delta: Option<f64>,
    #[serde(default)]
    pub macro_events: Vec<MacroEvent>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn empty_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            btc_dominance: None,
            alt_market_cap: None,
            alt_season_index: None,
            btc_funding_rate: None,
            btc_open_interest: None,
            hype_funding_rate: None,
            stablecoin_delta: None,
            macro_events: Vec::new(),
            timestamp,
        }
    }
}

/// Upcoming high-impact macro event.
///
/// `date` stays a raw `YYYY-MM-DD` string; upstream calendars are not
/// trusted to produce valid dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroEvent {
    pub event: String,
    pub date: String,
    #[serde(default)]
    pub importance: i64,
}

impl MacroEvent {
    pub fn new(event: impl Into<String>, date: impl Into<String>, importance: i64) -> Self {
        Self {
            event: event.into(),
            date: date.into(),
            importance,
        }
    }
}

/// Error types for market data retrieval
#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Snapshot file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Gave up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Anything that can produce a fresh snapshot once per cycle
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<MetricSnapshot>;

    /// Source name, used in logs
    fn name(&self) -> &str;
}
