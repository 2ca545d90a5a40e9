//! Altcoin season index published as a CSV feed

use crate::http::RetryingClient;
use crate::types::*;
use std::collections::HashMap;

/// Column names tried in order before falling back to any numeric cell
const INDEX_COLUMNS: [&str; 4] = ["value", "index", "score", "alt_season_index"];

pub struct AltSeasonClient {
    http: RetryingClient,
    url: String,
}

impl AltSeasonClient {
    pub const DEFAULT_URL: &'static str =
        "https://www.blockchaincenter.net/altcoin-season-index.csv";

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

    /// Index value from the most recent (last) row of the feed
    pub async fn latest_index(&self) -> Result<f64> {
        let body = self.http.get_text(&self.url).await?;
        parse_latest_index(&body)
    }

    pub fn name(&self) -> &str {
        "blockchaincenter"
    }
}

/// Parse the feed body and pull the index out of its last row
pub fn parse_latest_index(body: &str) -> Result<f64> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))?
        .clone();

    let mut last: Option<csv::StringRecord> = None;
    for record in reader.records() {
        last = Some(record.map_err(|e| MarketDataError::InvalidResponse(e.to_string()))?);
    }
    let last = last.ok_or_else(|| MarketDataError::InvalidResponse("Empty CSV feed".to_string()))?;

    let row: HashMap<&str, &str> = headers.iter().zip(last.iter()).collect();

    for column in INDEX_COLUMNS {
        if let Some(raw) = row.get(column) {
            return raw
                .trim()
                .parse::<f64>()
                .map_err(|e| MarketDataError::InvalidResponse(format!("{column}: {e}")));
        }
    }

    // No known column, take the first cell in file order that looks numeric
    last.iter()
        .find_map(|cell| cell.trim().parse::<f64>().ok())
        .ok_or_else(|| MarketDataError::InvalidResponse("No numeric value in last row".to_string()))
}
