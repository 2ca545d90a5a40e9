//! High-impact macro calendar (TradingEconomics, then Finnhub)

use crate::http::RetryingClient;
use crate::types::*;
use serde_json::Value;
use tracing::warn;

/// Only the first few upcoming events are kept
pub const MAX_EVENTS: usize = 5;
/// Minimum importance for an event to count as high impact
pub const HIGH_IMPORTANCE: i64 = 3;

pub struct CalendarClient {
    http: RetryingClient,
    tradingecon_key: Option<String>,
    finnhub_key: Option<String>,
    tradingecon_url: String,
    finnhub_url: String,
}

impl CalendarClient {
    pub const TRADINGECON_URL: &'static str = "https://api.tradingeconomics.com/calendar";
    pub const FINNHUB_URL: &'static str = "https://finnhub.io/api/v1/calendar/economic";

    pub fn new(
        http: RetryingClient,
        tradingecon_key: Option<String>,
        finnhub_key: Option<String>,
    ) -> Self {
        Self {
            http,
            tradingecon_key,
            finnhub_key,
            tradingecon_url: Self::TRADINGECON_URL.to_string(),
            finnhub_url: Self::FINNHUB_URL.to_string(),
        }
    }

    pub fn with_urls(mut self, tradingecon_url: &str, finnhub_url: &str) -> Self {
        self.tradingecon_url = tradingecon_url.to_string();
        self.finnhub_url = finnhub_url.to_string();
        self
    }

    /// Upcoming high-impact events.
    ///
    /// Returns `Ok(None)` when no provider is configured or every configured
    /// provider failed, so the caller can decide what to substitute.
    pub async fn high_impact_events(&self) -> Result<Option<Vec<MacroEvent>>> {
        if let Some(key) = &self.tradingecon_key {
            let query = [("c", key.as_str()), ("importance", "3")];
            match self.http.get_json::<Value>(&self.tradingecon_url, &query, &[]).await {
                Ok(Value::Array(items)) if !items.is_empty() => {
                    return Ok(Some(
                        items.iter().filter_map(normalize_event).take(MAX_EVENTS).collect(),
                    ));
                }
                Ok(_) => warn!("TradingEconomics returned no events"),
                Err(e) => warn!("TradingEconomics API failed: {}", e),
            }
        }

        if let Some(key) = &self.finnhub_key {
            let query = [("token", key.as_str())];
            match self.http.get_json::<Value>(&self.finnhub_url, &query, &[]).await {
                Ok(body) => {
                    if let Some(items) = body.get("economicCalendar").and_then(Value::as_array) {
                        return Ok(Some(
                            items
                                .iter()
                                .filter_map(normalize_event)
                                .filter(|e| e.importance >= HIGH_IMPORTANCE)
                                .take(MAX_EVENTS)
                                .collect(),
                        ));
                    }
                    warn!("Finnhub response had no economicCalendar");
                }
                Err(e) => warn!("Finnhub API failed: {}", e),
            }
        }

        Ok(None)
    }

    pub fn name(&self) -> &str {
        "calendar"
    }
}

/// Map a provider record onto `MacroEvent`.
///
/// Providers disagree on key casing and on date vs datetime; the date is cut
/// to its `YYYY-MM-DD` prefix. Records without a name or date are dropped.
pub fn normalize_event(raw: &Value) -> Option<MacroEvent> {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| raw.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };

    let event = text(&["event", "Event"])?;
    let date = text(&["date", "Date", "time"])?;
    let date = date.get(..10).map(str::to_string).unwrap_or(date);

    let importance = ["importance", "Importance"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_i64))
        .or_else(|| match raw.get("impact").and_then(Value::as_str) {
            Some("high") => Some(3),
            Some("medium") => Some(2),
            Some("low") => Some(1),
            _ => None,
        })
        .unwrap_or(0);

    Some(MacroEvent {
        event,
        date,
        importance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_normalize_tradingeconomics_record() {
        let raw = json!({"Event": "Non Farm Payrolls", "Date": "2025-07-04T12:30:00", "Importance": 3});
        let event = normalize_event(&raw).unwrap();
        assert_eq!(event, MacroEvent::new("Non Farm Payrolls", "2025-07-04", 3));
    }

    #[test]
    fn test_normalize_finnhub_record() {
        let raw = json!({"event": "CPI YoY", "time": "2025-07-15 12:30:00", "impact": "high"});
        let event = normalize_event(&raw).unwrap();
        assert_eq!(event.date, "2025-07-15");
        assert_eq!(event.importance, 3);
    }

    #[test]
    fn test_short_date_kept_as_is() {
        let raw = json!({"event": "Odd", "date": "soon"});
        assert_eq!(normalize_event(&raw).unwrap().date, "soon");
    }

    #[test]
    fn test_record_without_name_dropped() {
        assert!(normalize_event(&json!({"date": "2025-07-04"})).is_none());
    }

    #[tokio::test]
    async fn test_no_keys_means_no_events() {
        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = CalendarClient::new(http, None, None);
        assert_eq!(client.high_impact_events().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_finnhub_used_when_tradingeconomics_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/te"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fh"))
            .and(query_param("token", "fh-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "economicCalendar": [
                    {"event": "FOMC", "time": "2025-07-30 18:00:00", "impact": "high"},
                    {"event": "Housing Starts", "time": "2025-07-17 12:30:00", "impact": "low"}
                ]
            })))
            .mount(&server)
            .await;

        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = CalendarClient::new(http, Some("te-key".into()), Some("fh-key".into()))
            .with_urls(&format!("{}/te", server.uri()), &format!("{}/fh", server.uri()));

        let events = client.high_impact_events().await.unwrap().unwrap();
        assert_eq!(events, vec![MacroEvent::new("FOMC", "2025-07-30", 3)]);
    }

    #[tokio::test]
    async fn test_tradingeconomics_capped_at_five() {
        let server = MockServer::start().await;
        let items: Vec<_> = (0..8)
            .map(|i| json!({"Event": format!("E{i}"), "Date": "2025-07-04T00:00:00", "Importance": 3}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/te"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(items)))
            .mount(&server)
            .await;

        let http = RetryingClient::new(RetryPolicy::immediate(1)).unwrap();
        let client = CalendarClient::new(http, Some("k".into()), None)
            .with_urls(&format!("{}/te", server.uri()), &format!("{}/fh", server.uri()));

        assert_eq!(client.high_impact_events().await.unwrap().unwrap().len(), MAX_EVENTS);
    }
}
